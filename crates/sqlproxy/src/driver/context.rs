use crate::error::{DriverError, DriverResult};
use tokio_util::sync::CancellationToken;

/// Carries the cancellation token of a context-aware call.
///
/// The proxy never cancels on its own; it forwards the context unchanged and
/// leaves it to the driver to observe the token.
#[derive(Debug, Clone, Default)]
pub struct Context {
    token: CancellationToken,
}

impl Context {
    /// A context that is never cancelled unless its token is triggered.
    pub fn background() -> Self {
        Self::default()
    }

    /// A context observing `token`.
    pub fn with_cancel(token: CancellationToken) -> Self {
        Self { token }
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// `Err(DriverError::Canceled)` once the token has been triggered.
    pub fn err(&self) -> DriverResult<()> {
        if self.is_cancelled() {
            Err(DriverError::Canceled)
        } else {
            Ok(())
        }
    }
}
