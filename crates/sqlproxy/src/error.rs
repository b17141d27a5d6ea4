//! Error types for sqlproxy

use crate::event::{Entity, Method};
use crate::stack::WithStack;
use thiserror::Error;

/// Result type alias for driver and proxy operations
pub type DriverResult<T> = Result<T, DriverError>;

/// Control signals defined by the driver contract.
///
/// These are consumed by whatever front-end sits above the driver and are
/// never passed to an error hook, wrapped, or rewritten by the proxy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum Sentinel {
    /// The connection is unusable and should be discarded by the pool.
    #[error("driver: bad connection")]
    BadConn,

    /// The optional fast path is unavailable; the caller falls back to its default.
    #[error("driver: skip fast-path; continue as if unimplemented")]
    Skip,

    /// A named value checker consumed the argument; drop it from the list.
    #[error("driver: remove argument from query")]
    RemoveArgument,

    /// No more rows (or result sets) are available.
    #[error("EOF")]
    EndOfStream,
}

/// Error types for driver operations
#[derive(Debug, Error)]
pub enum DriverError {
    /// Driver control signal
    #[error(transparent)]
    Sentinel(#[from] Sentinel),

    /// The cancellation token of the call was triggered
    #[error("context canceled")]
    Canceled,

    /// Named arguments reached a statement that only accepts positional ones
    #[error("sql: driver does not support the use of Named Parameters")]
    NamedParametersUnsupported,

    /// A before-hook refused to let the operation proceed
    #[error("{0}")]
    Rejected(String),

    /// The error hook suppressed a failure on a call that has nothing to return
    #[error("sqlproxy: error suppressed by hook on {entity}.{method}, but the call has no value to return")]
    Suppressed { entity: Entity, method: Method },

    /// Error carrying a captured call stack
    #[error(transparent)]
    Stack(Box<WithStack>),

    /// Error raised by the underlying engine
    #[error(transparent)]
    Driver(Box<dyn std::error::Error + Send + Sync + 'static>),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl DriverError {
    /// Create a hook rejection error
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected(message.into())
    }

    /// Wrap an engine error
    pub fn driver<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Driver(Box::new(err))
    }

    /// Create an error from a plain message
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }

    /// The control signal carried by this error, if any.
    ///
    /// Stack-enriched errors are never sentinels: the enricher refuses to
    /// wrap them in the first place.
    pub fn sentinel(&self) -> Option<Sentinel> {
        match self {
            Self::Sentinel(s) => Some(*s),
            _ => None,
        }
    }

    /// Check if this is a driver control signal
    pub fn is_sentinel(&self) -> bool {
        self.sentinel().is_some()
    }

    /// Check if this is the skip signal
    pub fn is_skip(&self) -> bool {
        self.sentinel() == Some(Sentinel::Skip)
    }

    /// Check if this is the end-of-stream signal
    pub fn is_end_of_stream(&self) -> bool {
        self.sentinel() == Some(Sentinel::EndOfStream)
    }

    /// Check if this is a hook rejection
    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected(_))
    }

    /// The captured stack, if this error was enriched.
    pub fn stack(&self) -> Option<&WithStack> {
        match self {
            Self::Stack(w) => Some(w),
            _ => None,
        }
    }
}

impl From<WithStack> for DriverError {
    fn from(err: WithStack) -> Self {
        Self::Stack(Box::new(err))
    }
}
