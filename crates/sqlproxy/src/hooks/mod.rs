//! Hooks invoked at the proxy's interception points.
//!
//! Every slot is optional; an unset slot is an identity passthrough.
//!
//! # Example
//!
//! ```rust,ignore
//! use sqlproxy::{DriverError, Hooks, ProxyDriver};
//!
//! let hooks = Hooks::new()
//!     .before_query_context(|event, query, args| {
//!         println!("[{event}]: {query} {args:?}");
//!         // an empty query and `None` args leave the call unchanged
//!         Ok((String::new(), None))
//!     })
//!     .before_prepare(|_, query| {
//!         if query.contains("DROP") {
//!             return Err(DriverError::rejected("DROP not allowed"));
//!         }
//!         Ok(format!("/* app */ {query}"))
//!     })
//!     .on_error(|event, err| {
//!         eprintln!("{event} failed: {err}");
//!         Some(err)
//!     });
//!
//! let driver = ProxyDriver::with_hooks(inner_driver, hooks);
//! ```

#[cfg(feature = "tracing-hooks")]
mod tracing_hooks;


#[cfg(feature = "tracing-hooks")]
pub use tracing_hooks::TracingHooks;

use crate::driver::{NamedValue, Value};
use crate::error::{DriverError, DriverResult};
use crate::event::Event;
use crate::stack::Enricher;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

/// Replaces an error, or returns `None` to suppress it.
pub type ErrorHook = Arc<dyn Fn(&Event, DriverError) -> Option<DriverError> + Send + Sync>;

/// Rewrites query text before preparation; an empty string keeps the original.
pub type BeforePrepareHook = Arc<dyn Fn(&Event, &str) -> DriverResult<String> + Send + Sync>;

/// Rewrites the arguments of a prepared exec/query; `None` keeps the original.
pub type BeforePreparedQueryHook =
    Arc<dyn Fn(&Event, &[Value]) -> DriverResult<Option<Vec<Value>>> + Send + Sync>;

/// Same as [`BeforePreparedQueryHook`] for context-aware calls.
pub type BeforePreparedQueryContextHook =
    Arc<dyn Fn(&Event, &[NamedValue]) -> DriverResult<Option<Vec<NamedValue>>> + Send + Sync>;

/// Rewrites a direct exec/query. An empty query or `None` args keep the original.
pub type BeforeQueryHook =
    Arc<dyn Fn(&Event, &str, &[Value]) -> DriverResult<(String, Option<Vec<Value>>)> + Send + Sync>;

/// Same as [`BeforeQueryHook`] for context-aware calls.
pub type BeforeQueryContextHook = Arc<
    dyn Fn(&Event, &str, &[NamedValue]) -> DriverResult<(String, Option<Vec<NamedValue>>)>
        + Send
        + Sync,
>;

/// A collection of hooks intercepting the proxied driver's operations.
///
/// A before-hook that returns an error aborts the operation; that error is
/// passed through the error hook before it reaches the caller. Driver
/// control signals ([`Sentinel`](crate::Sentinel)) never reach the error hook.
#[derive(Clone, Default)]
pub struct Hooks {
    error: Option<ErrorHook>,
    before_prepare: Option<BeforePrepareHook>,
    before_prepared_query: Option<BeforePreparedQueryHook>,
    before_prepared_query_context: Option<BeforePreparedQueryContextHook>,
    before_query: Option<BeforeQueryHook>,
    before_query_context: Option<BeforeQueryContextHook>,
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks")
            .field("error", &self.error.is_some())
            .field("before_prepare", &self.before_prepare.is_some())
            .field("before_prepared_query", &self.before_prepared_query.is_some())
            .field(
                "before_prepared_query_context",
                &self.before_prepared_query_context.is_some(),
            )
            .field("before_query", &self.before_query.is_some())
            .field("before_query_context", &self.before_query_context.is_some())
            .finish()
    }
}

impl Hooks {
    /// Create an empty hook set; the proxy is fully transparent with it.
    pub fn new() -> Self {
        Self::default()
    }

    /// Hooks that only pass errors through `handler`.
    pub fn with_error_handler<F>(handler: F) -> Self
    where
        F: Fn(DriverError) -> DriverError + Send + Sync + 'static,
    {
        Self::new().on_error(move |_, err| Some(handler(err)))
    }

    /// Hooks that attach the caller's call context to every error.
    pub fn with_stacktrace() -> Self {
        Enricher::new().into_hooks()
    }

    /// Called for every error before it is returned to the caller.
    pub fn on_error<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Event, DriverError) -> Option<DriverError> + Send + Sync + 'static,
    {
        self.error = Some(Arc::new(hook));
        self
    }

    /// Called before a query is prepared.
    pub fn before_prepare<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Event, &str) -> DriverResult<String> + Send + Sync + 'static,
    {
        self.before_prepare = Some(Arc::new(hook));
        self
    }

    /// Called before a prepared statement is executed or queried without a context.
    pub fn before_prepared_query<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Event, &[Value]) -> DriverResult<Option<Vec<Value>>> + Send + Sync + 'static,
    {
        self.before_prepared_query = Some(Arc::new(hook));
        self
    }

    /// Called before a prepared statement is executed or queried with a context.
    pub fn before_prepared_query_context<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Event, &[NamedValue]) -> DriverResult<Option<Vec<NamedValue>>>
            + Send
            + Sync
            + 'static,
    {
        self.before_prepared_query_context = Some(Arc::new(hook));
        self
    }

    /// Called before a direct (non-prepared) exec or query without a context.
    pub fn before_query<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Event, &str, &[Value]) -> DriverResult<(String, Option<Vec<Value>>)>
            + Send
            + Sync
            + 'static,
    {
        self.before_query = Some(Arc::new(hook));
        self
    }

    /// Called before a direct (non-prepared) exec or query with a context.
    pub fn before_query_context<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Event, &str, &[NamedValue]) -> DriverResult<(String, Option<Vec<NamedValue>>)>
            + Send
            + Sync
            + 'static,
    {
        self.before_query_context = Some(Arc::new(hook));
        self
    }

    /// True if no slot is set.
    pub fn is_empty(&self) -> bool {
        self.error.is_none()
            && self.before_prepare.is_none()
            && self.before_prepared_query.is_none()
            && self.before_prepared_query_context.is_none()
            && self.before_query.is_none()
            && self.before_query_context.is_none()
    }

    /// Pass `err` through the error hook.
    ///
    /// Returns `None` when the hook suppressed the error.
    pub(crate) fn route_error(&self, event: &Event, err: DriverError) -> Option<DriverError> {
        let Some(hook) = &self.error else {
            return Some(err);
        };
        // Control signals belong to the front-end.
        if err.is_sentinel() {
            return Some(err);
        }
        tracing::debug!(
            target: "sqlproxy",
            entity = %event.entity,
            method = %event.method,
            in_transaction = event.in_transaction,
            error = %err,
            "routing error through hook"
        );
        hook(event, err)
    }

    /// Route the outcome of a call; a suppressed error yields `suppressed()`.
    pub(crate) fn settle<T>(
        &self,
        event: &Event,
        result: DriverResult<T>,
        suppressed: impl FnOnce() -> T,
    ) -> DriverResult<T> {
        match result {
            Ok(value) => Ok(value),
            Err(err) => match self.route_error(event, err) {
                Some(err) => Err(err),
                None => Ok(suppressed()),
            },
        }
    }

    /// Route the failure of a call that produces an object.
    ///
    /// There is nothing to hand back when such a failure is suppressed, so
    /// suppression surfaces as [`DriverError::Suppressed`].
    pub(crate) fn fail(&self, event: &Event, err: DriverError) -> DriverError {
        self.route_error(event, err)
            .unwrap_or(DriverError::Suppressed {
                entity: event.entity,
                method: event.method,
            })
    }

    pub(crate) fn apply_before_prepare<'q>(
        &self,
        event: &Event,
        query: &'q str,
    ) -> DriverResult<Cow<'q, str>> {
        let Some(hook) = &self.before_prepare else {
            return Ok(Cow::Borrowed(query));
        };
        let rewritten = hook(event, query)?;
        Ok(keep_if_empty(query, rewritten))
    }

    pub(crate) fn apply_before_prepared_query(
        &self,
        event: &Event,
        args: Vec<Value>,
    ) -> DriverResult<Vec<Value>> {
        let Some(hook) = &self.before_prepared_query else {
            return Ok(args);
        };
        Ok(hook(event, &args)?.unwrap_or(args))
    }

    pub(crate) fn apply_before_prepared_query_context(
        &self,
        event: &Event,
        args: Vec<NamedValue>,
    ) -> DriverResult<Vec<NamedValue>> {
        let Some(hook) = &self.before_prepared_query_context else {
            return Ok(args);
        };
        Ok(hook(event, &args)?.unwrap_or(args))
    }

    pub(crate) fn apply_before_query<'q>(
        &self,
        event: &Event,
        query: &'q str,
        args: Vec<Value>,
    ) -> DriverResult<(Cow<'q, str>, Vec<Value>)> {
        let Some(hook) = &self.before_query else {
            return Ok((Cow::Borrowed(query), args));
        };
        let (rewritten, new_args) = hook(event, query, &args)?;
        Ok((keep_if_empty(query, rewritten), new_args.unwrap_or(args)))
    }

    pub(crate) fn apply_before_query_context<'q>(
        &self,
        event: &Event,
        query: &'q str,
        args: Vec<NamedValue>,
    ) -> DriverResult<(Cow<'q, str>, Vec<NamedValue>)> {
        let Some(hook) = &self.before_query_context else {
            return Ok((Cow::Borrowed(query), args));
        };
        let (rewritten, new_args) = hook(event, query, &args)?;
        Ok((keep_if_empty(query, rewritten), new_args.unwrap_or(args)))
    }
}

fn keep_if_empty(original: &str, rewritten: String) -> Cow<'_, str> {
    if rewritten.is_empty() {
        Cow::Borrowed(original)
    } else {
        Cow::Owned(rewritten)
    }
}
