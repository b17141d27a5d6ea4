//! # sqlproxy
//!
//! A transparent interception layer for database drivers.
//!
//! [`ProxyDriver`] wraps any [`Driver`](driver::Driver) and hands out proxies
//! for every object derived from it: connectors, connections, statements,
//! transactions, results, rows and value converters. Each proxy forwards to
//! the wrapped object and consults a [`Hooks`] bundle at the boundary.
//!
//! ## Features
//!
//! - **Transparent**: with no hooks installed every call, result and error passes through unchanged
//! - **Rewriting hooks**: inspect, rewrite or reject query text and arguments before they reach the driver
//! - **Error hook**: observe, replace or suppress every error; driver control signals are never touched
//! - **Transaction-aware events**: each hook learns which object and method it intercepts, and whether the connection is inside a transaction
//! - **Stack-enriched errors**: [`Hooks::with_stacktrace`] attaches the caller's call context to errors
//!
//! ## Example
//!
//! ```ignore
//! use sqlproxy::{Hooks, ProxyDriver};
//! use sqlproxy::driver::{Context, DriverContext};
//!
//! let hooks = Hooks::new()
//!     .before_query_context(|event, query, args| {
//!         println!("[{event}]: {query} {args:?}");
//!         Ok((String::new(), None))
//!     })
//!     .on_error(|event, err| {
//!         eprintln!("{event}: {err}");
//!         Some(err)
//!     });
//!
//! let driver = ProxyDriver::with_hooks(inner, hooks);
//! let connector = driver.open_connector("app.db")?;
//! let mut conn = connector.connect(&Context::background())?;
//! ```

pub mod driver;
pub mod error;
pub mod event;
pub mod hooks;
pub mod proxy;
pub mod stack;

pub use error::{DriverError, DriverResult, Sentinel};
pub use event::{Entity, Event, Method};
#[cfg(feature = "tracing-hooks")]
pub use hooks::TracingHooks;
pub use hooks::Hooks;
pub use proxy::{
    ConnectorShim, ProxyConn, ProxyConnector, ProxyDriver, ProxyResult, ProxyRows, ProxyStmt,
    ProxyTx, ProxyValueConverter, wrap_connector,
};
pub use stack::{Enricher, WithStack, add_stacktrace};
