//! # sqlproxy-sqlite
//!
//! An SQLite driver for the `sqlproxy` driver contract, backed by `rusqlite`.
//!
//! The driver implements the context-aware capabilities (prepare, begin,
//! exec, query) and leaves the plain direct `Execer`/`Queryer` paths out, so
//! a front-end falls back to prepared statements for those.
//!
//! ```ignore
//! use sqlproxy::{Hooks, ProxyDriver};
//! use sqlproxy::driver::{Context, DriverContext};
//! use sqlproxy_sqlite::SqliteDriver;
//!
//! let driver = ProxyDriver::with_hooks(SqliteDriver::new(), Hooks::with_stacktrace());
//! let connector = driver.open_connector(":memory:")?;
//! let mut conn = connector.connect(&Context::background())?;
//! ```

mod conn;
mod params;
mod stmt;

pub use conn::{SqliteConn, SqliteTx};
pub use stmt::{SqliteResult, SqliteRows, SqliteStmt};

use sqlproxy::driver::{Conn, Connector, Context, Driver, DriverContext};
use sqlproxy::{DriverError, DriverResult};
use std::sync::Arc;

/// The SQLite driver. Connection names are database paths; `:memory:`
/// opens a private in-memory database.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteDriver;

impl SqliteDriver {
    pub fn new() -> Self {
        Self
    }
}

fn open(name: &str) -> DriverResult<SqliteConn> {
    tracing::debug!(target: "sqlproxy_sqlite", path = name, "opening sqlite database");
    let conn = rusqlite::Connection::open(name).map_err(DriverError::driver)?;
    Ok(SqliteConn::new(conn))
}

impl Driver for SqliteDriver {
    fn open(&self, name: &str) -> DriverResult<Box<dyn Conn>> {
        Ok(Box::new(open(name)?))
    }

    fn as_driver_context(&self) -> Option<&dyn DriverContext> {
        Some(self)
    }
}

impl DriverContext for SqliteDriver {
    fn open_connector(&self, name: &str) -> DriverResult<Box<dyn Connector>> {
        if name.is_empty() {
            return Err(DriverError::other("sqlite: empty database path"));
        }
        Ok(Box::new(SqliteConnector {
            path: name.to_string(),
        }))
    }
}

/// Opens connections to one database path.
#[derive(Debug, Clone)]
pub struct SqliteConnector {
    path: String,
}

impl Connector for SqliteConnector {
    fn connect(&self, ctx: &Context) -> DriverResult<Box<dyn Conn>> {
        ctx.err()?;
        Ok(Box::new(open(&self.path)?))
    }

    fn driver(&self) -> Arc<dyn Driver> {
        Arc::new(SqliteDriver)
    }
}
