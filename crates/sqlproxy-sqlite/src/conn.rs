use crate::stmt::{self, SqliteStmt};
use rusqlite::Connection;
use sqlproxy::driver::{
    Conn, ConnBeginTx, ConnPrepareContext, Context, ExecResult, ExecerContext, IsolationLevel,
    NamedValue, QueryerContext, Rows, Stmt, Tx, TxOptions, Validator,
};
use sqlproxy::{DriverError, DriverResult, Sentinel};
use std::sync::{Arc, Mutex, MutexGuard};

/// A connection shared by the statements and transactions it created.
#[derive(Clone)]
pub(crate) struct Handle(Arc<Mutex<Connection>>);

impl Handle {
    pub(crate) fn lock(&self) -> DriverResult<MutexGuard<'_, Connection>> {
        // A panic while holding the lock leaves the connection in an unknown state.
        self.0.lock().map_err(|_| Sentinel::BadConn.into())
    }
}

/// An open SQLite connection.
pub struct SqliteConn {
    handle: Handle,
    closed: bool,
}

impl SqliteConn {
    pub(crate) fn new(conn: Connection) -> Self {
        Self {
            handle: Handle(Arc::new(Mutex::new(conn))),
            closed: false,
        }
    }

    fn ensure_open(&self) -> DriverResult<()> {
        if self.closed {
            return Err(Sentinel::BadConn.into());
        }
        Ok(())
    }

    fn prepare_stmt(&self, query: &str) -> DriverResult<Box<dyn Stmt>> {
        self.ensure_open()?;
        // Compile once up front so syntax errors surface at prepare time.
        let num_input = {
            let conn = self.handle.lock()?;
            let stmt = conn.prepare_cached(query).map_err(DriverError::driver)?;
            stmt.parameter_count()
        };
        Ok(Box::new(SqliteStmt::new(
            self.handle.clone(),
            query,
            num_input,
        )))
    }
}

impl Conn for SqliteConn {
    fn prepare(&mut self, query: &str) -> DriverResult<Box<dyn Stmt>> {
        self.prepare_stmt(query)
    }

    fn close(&mut self) -> DriverResult<()> {
        self.closed = true;
        Ok(())
    }

    fn begin(&mut self) -> DriverResult<Box<dyn Tx>> {
        self.begin_tx(&Context::background(), TxOptions::default())
    }

    fn as_prepare_context(&mut self) -> Option<&mut dyn ConnPrepareContext> {
        Some(self)
    }

    fn as_begin_tx(&mut self) -> Option<&mut dyn ConnBeginTx> {
        Some(self)
    }

    fn as_execer_context(&mut self) -> Option<&mut dyn ExecerContext> {
        Some(self)
    }

    fn as_queryer_context(&mut self) -> Option<&mut dyn QueryerContext> {
        Some(self)
    }

    fn as_validator(&self) -> Option<&dyn Validator> {
        Some(self)
    }
}

impl ConnPrepareContext for SqliteConn {
    fn prepare_context(&mut self, ctx: &Context, query: &str) -> DriverResult<Box<dyn Stmt>> {
        ctx.err()?;
        self.prepare_stmt(query)
    }
}

impl ConnBeginTx for SqliteConn {
    fn begin_tx(&mut self, ctx: &Context, opts: TxOptions) -> DriverResult<Box<dyn Tx>> {
        ctx.err()?;
        self.ensure_open()?;
        if opts.read_only {
            return Err(DriverError::other(
                "sqlite: read-only transactions are not supported",
            ));
        }
        // SQLite transactions are always serializable.
        if !matches!(
            opts.isolation,
            IsolationLevel::Default | IsolationLevel::Serializable
        ) {
            return Err(DriverError::other(format!(
                "sqlite: unsupported isolation level {:?}",
                opts.isolation
            )));
        }

        self.handle
            .lock()?
            .execute_batch("BEGIN")
            .map_err(DriverError::driver)?;
        tracing::trace!(target: "sqlproxy_sqlite", "transaction started");
        Ok(Box::new(SqliteTx {
            handle: self.handle.clone(),
        }))
    }
}

impl ExecerContext for SqliteConn {
    fn exec_context(
        &mut self,
        ctx: &Context,
        query: &str,
        args: Vec<NamedValue>,
    ) -> DriverResult<Box<dyn ExecResult>> {
        ctx.err()?;
        self.ensure_open()?;
        Ok(Box::new(stmt::exec(&self.handle, query, &args)?))
    }
}

impl QueryerContext for SqliteConn {
    fn query_context(
        &mut self,
        ctx: &Context,
        query: &str,
        args: Vec<NamedValue>,
    ) -> DriverResult<Box<dyn Rows>> {
        ctx.err()?;
        self.ensure_open()?;
        Ok(Box::new(stmt::query(&self.handle, query, &args)?))
    }
}

impl Validator for SqliteConn {
    fn is_valid(&self) -> bool {
        !self.closed
    }
}

/// An open transaction; commit and rollback run on the owning connection.
pub struct SqliteTx {
    handle: Handle,
}

impl SqliteTx {
    fn finish(&self, sql: &str) -> DriverResult<()> {
        self.handle
            .lock()?
            .execute_batch(sql)
            .map_err(DriverError::driver)
    }
}

impl Tx for SqliteTx {
    fn commit(self: Box<Self>) -> DriverResult<()> {
        self.finish("COMMIT")
    }

    fn rollback(self: Box<Self>) -> DriverResult<()> {
        self.finish("ROLLBACK")
    }
}
