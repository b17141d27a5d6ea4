use crate::conn::Handle;
use crate::params::{bind, from_sqlite, positional};
use sqlproxy::driver::{
    Context, ExecResult, NamedValue, Rows, Stmt, StmtExecContext, StmtQueryContext, Value,
};
use sqlproxy::{DriverError, DriverResult, Sentinel};
use std::collections::VecDeque;

/// Run `sql` to completion, discarding any rows it produces.
pub(crate) fn exec(handle: &Handle, sql: &str, args: &[NamedValue]) -> DriverResult<SqliteResult> {
    let conn = handle.lock()?;
    let mut stmt = conn.prepare_cached(sql).map_err(DriverError::driver)?;
    bind(&mut stmt, args)?;
    let mut rows = stmt.raw_query();
    while rows.next().map_err(DriverError::driver)?.is_some() {}
    drop(rows);

    Ok(SqliteResult {
        last_insert_id: conn.last_insert_rowid(),
        rows_affected: i64::try_from(conn.changes()).unwrap_or(i64::MAX),
    })
}

/// Run `sql` and buffer every row it produces.
pub(crate) fn query(handle: &Handle, sql: &str, args: &[NamedValue]) -> DriverResult<SqliteRows> {
    let conn = handle.lock()?;
    let mut stmt = conn.prepare_cached(sql).map_err(DriverError::driver)?;
    bind(&mut stmt, args)?;
    let columns: Vec<String> = stmt
        .column_names()
        .into_iter()
        .map(String::from)
        .collect();

    let mut buffered = VecDeque::new();
    let mut rows = stmt.raw_query();
    while let Some(row) = rows.next().map_err(DriverError::driver)? {
        let mut values = Vec::with_capacity(columns.len());
        for index in 0..columns.len() {
            values.push(from_sqlite(row.get_ref(index).map_err(DriverError::driver)?));
        }
        buffered.push_back(values);
    }
    tracing::trace!(target: "sqlproxy_sqlite", rows = buffered.len(), "query buffered");

    Ok(SqliteRows {
        columns,
        rows: buffered,
    })
}

/// A prepared statement.
///
/// Holds the SQL text and re-binds it from the connection's statement cache
/// on every execution.
pub struct SqliteStmt {
    handle: Handle,
    sql: String,
    num_input: usize,
    closed: bool,
}

impl SqliteStmt {
    pub(crate) fn new(handle: Handle, sql: &str, num_input: usize) -> Self {
        Self {
            handle,
            sql: sql.to_string(),
            num_input,
            closed: false,
        }
    }

    fn ensure_open(&self) -> DriverResult<()> {
        if self.closed {
            return Err(DriverError::other("sql: statement is closed"));
        }
        Ok(())
    }
}

impl Stmt for SqliteStmt {
    fn close(&mut self) -> DriverResult<()> {
        self.closed = true;
        Ok(())
    }

    fn num_input(&self) -> Option<usize> {
        Some(self.num_input)
    }

    fn exec(&mut self, args: Vec<Value>) -> DriverResult<Box<dyn ExecResult>> {
        self.ensure_open()?;
        Ok(Box::new(exec(&self.handle, &self.sql, &positional(args))?))
    }

    fn query(&mut self, args: Vec<Value>) -> DriverResult<Box<dyn Rows>> {
        self.ensure_open()?;
        Ok(Box::new(query(&self.handle, &self.sql, &positional(args))?))
    }

    fn as_exec_context(&mut self) -> Option<&mut dyn StmtExecContext> {
        Some(self)
    }

    fn as_query_context(&mut self) -> Option<&mut dyn StmtQueryContext> {
        Some(self)
    }
}

impl StmtExecContext for SqliteStmt {
    fn exec_context(
        &mut self,
        ctx: &Context,
        args: Vec<NamedValue>,
    ) -> DriverResult<Box<dyn ExecResult>> {
        ctx.err()?;
        self.ensure_open()?;
        Ok(Box::new(exec(&self.handle, &self.sql, &args)?))
    }
}

impl StmtQueryContext for SqliteStmt {
    fn query_context(
        &mut self,
        ctx: &Context,
        args: Vec<NamedValue>,
    ) -> DriverResult<Box<dyn Rows>> {
        ctx.err()?;
        self.ensure_open()?;
        Ok(Box::new(query(&self.handle, &self.sql, &args)?))
    }
}

/// The outcome of an exec call, captured right after the statement ran.
#[derive(Debug, Clone, Copy)]
pub struct SqliteResult {
    last_insert_id: i64,
    rows_affected: i64,
}

impl ExecResult for SqliteResult {
    fn last_insert_id(&self) -> DriverResult<i64> {
        Ok(self.last_insert_id)
    }

    fn rows_affected(&self) -> DriverResult<i64> {
        Ok(self.rows_affected)
    }
}

/// Rows buffered at query time.
#[derive(Debug)]
pub struct SqliteRows {
    columns: Vec<String>,
    rows: VecDeque<Vec<Value>>,
}

impl Rows for SqliteRows {
    fn columns(&self) -> Vec<String> {
        self.columns.clone()
    }

    fn close(&mut self) -> DriverResult<()> {
        self.rows.clear();
        Ok(())
    }

    fn next(&mut self, dest: &mut [Value]) -> DriverResult<()> {
        let Some(row) = self.rows.pop_front() else {
            return Err(Sentinel::EndOfStream.into());
        };
        for (slot, value) in dest.iter_mut().zip(row) {
            *slot = value;
        }
        Ok(())
    }
}
