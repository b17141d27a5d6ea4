//! A scripted in-memory driver for integration tests.
//!
//! Every delegate call is recorded as `"<object>.<method>"` plus a detail
//! string, and any operation can be scripted to fail.

#![allow(dead_code)]

use sqlproxy::driver::{
    ColumnConverter, Conn, ConnBeginTx, ConnPrepareContext, Connector, Context,
    DefaultParameterConverter, Driver, DriverContext, ExecResult, Execer, ExecerContext,
    NamedValue, NamedValueChecker, Queryer, QueryerContext, Rows, RowsColumnTypeDatabaseTypeName,
    RowsColumnTypeLength, RowsColumnTypeNullable, RowsColumnTypePrecisionScale,
    RowsColumnTypeScanType, RowsNextResultSet, ScanType, SessionResetter, Stmt, StmtExecContext,
    StmtQueryContext, Tx, TxOptions, Validator, Value, ValueConverter,
};
use sqlproxy::{DriverError, DriverResult, Event, Hooks, ProxyConn, ProxyDriver, Sentinel};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Optional capabilities the scripted objects advertise.
#[derive(Debug, Clone, Copy)]
pub struct Caps {
    pub driver_context: bool,
    pub prepare_context: bool,
    pub begin_tx: bool,
    pub named_value_checker: bool,
    pub execer: bool,
    pub execer_context: bool,
    pub queryer: bool,
    pub queryer_context: bool,
    pub session_resetter: bool,
    pub validator: bool,
    pub stmt_exec_context: bool,
    pub stmt_query_context: bool,
    pub stmt_named_value_checker: bool,
    pub column_converter: bool,
    pub next_result_set: bool,
    pub column_types: bool,
}

impl Caps {
    pub fn all() -> Self {
        Self {
            driver_context: true,
            prepare_context: true,
            begin_tx: true,
            named_value_checker: true,
            execer: true,
            execer_context: true,
            queryer: true,
            queryer_context: true,
            session_resetter: true,
            validator: true,
            stmt_exec_context: true,
            stmt_query_context: true,
            stmt_named_value_checker: true,
            column_converter: true,
            next_result_set: true,
            column_types: true,
        }
    }

    /// Only the required methods.
    pub fn none() -> Self {
        Self {
            driver_context: false,
            prepare_context: false,
            begin_tx: false,
            named_value_checker: false,
            execer: false,
            execer_context: false,
            queryer: false,
            queryer_context: false,
            session_resetter: false,
            validator: false,
            stmt_exec_context: false,
            stmt_query_context: false,
            stmt_named_value_checker: false,
            column_converter: false,
            next_result_set: false,
            column_types: false,
        }
    }
}

#[derive(Debug, Clone)]
enum Failure {
    Message(String),
    Sentinel(Sentinel),
}

/// Shared script and call log.
pub struct Script {
    pub caps: Caps,
    calls: Mutex<Vec<(String, String)>>,
    failures: Mutex<HashMap<String, Failure>>,
    valid: bool,
}

impl Script {
    pub fn new(caps: Caps) -> Arc<Self> {
        Arc::new(Self {
            caps,
            calls: Mutex::new(Vec::new()),
            failures: Mutex::new(HashMap::new()),
            valid: true,
        })
    }

    pub fn invalid(caps: Caps) -> Arc<Self> {
        Arc::new(Self {
            caps,
            calls: Mutex::new(Vec::new()),
            failures: Mutex::new(HashMap::new()),
            valid: false,
        })
    }

    /// Make every later call to `op` fail with `message`.
    pub fn fail(&self, op: &str, message: &str) {
        self.failures
            .lock()
            .unwrap()
            .insert(op.to_string(), Failure::Message(message.to_string()));
    }

    /// Make every later call to `op` fail with a control signal.
    pub fn fail_with(&self, op: &str, sentinel: Sentinel) {
        self.failures
            .lock()
            .unwrap()
            .insert(op.to_string(), Failure::Sentinel(sentinel));
    }

    pub fn clear_failures(&self) {
        self.failures.lock().unwrap().clear();
    }

    /// Recorded operation names, in order.
    pub fn ops(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(op, _)| op.clone())
            .collect()
    }

    /// Detail recorded for the last call to `op`.
    pub fn last_detail(&self, op: &str) -> Option<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(recorded, _)| recorded == op)
            .map(|(_, detail)| detail.clone())
    }

    pub fn count(&self, op: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(recorded, _)| recorded == op)
            .count()
    }

    pub fn reset_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    fn call(&self, op: &str, detail: impl Into<String>) -> DriverResult<()> {
        self.calls
            .lock()
            .unwrap()
            .push((op.to_string(), detail.into()));
        match self.failures.lock().unwrap().get(op) {
            Some(Failure::Message(message)) => Err(DriverError::other(message.clone())),
            Some(Failure::Sentinel(sentinel)) => Err((*sentinel).into()),
            None => Ok(()),
        }
    }
}

/// Open a proxied connection over a fresh mock driver.
pub fn open(script: &Arc<Script>, hooks: Hooks) -> ProxyConn {
    ProxyDriver::with_hooks(MockDriver::new(script), hooks)
        .open_conn("mock")
        .unwrap()
}

/// The error of a call whose success value has no `Debug` impl.
pub fn expect_err<T>(result: DriverResult<T>) -> DriverError {
    match result {
        Ok(_) => panic!("expected the call to fail"),
        Err(err) => err,
    }
}

/// Collects the events hooks were called with.
#[derive(Clone, Default)]
pub struct EventLog(Arc<Mutex<Vec<Event>>>);

impl EventLog {
    pub fn push(&self, event: &Event) {
        self.0.lock().unwrap().push(*event);
    }

    pub fn events(&self) -> Vec<Event> {
        self.0.lock().unwrap().clone()
    }

    /// Events formatted as `entity.method`.
    pub fn names(&self) -> Vec<String> {
        self.events().iter().map(ToString::to_string).collect()
    }

    pub fn last(&self) -> Option<Event> {
        self.0.lock().unwrap().last().copied()
    }
}

fn format_values(args: &[Value]) -> String {
    let parts: Vec<String> = args.iter().map(ToString::to_string).collect();
    format!("[{}]", parts.join(", "))
}

fn format_named(args: &[NamedValue]) -> String {
    let parts: Vec<String> = args.iter().map(ToString::to_string).collect();
    format!("[{}]", parts.join(", "))
}

pub struct MockDriver {
    pub script: Arc<Script>,
}

impl MockDriver {
    pub fn new(script: &Arc<Script>) -> Self {
        Self {
            script: script.clone(),
        }
    }
}

impl Driver for MockDriver {
    fn open(&self, name: &str) -> DriverResult<Box<dyn Conn>> {
        self.script.call("driver.open", name)?;
        Ok(Box::new(MockConn::new(&self.script)))
    }

    fn as_driver_context(&self) -> Option<&dyn DriverContext> {
        if self.script.caps.driver_context {
            Some(self)
        } else {
            None
        }
    }
}

impl DriverContext for MockDriver {
    fn open_connector(&self, name: &str) -> DriverResult<Box<dyn Connector>> {
        self.script.call("driver.open_connector", name)?;
        Ok(Box::new(MockConnector {
            script: self.script.clone(),
        }))
    }
}

pub struct MockConnector {
    pub script: Arc<Script>,
}

impl Connector for MockConnector {
    fn connect(&self, _ctx: &Context) -> DriverResult<Box<dyn Conn>> {
        self.script.call("connector.connect", "")?;
        Ok(Box::new(MockConn::new(&self.script)))
    }

    fn driver(&self) -> Arc<dyn Driver> {
        Arc::new(MockDriver::new(&self.script))
    }
}

pub struct MockConn {
    script: Arc<Script>,
}

impl MockConn {
    pub fn new(script: &Arc<Script>) -> Self {
        Self {
            script: script.clone(),
        }
    }

    fn stmt(&self, query: &str) -> Box<dyn Stmt> {
        Box::new(MockStmt {
            script: self.script.clone(),
            num_input: query.matches('?').count(),
        })
    }
}

impl Conn for MockConn {
    fn prepare(&mut self, query: &str) -> DriverResult<Box<dyn Stmt>> {
        self.script.call("conn.prepare", query)?;
        Ok(self.stmt(query))
    }

    fn close(&mut self) -> DriverResult<()> {
        self.script.call("conn.close", "")
    }

    fn begin(&mut self) -> DriverResult<Box<dyn Tx>> {
        self.script.call("conn.begin", "")?;
        Ok(Box::new(MockTx {
            script: self.script.clone(),
        }))
    }

    fn as_prepare_context(&mut self) -> Option<&mut dyn ConnPrepareContext> {
        if self.script.caps.prepare_context {
            Some(self)
        } else {
            None
        }
    }

    fn as_begin_tx(&mut self) -> Option<&mut dyn ConnBeginTx> {
        if self.script.caps.begin_tx {
            Some(self)
        } else {
            None
        }
    }

    fn as_named_value_checker(&mut self) -> Option<&mut dyn NamedValueChecker> {
        if self.script.caps.named_value_checker {
            Some(self)
        } else {
            None
        }
    }

    fn as_execer(&mut self) -> Option<&mut dyn Execer> {
        if self.script.caps.execer {
            Some(self)
        } else {
            None
        }
    }

    fn as_execer_context(&mut self) -> Option<&mut dyn ExecerContext> {
        if self.script.caps.execer_context {
            Some(self)
        } else {
            None
        }
    }

    fn as_queryer(&mut self) -> Option<&mut dyn Queryer> {
        if self.script.caps.queryer {
            Some(self)
        } else {
            None
        }
    }

    fn as_queryer_context(&mut self) -> Option<&mut dyn QueryerContext> {
        if self.script.caps.queryer_context {
            Some(self)
        } else {
            None
        }
    }

    fn as_session_resetter(&mut self) -> Option<&mut dyn SessionResetter> {
        if self.script.caps.session_resetter {
            Some(self)
        } else {
            None
        }
    }

    fn as_validator(&self) -> Option<&dyn Validator> {
        if self.script.caps.validator {
            Some(self)
        } else {
            None
        }
    }
}

impl ConnPrepareContext for MockConn {
    fn prepare_context(&mut self, _ctx: &Context, query: &str) -> DriverResult<Box<dyn Stmt>> {
        self.script.call("conn.prepare_context", query)?;
        Ok(self.stmt(query))
    }
}

impl ConnBeginTx for MockConn {
    fn begin_tx(&mut self, _ctx: &Context, opts: TxOptions) -> DriverResult<Box<dyn Tx>> {
        self.script.call("conn.begin_tx", format!("{opts:?}"))?;
        Ok(Box::new(MockTx {
            script: self.script.clone(),
        }))
    }
}

impl NamedValueChecker for MockConn {
    fn check_named_value(&mut self, value: &mut NamedValue) -> DriverResult<()> {
        self.script.call("conn.check_named_value", value.to_string())
    }
}

impl Execer for MockConn {
    fn exec(&mut self, query: &str, args: Vec<Value>) -> DriverResult<Box<dyn ExecResult>> {
        self.script
            .call("conn.exec", format!("{query} {}", format_values(&args)))?;
        Ok(Box::new(MockResult {
            script: self.script.clone(),
        }))
    }
}

impl ExecerContext for MockConn {
    fn exec_context(
        &mut self,
        ctx: &Context,
        query: &str,
        args: Vec<NamedValue>,
    ) -> DriverResult<Box<dyn ExecResult>> {
        ctx.err()?;
        self.script
            .call("conn.exec_context", format!("{query} {}", format_named(&args)))?;
        Ok(Box::new(MockResult {
            script: self.script.clone(),
        }))
    }
}

impl Queryer for MockConn {
    fn query(&mut self, query: &str, args: Vec<Value>) -> DriverResult<Box<dyn Rows>> {
        self.script
            .call("conn.query", format!("{query} {}", format_values(&args)))?;
        Ok(Box::new(MockRows::new(&self.script)))
    }
}

impl QueryerContext for MockConn {
    fn query_context(
        &mut self,
        ctx: &Context,
        query: &str,
        args: Vec<NamedValue>,
    ) -> DriverResult<Box<dyn Rows>> {
        ctx.err()?;
        self.script
            .call("conn.query_context", format!("{query} {}", format_named(&args)))?;
        Ok(Box::new(MockRows::new(&self.script)))
    }
}

impl SessionResetter for MockConn {
    fn reset_session(&mut self, _ctx: &Context) -> DriverResult<()> {
        self.script.call("conn.reset_session", "")
    }
}

impl Validator for MockConn {
    fn is_valid(&self) -> bool {
        self.script.valid
    }
}

pub struct MockStmt {
    script: Arc<Script>,
    num_input: usize,
}

impl Stmt for MockStmt {
    fn close(&mut self) -> DriverResult<()> {
        self.script.call("stmt.close", "")
    }

    fn num_input(&self) -> Option<usize> {
        Some(self.num_input)
    }

    fn exec(&mut self, args: Vec<Value>) -> DriverResult<Box<dyn ExecResult>> {
        self.script.call("stmt.exec", format_values(&args))?;
        Ok(Box::new(MockResult {
            script: self.script.clone(),
        }))
    }

    fn query(&mut self, args: Vec<Value>) -> DriverResult<Box<dyn Rows>> {
        self.script.call("stmt.query", format_values(&args))?;
        Ok(Box::new(MockRows::new(&self.script)))
    }

    fn as_exec_context(&mut self) -> Option<&mut dyn StmtExecContext> {
        if self.script.caps.stmt_exec_context {
            Some(self)
        } else {
            None
        }
    }

    fn as_query_context(&mut self) -> Option<&mut dyn StmtQueryContext> {
        if self.script.caps.stmt_query_context {
            Some(self)
        } else {
            None
        }
    }

    fn as_named_value_checker(&mut self) -> Option<&mut dyn NamedValueChecker> {
        if self.script.caps.stmt_named_value_checker {
            Some(self)
        } else {
            None
        }
    }

    fn as_column_converter(&self) -> Option<&dyn ColumnConverter> {
        if self.script.caps.column_converter {
            Some(self)
        } else {
            None
        }
    }
}

impl StmtExecContext for MockStmt {
    fn exec_context(
        &mut self,
        _ctx: &Context,
        args: Vec<NamedValue>,
    ) -> DriverResult<Box<dyn ExecResult>> {
        self.script.call("stmt.exec_context", format_named(&args))?;
        Ok(Box::new(MockResult {
            script: self.script.clone(),
        }))
    }
}

impl StmtQueryContext for MockStmt {
    fn query_context(
        &mut self,
        _ctx: &Context,
        args: Vec<NamedValue>,
    ) -> DriverResult<Box<dyn Rows>> {
        self.script.call("stmt.query_context", format_named(&args))?;
        Ok(Box::new(MockRows::new(&self.script)))
    }
}

impl NamedValueChecker for MockStmt {
    fn check_named_value(&mut self, value: &mut NamedValue) -> DriverResult<()> {
        self.script.call("stmt.check_named_value", value.to_string())
    }
}

impl ColumnConverter for MockStmt {
    fn column_converter(&self, index: usize) -> Box<dyn ValueConverter> {
        Box::new(MockConverter {
            script: self.script.clone(),
            index,
        })
    }
}

pub struct MockConverter {
    script: Arc<Script>,
    index: usize,
}

impl ValueConverter for MockConverter {
    fn convert_value(&self, input: &serde_json::Value) -> DriverResult<Value> {
        self.script
            .call("converter.convert_value", format!("{} {input}", self.index))?;
        DefaultParameterConverter.convert_value(input)
    }
}

pub struct MockTx {
    script: Arc<Script>,
}

impl Tx for MockTx {
    fn commit(self: Box<Self>) -> DriverResult<()> {
        self.script.call("tx.commit", "")
    }

    fn rollback(self: Box<Self>) -> DriverResult<()> {
        self.script.call("tx.rollback", "")
    }
}

pub struct MockResult {
    script: Arc<Script>,
}

impl ExecResult for MockResult {
    fn last_insert_id(&self) -> DriverResult<i64> {
        self.script.call("result.last_insert_id", "")?;
        Ok(7)
    }

    fn rows_affected(&self) -> DriverResult<i64> {
        self.script.call("result.rows_affected", "")?;
        Ok(1)
    }
}

/// Two rows of `(id, name)`, then end of stream.
pub struct MockRows {
    script: Arc<Script>,
    remaining: Vec<(i64, &'static str)>,
}

impl MockRows {
    fn new(script: &Arc<Script>) -> Self {
        Self {
            script: script.clone(),
            remaining: vec![(2, "bob"), (1, "alice")],
        }
    }
}

impl Rows for MockRows {
    fn columns(&self) -> Vec<String> {
        vec!["id".to_string(), "name".to_string()]
    }

    fn close(&mut self) -> DriverResult<()> {
        self.script.call("rows.close", "")
    }

    fn next(&mut self, dest: &mut [Value]) -> DriverResult<()> {
        self.script.call("rows.next", "")?;
        let Some((id, name)) = self.remaining.pop() else {
            return Err(Sentinel::EndOfStream.into());
        };
        dest[0] = Value::Int(id);
        dest[1] = Value::from(name);
        Ok(())
    }

    fn as_next_result_set(&mut self) -> Option<&mut dyn RowsNextResultSet> {
        if self.script.caps.next_result_set {
            Some(self)
        } else {
            None
        }
    }

    fn as_column_type_scan_type(&self) -> Option<&dyn RowsColumnTypeScanType> {
        if self.script.caps.column_types {
            Some(self)
        } else {
            None
        }
    }

    fn as_column_type_database_type_name(&self) -> Option<&dyn RowsColumnTypeDatabaseTypeName> {
        if self.script.caps.column_types {
            Some(self)
        } else {
            None
        }
    }

    fn as_column_type_length(&self) -> Option<&dyn RowsColumnTypeLength> {
        if self.script.caps.column_types {
            Some(self)
        } else {
            None
        }
    }

    fn as_column_type_nullable(&self) -> Option<&dyn RowsColumnTypeNullable> {
        if self.script.caps.column_types {
            Some(self)
        } else {
            None
        }
    }

    fn as_column_type_precision_scale(&self) -> Option<&dyn RowsColumnTypePrecisionScale> {
        if self.script.caps.column_types {
            Some(self)
        } else {
            None
        }
    }
}

impl RowsNextResultSet for MockRows {
    fn has_next_result_set(&mut self) -> bool {
        true
    }

    fn next_result_set(&mut self) -> DriverResult<()> {
        self.script.call("rows.next_result_set", "")
    }
}

impl RowsColumnTypeScanType for MockRows {
    fn column_type_scan_type(&self, index: usize) -> ScanType {
        if index == 0 {
            ScanType::Int
        } else {
            ScanType::Text
        }
    }
}

impl RowsColumnTypeDatabaseTypeName for MockRows {
    fn column_type_database_type_name(&self, index: usize) -> String {
        if index == 0 { "INTEGER" } else { "TEXT" }.to_string()
    }
}

impl RowsColumnTypeLength for MockRows {
    fn column_type_length(&self, index: usize) -> Option<i64> {
        (index == 1).then_some(255)
    }
}

impl RowsColumnTypeNullable for MockRows {
    fn column_type_nullable(&self, index: usize) -> Option<bool> {
        Some(index == 1)
    }
}

impl RowsColumnTypePrecisionScale for MockRows {
    fn column_type_precision_scale(&self, index: usize) -> Option<(i64, i64)> {
        (index == 0).then_some((19, 0))
    }
}
