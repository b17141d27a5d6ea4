use super::ConnState;
use super::result::ProxyResult;
use super::rows::ProxyRows;
use super::stmt::ProxyStmt;
use super::tx::ProxyTx;
use crate::driver::{
    Conn, ConnBeginTx, ConnPrepareContext, Context, ExecResult, Execer, ExecerContext,
    IsolationLevel, NamedValue, NamedValueChecker, Queryer, QueryerContext, Rows,
    SessionResetter, Stmt, Tx, TxOptions, Validator, Value,
};
use crate::error::{DriverError, DriverResult, Sentinel};
use crate::event::{Entity, Event, Method};
use crate::hooks::Hooks;
use crate::stack;
use std::sync::Arc;

/// A connection proxy.
///
/// Always advertises every optional connection capability. When the wrapped
/// connection lacks one, the proxy either falls back to a required method
/// (prepare, begin) or answers with [`Sentinel::Skip`] so the front-end takes
/// its default path.
pub struct ProxyConn {
    inner: Box<dyn Conn>,
    state: Arc<ConnState>,
}

impl ProxyConn {
    pub(crate) fn new(inner: Box<dyn Conn>, hooks: Arc<Hooks>) -> Self {
        Self {
            inner,
            state: ConnState::new(hooks),
        }
    }

    /// True between a successful begin and a successful commit or rollback.
    pub fn in_transaction(&self) -> bool {
        self.state.in_transaction()
    }

    fn event(&self, method: Method) -> Event {
        self.state.event(Entity::Connection, method)
    }
}

fn wrap_stmt(state: &Arc<ConnState>, stmt: Box<dyn Stmt>) -> Box<dyn Stmt> {
    Box::new(ProxyStmt::new(stmt, state.clone()))
}

fn wrap_tx(state: &Arc<ConnState>, tx: Box<dyn Tx>) -> Box<dyn Tx> {
    state.set_in_transaction(true);
    Box::new(ProxyTx::new(tx, state.clone()))
}

pub(super) fn wrap_result(state: &Arc<ConnState>, result: Box<dyn ExecResult>) -> Box<dyn ExecResult> {
    Box::new(ProxyResult::new(result, state.clone()))
}

pub(super) fn wrap_rows(state: &Arc<ConnState>, rows: Box<dyn Rows>) -> Box<dyn Rows> {
    Box::new(ProxyRows::new(rows, state.clone()))
}

/// Options a plain `begin` cannot honour.
fn check_plain_begin(opts: &TxOptions) -> DriverResult<()> {
    if opts.isolation != IsolationLevel::Default {
        return Err(DriverError::other(
            "sql: driver does not support non-default isolation level",
        ));
    }
    if opts.read_only {
        return Err(DriverError::other(
            "sql: driver does not support read-only transactions",
        ));
    }
    Ok(())
}

impl Conn for ProxyConn {
    fn prepare(&mut self, query: &str) -> DriverResult<Box<dyn Stmt>> {
        let event = self.event(Method::Prepare);
        let _scope = stack::proxy_scope(event);
        let hooks = &self.state.hooks;

        let query = match hooks.apply_before_prepare(&event, query) {
            Ok(query) => query,
            Err(err) => return Err(hooks.fail(&event, err)),
        };
        match self.inner.prepare(&query) {
            Ok(stmt) => Ok(wrap_stmt(&self.state, stmt)),
            Err(err) => Err(hooks.fail(&event, err)),
        }
    }

    fn close(&mut self) -> DriverResult<()> {
        let event = self.event(Method::Close);
        let _scope = stack::proxy_scope(event);
        let result = self.inner.close();
        self.state.hooks.settle(&event, result, || ())
    }

    fn begin(&mut self) -> DriverResult<Box<dyn Tx>> {
        let event = self.event(Method::Begin);
        let _scope = stack::proxy_scope(event);
        match self.inner.begin() {
            Ok(tx) => Ok(wrap_tx(&self.state, tx)),
            Err(err) => Err(self.state.hooks.fail(&event, err)),
        }
    }

    fn as_prepare_context(&mut self) -> Option<&mut dyn ConnPrepareContext> {
        Some(self)
    }

    fn as_begin_tx(&mut self) -> Option<&mut dyn ConnBeginTx> {
        Some(self)
    }

    fn as_named_value_checker(&mut self) -> Option<&mut dyn NamedValueChecker> {
        Some(self)
    }

    fn as_execer(&mut self) -> Option<&mut dyn Execer> {
        Some(self)
    }

    fn as_execer_context(&mut self) -> Option<&mut dyn ExecerContext> {
        Some(self)
    }

    fn as_queryer(&mut self) -> Option<&mut dyn Queryer> {
        Some(self)
    }

    fn as_queryer_context(&mut self) -> Option<&mut dyn QueryerContext> {
        Some(self)
    }

    fn as_session_resetter(&mut self) -> Option<&mut dyn SessionResetter> {
        Some(self)
    }

    fn as_validator(&self) -> Option<&dyn Validator> {
        Some(self)
    }
}

impl ConnPrepareContext for ProxyConn {
    fn prepare_context(&mut self, ctx: &Context, query: &str) -> DriverResult<Box<dyn Stmt>> {
        let event = self.event(Method::PrepareContext);
        let _scope = stack::proxy_scope(event);
        let state = &self.state;

        let query = match state.hooks.apply_before_prepare(&event, query) {
            Ok(query) => query,
            Err(err) => return Err(state.hooks.fail(&event, err)),
        };
        let result = match self.inner.as_prepare_context() {
            Some(inner) => inner.prepare_context(ctx, &query),
            None => {
                tracing::trace!(target: "sqlproxy", "PrepareContext unsupported, falling back to Prepare");
                self.inner.prepare(&query)
            }
        };
        match result {
            Ok(stmt) => Ok(wrap_stmt(state, stmt)),
            Err(err) => Err(state.hooks.fail(&event, err)),
        }
    }
}

impl ConnBeginTx for ProxyConn {
    fn begin_tx(&mut self, ctx: &Context, opts: TxOptions) -> DriverResult<Box<dyn Tx>> {
        let event = self.event(Method::BeginTx);
        let _scope = stack::proxy_scope(event);
        let state = &self.state;

        let result = match self.inner.as_begin_tx() {
            Some(inner) => inner.begin_tx(ctx, opts),
            None => {
                tracing::trace!(target: "sqlproxy", "BeginTx unsupported, falling back to Begin");
                check_plain_begin(&opts).and_then(|()| self.inner.begin())
            }
        };
        match result {
            Ok(tx) => Ok(wrap_tx(state, tx)),
            Err(err) => Err(state.hooks.fail(&event, err)),
        }
    }
}

impl NamedValueChecker for ProxyConn {
    fn check_named_value(&mut self, value: &mut NamedValue) -> DriverResult<()> {
        let event = self.event(Method::CheckNamedValue);
        let Some(inner) = self.inner.as_named_value_checker() else {
            return Err(Sentinel::Skip.into());
        };
        let _scope = stack::proxy_scope(event);
        let result = inner.check_named_value(value);
        self.state.hooks.settle(&event, result, || ())
    }
}

impl Execer for ProxyConn {
    fn exec(&mut self, query: &str, args: Vec<Value>) -> DriverResult<Box<dyn ExecResult>> {
        let event = self.event(Method::Exec);
        let state = &self.state;
        let Some(inner) = self.inner.as_execer() else {
            return Err(Sentinel::Skip.into());
        };
        let _scope = stack::proxy_scope(event);

        let (query, args) = match state.hooks.apply_before_query(&event, query, args) {
            Ok(rewritten) => rewritten,
            Err(err) => return Err(state.hooks.fail(&event, err)),
        };
        match inner.exec(&query, args) {
            Ok(result) => Ok(wrap_result(state, result)),
            Err(err) => Err(state.hooks.fail(&event, err)),
        }
    }
}

impl ExecerContext for ProxyConn {
    fn exec_context(
        &mut self,
        ctx: &Context,
        query: &str,
        args: Vec<NamedValue>,
    ) -> DriverResult<Box<dyn ExecResult>> {
        let event = self.event(Method::ExecContext);
        let state = &self.state;
        let Some(inner) = self.inner.as_execer_context() else {
            return Err(Sentinel::Skip.into());
        };
        let _scope = stack::proxy_scope(event);

        let (query, args) = match state.hooks.apply_before_query_context(&event, query, args) {
            Ok(rewritten) => rewritten,
            Err(err) => return Err(state.hooks.fail(&event, err)),
        };
        match inner.exec_context(ctx, &query, args) {
            Ok(result) => Ok(wrap_result(state, result)),
            Err(err) => Err(state.hooks.fail(&event, err)),
        }
    }
}

impl Queryer for ProxyConn {
    fn query(&mut self, query: &str, args: Vec<Value>) -> DriverResult<Box<dyn Rows>> {
        let event = self.event(Method::Query);
        let state = &self.state;
        let Some(inner) = self.inner.as_queryer() else {
            return Err(Sentinel::Skip.into());
        };
        let _scope = stack::proxy_scope(event);

        let (query, args) = match state.hooks.apply_before_query(&event, query, args) {
            Ok(rewritten) => rewritten,
            Err(err) => return Err(state.hooks.fail(&event, err)),
        };
        match inner.query(&query, args) {
            Ok(rows) => Ok(wrap_rows(state, rows)),
            Err(err) => Err(state.hooks.fail(&event, err)),
        }
    }
}

impl QueryerContext for ProxyConn {
    fn query_context(
        &mut self,
        ctx: &Context,
        query: &str,
        args: Vec<NamedValue>,
    ) -> DriverResult<Box<dyn Rows>> {
        let event = self.event(Method::QueryContext);
        let state = &self.state;
        let Some(inner) = self.inner.as_queryer_context() else {
            return Err(Sentinel::Skip.into());
        };
        let _scope = stack::proxy_scope(event);

        let (query, args) = match state.hooks.apply_before_query_context(&event, query, args) {
            Ok(rewritten) => rewritten,
            Err(err) => return Err(state.hooks.fail(&event, err)),
        };
        match inner.query_context(ctx, &query, args) {
            Ok(rows) => Ok(wrap_rows(state, rows)),
            Err(err) => Err(state.hooks.fail(&event, err)),
        }
    }
}

impl SessionResetter for ProxyConn {
    fn reset_session(&mut self, ctx: &Context) -> DriverResult<()> {
        let event = self.event(Method::ResetSession);
        let Some(inner) = self.inner.as_session_resetter() else {
            return Ok(());
        };
        let _scope = stack::proxy_scope(event);
        let result = inner.reset_session(ctx);
        self.state.hooks.settle(&event, result, || ())
    }
}

impl Validator for ProxyConn {
    fn is_valid(&self) -> bool {
        self.inner.as_validator().is_none_or(|inner| inner.is_valid())
    }
}
