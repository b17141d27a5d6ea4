use super::ConnState;
use super::conn::{wrap_result, wrap_rows};
use super::value_converter::ProxyValueConverter;
use crate::driver::{
    ColumnConverter, Context, DefaultParameterConverter, ExecResult, NamedValue,
    NamedValueChecker, Rows, Stmt, StmtExecContext, StmtQueryContext, Value, ValueConverter,
    named_values_to_values,
};
use crate::error::{DriverResult, Sentinel};
use crate::event::{Entity, Event, Method};
use crate::stack;
use std::sync::Arc;

/// A prepared statement proxy.
///
/// Events carry the owning connection's transaction flag.
pub struct ProxyStmt {
    inner: Box<dyn Stmt>,
    state: Arc<ConnState>,
}

impl ProxyStmt {
    pub(super) fn new(inner: Box<dyn Stmt>, state: Arc<ConnState>) -> Self {
        Self { inner, state }
    }

    fn event(&self, method: Method) -> Event {
        self.state.event(Entity::Statement, method)
    }
}

impl Stmt for ProxyStmt {
    fn close(&mut self) -> DriverResult<()> {
        let event = self.event(Method::Close);
        let _scope = stack::proxy_scope(event);
        let result = self.inner.close();
        self.state.hooks.settle(&event, result, || ())
    }

    fn num_input(&self) -> Option<usize> {
        self.inner.num_input()
    }

    fn exec(&mut self, args: Vec<Value>) -> DriverResult<Box<dyn ExecResult>> {
        let event = self.event(Method::Exec);
        let _scope = stack::proxy_scope(event);
        let hooks = &self.state.hooks;

        let args = match hooks.apply_before_prepared_query(&event, args) {
            Ok(args) => args,
            Err(err) => return Err(hooks.fail(&event, err)),
        };
        match self.inner.exec(args) {
            Ok(result) => Ok(wrap_result(&self.state, result)),
            Err(err) => Err(hooks.fail(&event, err)),
        }
    }

    fn query(&mut self, args: Vec<Value>) -> DriverResult<Box<dyn Rows>> {
        let event = self.event(Method::Query);
        let _scope = stack::proxy_scope(event);
        let hooks = &self.state.hooks;

        let args = match hooks.apply_before_prepared_query(&event, args) {
            Ok(args) => args,
            Err(err) => return Err(hooks.fail(&event, err)),
        };
        match self.inner.query(args) {
            Ok(rows) => Ok(wrap_rows(&self.state, rows)),
            Err(err) => Err(hooks.fail(&event, err)),
        }
    }

    fn as_exec_context(&mut self) -> Option<&mut dyn StmtExecContext> {
        Some(self)
    }

    fn as_query_context(&mut self) -> Option<&mut dyn StmtQueryContext> {
        Some(self)
    }

    fn as_named_value_checker(&mut self) -> Option<&mut dyn NamedValueChecker> {
        Some(self)
    }

    fn as_column_converter(&self) -> Option<&dyn ColumnConverter> {
        Some(self)
    }
}

impl StmtExecContext for ProxyStmt {
    fn exec_context(
        &mut self,
        ctx: &Context,
        args: Vec<NamedValue>,
    ) -> DriverResult<Box<dyn ExecResult>> {
        let event = self.event(Method::ExecContext);
        let _scope = stack::proxy_scope(event);
        let state = &self.state;

        let Some(inner) = self.inner.as_exec_context() else {
            tracing::trace!(target: "sqlproxy", "statement ExecContext unsupported, falling back to Exec");
            let values = named_values_to_values(&args).map_err(|err| state.hooks.fail(&event, err))?;
            return self.exec(values);
        };

        let args = match state.hooks.apply_before_prepared_query_context(&event, args) {
            Ok(args) => args,
            Err(err) => return Err(state.hooks.fail(&event, err)),
        };
        match inner.exec_context(ctx, args) {
            Ok(result) => Ok(wrap_result(state, result)),
            Err(err) => Err(state.hooks.fail(&event, err)),
        }
    }
}

impl StmtQueryContext for ProxyStmt {
    fn query_context(
        &mut self,
        ctx: &Context,
        args: Vec<NamedValue>,
    ) -> DriverResult<Box<dyn Rows>> {
        let event = self.event(Method::QueryContext);
        let _scope = stack::proxy_scope(event);
        let state = &self.state;

        let Some(inner) = self.inner.as_query_context() else {
            tracing::trace!(target: "sqlproxy", "statement QueryContext unsupported, falling back to Query");
            let values = named_values_to_values(&args).map_err(|err| state.hooks.fail(&event, err))?;
            return self.query(values);
        };

        let args = match state.hooks.apply_before_prepared_query_context(&event, args) {
            Ok(args) => args,
            Err(err) => return Err(state.hooks.fail(&event, err)),
        };
        match inner.query_context(ctx, args) {
            Ok(rows) => Ok(wrap_rows(state, rows)),
            Err(err) => Err(state.hooks.fail(&event, err)),
        }
    }
}

impl NamedValueChecker for ProxyStmt {
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

impl ColumnConverter for ProxyStmt {
    fn column_converter(&self, index: usize) -> Box<dyn ValueConverter> {
        match self.inner.as_column_converter() {
            Some(inner) => Box::new(ProxyValueConverter::new(
                inner.column_converter(index),
                self.state.clone(),
            )),
            None => Box::new(DefaultParameterConverter),
        }
    }
}
