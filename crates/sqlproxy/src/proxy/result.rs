use super::ConnState;
use crate::driver::ExecResult;
use crate::error::DriverResult;
use crate::event::{Entity, Method};
use crate::stack;
use std::sync::Arc;

/// Proxy for the outcome of an exec call. A suppressed error reads as `0`.
pub struct ProxyResult {
    inner: Box<dyn ExecResult>,
    state: Arc<ConnState>,
}

impl ProxyResult {
    pub(super) fn new(inner: Box<dyn ExecResult>, state: Arc<ConnState>) -> Self {
        Self { inner, state }
    }

    fn forward(
        &self,
        method: Method,
        call: impl FnOnce(&dyn ExecResult) -> DriverResult<i64>,
    ) -> DriverResult<i64> {
        let event = self.state.event(Entity::Result, method);
        let _scope = stack::proxy_scope(event);
        let result = call(self.inner.as_ref());
        self.state.hooks.settle(&event, result, || 0)
    }
}

impl ExecResult for ProxyResult {
    fn last_insert_id(&self) -> DriverResult<i64> {
        self.forward(Method::LastInsertId, |inner| inner.last_insert_id())
    }

    fn rows_affected(&self) -> DriverResult<i64> {
        self.forward(Method::RowsAffected, |inner| inner.rows_affected())
    }
}
