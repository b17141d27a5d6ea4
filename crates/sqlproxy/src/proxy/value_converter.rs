use super::ConnState;
use crate::driver::{Value, ValueConverter};
use crate::error::DriverResult;
use crate::event::{Entity, Method};
use crate::stack;
use std::sync::Arc;

/// Proxy for a statement's per-column converter.
///
/// A suppressed conversion error yields [`Value::Null`].
pub struct ProxyValueConverter {
    inner: Box<dyn ValueConverter>,
    state: Arc<ConnState>,
}

impl ProxyValueConverter {
    pub(super) fn new(inner: Box<dyn ValueConverter>, state: Arc<ConnState>) -> Self {
        Self { inner, state }
    }
}

impl ValueConverter for ProxyValueConverter {
    fn convert_value(&self, input: &serde_json::Value) -> DriverResult<Value> {
        let event = self.state.event(Entity::ValueConverter, Method::ConvertValue);
        let _scope = stack::proxy_scope(event);
        let result = self.inner.convert_value(input);
        self.state.hooks.settle(&event, result, || Value::Null)
    }
}
