use super::ConnState;
use crate::driver::Tx;
use crate::error::DriverResult;
use crate::event::{Entity, Event, Method};
use crate::stack;
use std::sync::Arc;

/// A transaction proxy.
///
/// A successful commit or rollback clears the connection's transaction flag.
/// A failed one leaves it set, since the transaction's state is then unknown.
pub struct ProxyTx {
    inner: Box<dyn Tx>,
    state: Arc<ConnState>,
}

impl ProxyTx {
    pub(super) fn new(inner: Box<dyn Tx>, state: Arc<ConnState>) -> Self {
        Self { inner, state }
    }

    fn finish(
        self,
        method: Method,
        end: impl FnOnce(Box<dyn Tx>) -> DriverResult<()>,
    ) -> DriverResult<()> {
        let event = Event::new(Entity::Transaction, method, self.state.in_transaction());
        let _scope = stack::proxy_scope(event);
        match end(self.inner) {
            Ok(()) => {
                self.state.set_in_transaction(false);
                Ok(())
            }
            Err(err) => self.state.hooks.settle(&event, Err(err), || ()),
        }
    }
}

impl Tx for ProxyTx {
    fn commit(self: Box<Self>) -> DriverResult<()> {
        (*self).finish(Method::Commit, |tx| tx.commit())
    }

    fn rollback(self: Box<Self>) -> DriverResult<()> {
        (*self).finish(Method::Rollback, |tx| tx.rollback())
    }
}
