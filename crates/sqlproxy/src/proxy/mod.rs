//! Proxies for every object of the driver contract.
//!
//! Ownership flows downward only: a connection proxy and everything derived
//! from it (statements, transactions, results, rows, value converters) share
//! one [`ConnState`] holding the driver's hooks and the connection's
//! transaction flag. Nothing below the driver holds a reference back up to
//! the object that created it, so no reference cycle can form.

mod conn;
mod connector;
mod driver;
mod result;
mod rows;
mod stmt;
mod tx;
mod value_converter;

pub use conn::ProxyConn;
pub use connector::{ConnectorShim, ProxyConnector, wrap_connector};
pub use driver::ProxyDriver;
pub use result::ProxyResult;
pub use rows::ProxyRows;
pub use stmt::ProxyStmt;
pub use tx::ProxyTx;
pub use value_converter::ProxyValueConverter;

use crate::event::{Entity, Event, Method};
use crate::hooks::Hooks;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// State shared by a connection proxy and its descendants.
///
/// The transaction flag is written only by the connection's begin paths and
/// by its transaction's commit/rollback; everything else reads it.
pub(crate) struct ConnState {
    pub(crate) hooks: Arc<Hooks>,
    in_tx: AtomicBool,
}

impl ConnState {
    pub(crate) fn new(hooks: Arc<Hooks>) -> Arc<Self> {
        Arc::new(Self {
            hooks,
            in_tx: AtomicBool::new(false),
        })
    }

    pub(crate) fn in_transaction(&self) -> bool {
        self.in_tx.load(Ordering::Acquire)
    }

    pub(crate) fn set_in_transaction(&self, in_tx: bool) {
        self.in_tx.store(in_tx, Ordering::Release);
    }

    pub(crate) fn event(&self, entity: Entity, method: Method) -> Event {
        Event::new(entity, method, self.in_transaction())
    }
}
