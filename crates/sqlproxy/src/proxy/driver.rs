use super::conn::ProxyConn;
use super::connector::{ConnectorShim, ProxyConnector};
use crate::driver::{Conn, Connector, Driver, DriverContext};
use crate::error::{DriverError, DriverResult};
use crate::event::{Entity, Event, Method};
use crate::hooks::Hooks;
use crate::stack;
use std::fmt;
use std::sync::Arc;

/// A driver wrapping another driver with hooks.
///
/// Cloning is cheap; clones share the wrapped driver and the hooks.
///
/// ```rust,ignore
/// use sqlproxy::{Hooks, ProxyDriver};
///
/// let driver = ProxyDriver::with_hooks(SqliteDriver::new(), Hooks::with_stacktrace());
/// let connector = driver.open_connector(":memory:")?;
/// let conn = connector.connect(&Context::background())?;
/// ```
#[derive(Clone)]
pub struct ProxyDriver {
    pub(super) inner: Arc<dyn Driver>,
    pub(super) hooks: Arc<Hooks>,
}

impl fmt::Debug for ProxyDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyDriver")
            .field("hooks", &self.hooks)
            .finish_non_exhaustive()
    }
}

impl ProxyDriver {
    /// Wrap `driver` without hooks; the proxy is fully transparent.
    pub fn new<D: Driver + 'static>(driver: D) -> Self {
        Self::with_hooks(driver, Hooks::new())
    }

    /// Wrap `driver`, calling `hooks` at every interception point.
    pub fn with_hooks<D: Driver + 'static>(driver: D, hooks: Hooks) -> Self {
        Self::from_arc(Arc::new(driver), hooks)
    }

    /// Wrap `driver`, passing every error through `handler`.
    pub fn with_error_handler<D, F>(driver: D, handler: F) -> Self
    where
        D: Driver + 'static,
        F: Fn(DriverError) -> DriverError + Send + Sync + 'static,
    {
        Self::with_hooks(driver, Hooks::with_error_handler(handler))
    }

    /// Wrap an already shared driver.
    pub fn from_arc(driver: Arc<dyn Driver>, hooks: Hooks) -> Self {
        Self {
            inner: driver,
            hooks: Arc::new(hooks),
        }
    }

    pub fn hooks(&self) -> &Hooks {
        &self.hooks
    }

    /// The wrapped driver.
    pub fn inner(&self) -> &Arc<dyn Driver> {
        &self.inner
    }

    /// Like [`Driver::open`], returning the concrete proxy type.
    pub fn open_conn(&self, name: &str) -> DriverResult<ProxyConn> {
        let event = Self::event(Method::Open);
        let _scope = stack::proxy_scope(event);
        match self.inner.open(name) {
            Ok(conn) => Ok(self.wrap_conn(conn)),
            Err(err) => Err(self.hooks.fail(&event, err)),
        }
    }

    pub(super) fn wrap_conn(&self, conn: Box<dyn Conn>) -> ProxyConn {
        ProxyConn::new(conn, self.hooks.clone())
    }

    fn event(method: Method) -> Event {
        Event::new(Entity::Driver, method, false)
    }
}

impl Driver for ProxyDriver {
    fn open(&self, name: &str) -> DriverResult<Box<dyn Conn>> {
        Ok(Box::new(self.open_conn(name)?))
    }

    fn as_driver_context(&self) -> Option<&dyn DriverContext> {
        Some(self)
    }
}

impl DriverContext for ProxyDriver {
    fn open_connector(&self, name: &str) -> DriverResult<Box<dyn Connector>> {
        let Some(driver_context) = self.inner.as_driver_context() else {
            tracing::trace!(target: "sqlproxy", "driver has no connector factory, using shim");
            return Ok(Box::new(ConnectorShim::new(self.clone(), name)));
        };

        let event = Self::event(Method::OpenConnector);
        let _scope = stack::proxy_scope(event);
        match driver_context.open_connector(name) {
            Ok(connector) => Ok(Box::new(ProxyConnector::new(connector, self.clone()))),
            Err(err) => Err(self.hooks.fail(&event, err)),
        }
    }
}
