use super::driver::ProxyDriver;
use crate::driver::{Conn, Connector, Context, Driver};
use crate::error::DriverResult;
use crate::event::{Entity, Event, Method};
use crate::hooks::Hooks;
use crate::stack;
use std::sync::Arc;

/// Wrap an existing connector.
///
/// Use this in place of [`ProxyDriver`] when you already hold a connector.
/// Its [`Connector::driver`] reports a proxy driver sharing the same hooks.
pub fn wrap_connector(connector: Box<dyn Connector>, hooks: Hooks) -> ProxyConnector {
    let driver = ProxyDriver::from_arc(connector.driver(), hooks);
    ProxyConnector::new(connector, driver)
}

/// A connector producing proxied connections.
pub struct ProxyConnector {
    inner: Box<dyn Connector>,
    driver: ProxyDriver,
}

impl ProxyConnector {
    pub(super) fn new(inner: Box<dyn Connector>, driver: ProxyDriver) -> Self {
        Self { inner, driver }
    }
}

impl Connector for ProxyConnector {
    fn connect(&self, ctx: &Context) -> DriverResult<Box<dyn Conn>> {
        let event = Event::new(Entity::Connector, Method::Connect, false);
        let _scope = stack::proxy_scope(event);
        match self.inner.connect(ctx) {
            Ok(conn) => Ok(Box::new(self.driver.wrap_conn(conn))),
            Err(err) => Err(self.driver.hooks.fail(&event, err)),
        }
    }

    fn driver(&self) -> Arc<dyn Driver> {
        Arc::new(self.driver.clone())
    }
}

/// Stands in for a connector when the wrapped driver has no connector factory.
///
/// Ignores the context passed to `connect` and opens a connection by name.
pub struct ConnectorShim {
    driver: ProxyDriver,
    name: String,
}

impl ConnectorShim {
    pub(super) fn new(driver: ProxyDriver, name: &str) -> Self {
        Self {
            driver,
            name: name.to_string(),
        }
    }
}

impl Connector for ConnectorShim {
    /// Opens through the proxy driver, so failures are routed as `driver.Open`.
    fn connect(&self, _ctx: &Context) -> DriverResult<Box<dyn Conn>> {
        Ok(Box::new(self.driver.open_conn(&self.name)?))
    }

    fn driver(&self) -> Arc<dyn Driver> {
        Arc::new(self.driver.clone())
    }
}
