//! Shared application state: the store, the wired container and the router.

use crate::container::Container;
use crate::error::ConfigError;
use crate::registry::{Registry, Scanner};
use crate::response::Envelope;
use crate::router::{Request, RequestRouter, RouteTable};
use crate::store::EntityStore;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<EntityStore>,
    pub container: Arc<Container>,
    pub router: Arc<RequestRouter>,
}

impl AppState {
    /// Run the startup sequence: scan, define tables, register gateways, then
    /// instantiate and wire gateways, helpers, services and handler-groups.
    /// Any configuration error aborts.
    pub fn bootstrap(registry: Registry, root: &str) -> Result<Self, ConfigError> {
        let scanner = Scanner::new(registry, root);
        let scan = scanner.scan()?;

        let store = Arc::new(EntityStore::new());
        for record in &scan.records {
            store.define_table(record.clone())?;
        }
        for (gateway, _) in &scan.gateways {
            store.register_gateway(gateway)?;
        }

        let mut container = Container::new(scan);
        container.instantiate_gateways(&scan.gateways, &store);
        container.instantiate_helpers(&scan.helpers)?;
        container.instantiate_services(&scan.services)?;
        container.wire_service_dependencies()?;

        let mut routes = RouteTable::new();
        container.instantiate_handler_groups(&scan.handler_groups, &mut routes)?;
        container.wire_handler_group_dependencies()?;
        tracing::info!(routes = routes.len(), "application ready");

        let router = RequestRouter::new(routes, store.clone());
        Ok(AppState {
            store,
            container: Arc::new(container),
            router: Arc::new(router),
        })
    }

    pub fn dispatch(&self, request: &Request) -> Envelope {
        self.router.dispatch(request)
    }
}
