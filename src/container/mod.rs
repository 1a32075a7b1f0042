//! Wiring container: builds one instance per helper, service and handler-group,
//! resolves their dependency markers and mounts handler-group routes.
//!
//! Dependencies only flow downward: handler-groups -> services -> helpers, with
//! gateways available to services and handler-groups. Any violation aborts startup.

mod inject;

pub use inject::{Component, ComponentFactory, Dependency, Inject};

use crate::error::ConfigError;
use crate::gateway::{GatewayFactory, GatewayType};
use crate::registry::{ScanResult, Tag};
use crate::router::{ReturnShape, RouteEntry, RouteTable, Verb};
use crate::store::EntityStore;
use inject::{FillError, Managed};
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

pub struct Container {
    /// Classified role of every scanned component and gateway type.
    roles: HashMap<TypeId, Tag>,
    gateways: Vec<Managed>,
    helpers: Vec<Managed>,
    services: Vec<Managed>,
    handler_groups: Vec<Managed>,
}

impl Container {
    pub fn new(scan: &ScanResult) -> Self {
        let mut roles = HashMap::new();
        for (_, factory) in &scan.gateways {
            roles.insert(factory.type_id, Tag::Gateway);
        }
        for (list, tag) in [
            (&scan.helpers, Tag::Helper),
            (&scan.services, Tag::Service),
            (&scan.handler_groups, Tag::HandlerGroup),
        ] {
            for factory in list {
                roles.insert(factory.type_id, tag);
            }
        }
        Container {
            roles,
            gateways: Vec::new(),
            helpers: Vec::new(),
            services: Vec::new(),
            handler_groups: Vec::new(),
        }
    }

    /// Build one `Gateway<T>` per registered gateway, bound to the shared store.
    pub fn instantiate_gateways(
        &mut self,
        list: &[(GatewayType, GatewayFactory)],
        store: &Arc<EntityStore>,
    ) {
        for (ty, factory) in list {
            let any = factory.build(ty.name.clone(), store.clone());
            self.gateways.push(Managed {
                name: factory.type_name,
                type_id: factory.type_id,
                component: Arc::new(GatewayComponent),
                any,
            });
            tracing::info!(gateway = %ty.name, "instantiated gateway");
        }
    }

    /// Helpers are leaves: any dependency marker is fatal.
    pub fn instantiate_helpers(&mut self, list: &[ComponentFactory]) -> Result<(), ConfigError> {
        for factory in list {
            let managed = factory.build();
            if let Some(dep) = managed.component.dependencies().first() {
                return Err(ConfigError::IllegalDependency {
                    component: factory.name.to_string(),
                    field: dep.field.to_string(),
                    target: dep.target_name.to_string(),
                    reason: "helpers cannot declare dependencies",
                });
            }
            tracing::info!(helper = factory.name, "instantiated helper");
            self.helpers.push(managed);
        }
        Ok(())
    }

    pub fn instantiate_services(&mut self, list: &[ComponentFactory]) -> Result<(), ConfigError> {
        for factory in list {
            let managed = factory.build();
            for dep in managed.component.dependencies() {
                let reason = if dep.target == factory.type_id {
                    Some("a service cannot depend on itself")
                } else if self.targets_handler_group(&dep) {
                    Some("services cannot depend on handler-groups")
                } else {
                    None
                };
                if let Some(reason) = reason {
                    return Err(ConfigError::IllegalDependency {
                        component: factory.name.to_string(),
                        field: dep.field.to_string(),
                        target: dep.target_name.to_string(),
                        reason,
                    });
                }
            }
            tracing::info!(service = factory.name, "instantiated service");
            self.services.push(managed);
        }
        Ok(())
    }

    /// Resolve service dependencies against helpers (and gateways).
    pub fn wire_service_dependencies(&self) -> Result<(), ConfigError> {
        for service in &self.services {
            for dep in service.component.dependencies() {
                let target = find(&self.helpers, dep.target).or_else(|| find(&self.gateways, dep.target));
                self.fill(service, &dep, target)?;
            }
        }
        Ok(())
    }

    /// Build handler-groups and register every route into `routes`.
    pub fn instantiate_handler_groups(
        &mut self,
        list: &[ComponentFactory],
        routes: &mut RouteTable,
    ) -> Result<(), ConfigError> {
        for factory in list {
            let managed = factory.build();
            for dep in managed.component.dependencies() {
                self.check_handler_group_dependency(factory.name, &dep)?;
            }

            let (base_path, group_routes) =
                factory.routes().ok_or_else(|| ConfigError::Unresolvable {
                    entry: factory.name.to_string(),
                    role: Tag::HandlerGroup.as_str(),
                })?;
            for route in group_routes {
                if route.verb == Verb::Get && route.method.returns != ReturnShape::Envelope {
                    return Err(ConfigError::InvalidHandlerReturn {
                        verb: route.verb.to_string(),
                        group: factory.name.to_string(),
                        method: route.method.name.to_string(),
                    });
                }
                let path = format!("{}{}", base_path, route.path);
                routes.insert(RouteEntry::new(
                    route,
                    path,
                    factory.name,
                    managed.any.clone(),
                ))?;
            }
            tracing::info!(handler_group = factory.name, base_path, "instantiated handler-group");
            self.handler_groups.push(managed);
        }
        Ok(())
    }

    /// Resolve handler-group dependencies against services (and gateways).
    pub fn wire_handler_group_dependencies(&self) -> Result<(), ConfigError> {
        for group in &self.handler_groups {
            for dep in group.component.dependencies() {
                self.check_handler_group_dependency(group.name, &dep)?;
                let target = find(&self.services, dep.target).or_else(|| find(&self.gateways, dep.target));
                self.fill(group, &dep, target)?;
            }
        }
        Ok(())
    }

    /// The singleton of type `T`, whatever its role.
    pub fn get<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        let id = TypeId::of::<T>();
        [&self.gateways, &self.helpers, &self.services, &self.handler_groups]
            .into_iter()
            .find_map(|list| find(list, id))
            .and_then(|any| any.downcast::<T>().ok())
    }

    fn role_of(&self, type_id: TypeId) -> Option<Tag> {
        self.roles.get(&type_id).copied()
    }

    fn targets_handler_group(&self, dep: &Dependency<'_>) -> bool {
        dep.handler_group || self.role_of(dep.target) == Some(Tag::HandlerGroup)
    }

    fn check_handler_group_dependency(
        &self,
        component: &str,
        dep: &Dependency<'_>,
    ) -> Result<(), ConfigError> {
        let reason = if self.targets_handler_group(dep) {
            "handler-groups cannot depend on handler-groups"
        } else if self.role_of(dep.target) == Some(Tag::Helper) {
            "helpers cannot be injected into handler-groups"
        } else {
            return Ok(());
        };
        Err(ConfigError::IllegalDependency {
            component: component.to_string(),
            field: dep.field.to_string(),
            target: dep.target_name.to_string(),
            reason,
        })
    }

    fn fill(
        &self,
        owner: &Managed,
        dep: &Dependency<'_>,
        target: Option<Arc<dyn Any + Send + Sync>>,
    ) -> Result<(), ConfigError> {
        let target = target.ok_or_else(|| ConfigError::UnresolvedDependency {
            component: owner.name.to_string(),
            field: dep.field.to_string(),
            target: dep.target_name.to_string(),
        })?;
        match dep.slot.fill(target) {
            Ok(()) => {
                tracing::debug!(component = owner.name, field = dep.field, dependency = dep.target_name, "wired dependency");
                Ok(())
            }
            Err(FillError::AlreadyWired) => Err(ConfigError::AlreadyWired {
                component: owner.name.to_string(),
                field: dep.field.to_string(),
            }),
            Err(FillError::TypeMismatch) => Err(ConfigError::UnresolvedDependency {
                component: owner.name.to_string(),
                field: dep.field.to_string(),
                target: dep.target_name.to_string(),
            }),
        }
    }
}

fn find(list: &[Managed], type_id: TypeId) -> Option<Arc<dyn Any + Send + Sync>> {
    list.iter().find(|m| m.type_id == type_id).map(|m| m.any.clone())
}

/// Gateways declare no dependencies of their own.
struct GatewayComponent;

impl Component for GatewayComponent {}
