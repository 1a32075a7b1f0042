//! Components, dependency slots and the factories that build them.

use crate::router::{ErasedRoute, HandlerGroup, Route};
use std::any::{Any, TypeId};
use std::fmt;
use std::ops::Deref;
use std::sync::{Arc, OnceLock};

/// A singleton managed by the container (helper, service or handler-group).
pub trait Component: Send + Sync + 'static {
    /// Fields carrying a dependency marker. Helpers must return none.
    fn dependencies(&self) -> Vec<Dependency<'_>> {
        Vec::new()
    }
}

/// A field the container fills with the singleton of type `T`.
///
/// Dereferencing an unwired slot panics; the container aborts startup before
/// any slot could be left empty.
pub struct Inject<T> {
    slot: OnceLock<Arc<T>>,
}

impl<T> Default for Inject<T> {
    fn default() -> Self {
        Inject {
            slot: OnceLock::new(),
        }
    }
}

impl<T> Inject<T> {
    pub fn is_wired(&self) -> bool {
        self.slot.get().is_some()
    }
}

impl<T> Deref for Inject<T> {
    type Target = T;

    fn deref(&self) -> &T {
        match self.slot.get() {
            Some(v) => v,
            None => panic!("{} used before wiring", std::any::type_name::<T>()),
        }
    }
}

impl<T> fmt::Debug for Inject<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Inject")
            .field("target", &std::any::type_name::<T>())
            .field("wired", &self.is_wired())
            .finish()
    }
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum FillError {
    TypeMismatch,
    AlreadyWired,
}

/// Type-erased view of an `Inject<T>` slot.
pub(crate) trait Slot: Send + Sync {
    fn fill(&self, component: Arc<dyn Any + Send + Sync>) -> Result<(), FillError>;
}

impl<T: Send + Sync + 'static> Slot for Inject<T> {
    fn fill(&self, component: Arc<dyn Any + Send + Sync>) -> Result<(), FillError> {
        let typed = component.downcast::<T>().map_err(|_| FillError::TypeMismatch)?;
        self.slot.set(typed).map_err(|_| FillError::AlreadyWired)
    }
}

/// One dependency marker: the field name, the declared target type and its slot.
pub struct Dependency<'a> {
    pub field: &'static str,
    pub target: TypeId,
    pub target_name: &'static str,
    /// Target is known to be a handler-group even if it was never registered.
    pub handler_group: bool,
    pub(crate) slot: &'a dyn Slot,
}

impl<'a> Dependency<'a> {
    pub fn on<T: Send + Sync + 'static>(field: &'static str, slot: &'a Inject<T>) -> Self {
        Dependency {
            field,
            target: TypeId::of::<T>(),
            target_name: std::any::type_name::<T>(),
            handler_group: false,
            slot,
        }
    }

    /// Marker on a handler-group type. Always rejected by the container.
    pub fn on_handler_group<T: HandlerGroup>(field: &'static str, slot: &'a Inject<T>) -> Self {
        Dependency {
            handler_group: true,
            ..Self::on(field, slot)
        }
    }
}

/// A constructed singleton, kept both as `Any` (for injection) and as `Component`.
#[derive(Clone)]
pub(crate) struct Managed {
    pub name: &'static str,
    pub type_id: TypeId,
    pub any: Arc<dyn Any + Send + Sync>,
    pub component: Arc<dyn Component>,
}

/// Default-constructs one component type. Handler-group factories also carry routes.
#[derive(Clone, Copy)]
pub struct ComponentFactory {
    pub name: &'static str,
    pub type_id: TypeId,
    build: fn() -> Managed,
    mount: Option<Mount>,
}

#[derive(Clone, Copy)]
struct Mount {
    base_path: &'static str,
    routes: fn() -> Vec<ErasedRoute>,
}

impl ComponentFactory {
    pub fn of<C: Component + Default>() -> Self {
        ComponentFactory {
            name: std::any::type_name::<C>(),
            type_id: TypeId::of::<C>(),
            build: build::<C>,
            mount: None,
        }
    }

    pub fn handler_group<C: HandlerGroup + Default>() -> Self {
        fn routes<C: HandlerGroup>() -> Vec<ErasedRoute> {
            C::routes().into_iter().map(Route::erase).collect()
        }
        ComponentFactory {
            mount: Some(Mount {
                base_path: C::BASE_PATH,
                routes: routes::<C>,
            }),
            ..Self::of::<C>()
        }
    }

    pub fn has_routes(&self) -> bool {
        self.mount.is_some()
    }

    pub(crate) fn build(&self) -> Managed {
        (self.build)()
    }

    /// Base path and routes of a handler-group factory.
    pub(crate) fn routes(&self) -> Option<(&'static str, Vec<ErasedRoute>)> {
        self.mount.map(|m| (m.base_path, (m.routes)()))
    }
}

fn build<C: Component + Default>() -> Managed {
    let instance = Arc::new(C::default());
    Managed {
        name: std::any::type_name::<C>(),
        type_id: TypeId::of::<C>(),
        any: instance.clone(),
        component: instance,
    }
}

impl fmt::Debug for ComponentFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentFactory")
            .field("name", &self.name)
            .field("base_path", &self.mount.map(|m| m.base_path))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Clock;
    impl Component for Clock {}

    #[derive(Default)]
    struct Scheduler {
        clock: Inject<Clock>,
    }
    impl Component for Scheduler {
        fn dependencies(&self) -> Vec<Dependency<'_>> {
            vec![Dependency::on("clock", &self.clock)]
        }
    }

    #[test]
    fn slot_fills_once_with_matching_type() {
        let scheduler = Scheduler::default();
        let deps = scheduler.dependencies();
        assert_eq!(deps[0].target, TypeId::of::<Clock>());

        let wrong: Arc<dyn Any + Send + Sync> = Arc::new(Scheduler::default());
        assert_eq!(deps[0].slot.fill(wrong), Err(FillError::TypeMismatch));
        assert!(!scheduler.clock.is_wired());

        let clock: Arc<dyn Any + Send + Sync> = Arc::new(Clock);
        deps[0].slot.fill(clock.clone()).unwrap();
        assert!(scheduler.clock.is_wired());
        assert_eq!(deps[0].slot.fill(clock), Err(FillError::AlreadyWired));
    }

    #[test]
    fn factory_builds_fresh_instance() {
        let factory = ComponentFactory::of::<Scheduler>();
        assert!(!factory.has_routes());
        let managed = factory.build();
        assert_eq!(managed.type_id, TypeId::of::<Scheduler>());
        assert_eq!(managed.component.dependencies().len(), 1);
    }
}
