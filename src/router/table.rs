//! Route declarations of handler-groups and the (verb, path) route table.

use crate::container::Component;
use crate::error::{AppError, ConfigError};
use crate::response::Envelope;
use crate::router::handler::{Arg, Handler, MethodDescriptor};
use crate::router::request::Verb;
use regex::Regex;
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

type GroupCall<G> = Arc<dyn Fn(&G, Vec<Arg>) -> Result<Option<Envelope>, AppError> + Send + Sync>;
type ErasedCall =
    Arc<dyn Fn(&(dyn Any + Send + Sync), Vec<Arg>) -> Result<Option<Envelope>, AppError> + Send + Sync>;

/// A class of request-handling methods sharing a base path.
pub trait HandlerGroup: Component + Sized {
    const BASE_PATH: &'static str;

    fn routes() -> Vec<Route<Self>>;
}

/// One verb-tagged method of handler-group `G` with its path relative to the base path.
pub struct Route<G> {
    pub verb: Verb,
    pub path: &'static str,
    pub method: MethodDescriptor,
    call: GroupCall<G>,
}

impl<G: Send + Sync + 'static> Route<G> {
    pub fn new<H, M>(verb: Verb, path: &'static str, handler: H) -> Self
    where
        H: Handler<G, M>,
    {
        Route {
            verb,
            path,
            method: MethodDescriptor {
                name: std::any::type_name::<H>(),
                params: H::params(),
                returns: H::returns(),
            },
            call: Arc::new(move |group: &G, args| handler.call(group, args)),
        }
    }

    pub fn get<H: Handler<G, M>, M>(path: &'static str, handler: H) -> Self {
        Self::new(Verb::Get, path, handler)
    }

    pub fn post<H: Handler<G, M>, M>(path: &'static str, handler: H) -> Self {
        Self::new(Verb::Post, path, handler)
    }

    pub fn put<H: Handler<G, M>, M>(path: &'static str, handler: H) -> Self {
        Self::new(Verb::Put, path, handler)
    }

    pub fn delete<H: Handler<G, M>, M>(path: &'static str, handler: H) -> Self {
        Self::new(Verb::Delete, path, handler)
    }

    /// Forget the group type; the call downcasts the owning instance.
    pub(crate) fn erase(self) -> ErasedRoute {
        let call = self.call;
        ErasedRoute {
            verb: self.verb,
            path: self.path,
            method: self.method,
            call: Arc::new(move |instance: &(dyn Any + Send + Sync), args| {
                let group = instance.downcast_ref::<G>().ok_or_else(|| {
                    AppError::Handler(format!("instance is not a {}", std::any::type_name::<G>()))
                })?;
                call(group, args)
            }),
        }
    }
}

pub(crate) struct ErasedRoute {
    pub verb: Verb,
    pub path: &'static str,
    pub method: MethodDescriptor,
    call: ErasedCall,
}

/// Immutable (verb, path, handler-group instance, method) binding.
#[derive(Clone)]
pub struct RouteEntry {
    pub verb: Verb,
    pub path: String,
    pub group: &'static str,
    pub instance: Arc<dyn Any + Send + Sync>,
    pub method: MethodDescriptor,
    call: ErasedCall,
}

impl RouteEntry {
    pub(crate) fn new(
        route: ErasedRoute,
        path: String,
        group: &'static str,
        instance: Arc<dyn Any + Send + Sync>,
    ) -> Self {
        RouteEntry {
            verb: route.verb,
            path,
            group,
            instance,
            method: route.method,
            call: route.call,
        }
    }

    pub fn invoke(&self, args: Vec<Arg>) -> Result<Option<Envelope>, AppError> {
        (self.call)(self.instance.as_ref(), args)
    }
}

#[derive(Default)]
pub struct RouteTable {
    routes: HashMap<(Verb, String), RouteEntry>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a route. Duplicate (verb, path) keys and malformed paths are fatal.
    pub fn insert(&mut self, entry: RouteEntry) -> Result<(), ConfigError> {
        validate_path(entry.group, &entry.path)?;
        let key = (entry.verb, entry.path.clone());
        if self.routes.contains_key(&key) {
            return Err(ConfigError::DuplicateRoute {
                verb: entry.verb.to_string(),
                path: entry.path,
            });
        }
        tracing::info!(verb = %entry.verb, path = %entry.path, method = entry.method.name, "inserted route");
        self.routes.insert(key, entry);
        Ok(())
    }

    pub fn get(&self, verb: Verb, path: &str) -> Option<&RouteEntry> {
        self.routes.get(&(verb, path.to_string()))
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

/// Full paths are absolute, slash-separated, without query or whitespace.
fn validate_path(group: &str, path: &str) -> Result<(), ConfigError> {
    let invalid = || ConfigError::InvalidPath {
        group: group.to_string(),
        path: path.to_string(),
    };
    let re = Regex::new(r"^(/[A-Za-z0-9._~\-]*)+$").map_err(|_| invalid())?;
    if re.is_match(path) {
        Ok(())
    } else {
        Err(invalid())
    }
}
