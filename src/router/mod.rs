//! Request router: maps (verb, path) to a handler-group method, binds its
//! arguments from the query string and body, invokes it and renders the reply.

mod handler;
mod request;
mod table;

pub use handler::{Arg, Body, Handler, Id, IntoReply, MethodDescriptor, Param, ParamShape, ReturnShape};
pub use request::{split_target, Request, Verb};
pub(crate) use table::ErasedRoute;
pub use table::{HandlerGroup, Route, RouteEntry, RouteTable};

use crate::error::AppError;
use crate::record::FieldType;
use crate::response::Envelope;
use crate::store::EntityStore;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::Instrument as _;
use uuid::Uuid;

pub struct RequestRouter {
    table: RouteTable,
    store: Arc<EntityStore>,
}

impl RequestRouter {
    pub fn new(table: RouteTable, store: Arc<EntityStore>) -> Self {
        RequestRouter { table, store }
    }

    pub fn routes(&self) -> &RouteTable {
        &self.table
    }

    /// Handle one request. Never fails: every error becomes an error envelope.
    pub fn dispatch(&self, request: &Request) -> Envelope {
        let span = tracing::info_span!(
            "dispatch",
            request_id = %Uuid::new_v4(),
            verb = %request.verb,
            path = %request.path,
        );
        let _entered = span.enter();
        match self.try_dispatch(request) {
            Ok(envelope) => {
                tracing::debug!(success = envelope.is_success(), "request handled");
                envelope
            }
            Err(err) => {
                tracing::warn!(code = err.code(), error = %err, "request failed");
                Envelope::from(err)
            }
        }
    }

    /// Async wrapper that runs `dispatch` on the blocking pool.
    pub async fn dispatch_blocking(self: Arc<Self>, request: Request) -> Envelope {
        let span = tracing::Span::current();
        let joined = tokio::task::spawn_blocking(move || {
            let _entered = span.enter();
            self.dispatch(&request)
        })
        .in_current_span()
        .await;
        match joined {
            Ok(envelope) => envelope,
            Err(err) => Envelope::from(AppError::Handler(err.to_string())),
        }
    }

    pub fn try_dispatch(&self, request: &Request) -> Result<Envelope, AppError> {
        let path = request.route_path();
        let entry = self
            .table
            .get(request.verb, path)
            .ok_or_else(|| AppError::RouteNotFound {
                verb: request.verb.to_string(),
                path: path.to_string(),
            })?;

        check_shape(request, &entry.method.params)?;
        let args = self.bind(request, &entry.method.params)?;

        tracing::debug!(group = entry.group, method = entry.method.name, "invoking handler");
        let reply = catch_unwind(AssertUnwindSafe(|| entry.invoke(args)))
            .map_err(|panic| {
                let message = panic_message(panic.as_ref());
                tracing::error!(group = entry.group, method = entry.method.name, %message, "handler panicked");
                AppError::Handler(message)
            })??;
        Ok(reply.unwrap_or(Envelope::Empty))
    }

    fn bind(&self, request: &Request, params: &[ParamShape]) -> Result<Vec<Arg>, AppError> {
        params
            .iter()
            .map(|param| match param {
                ParamShape::Id => {
                    let raw = request.query_value().ok_or_else(|| {
                        AppError::BadRequest(format!("{} requires an id in the query string", request.route_path()))
                    })?;
                    FieldType::Long
                        .parse("id", raw)?
                        .as_long()
                        .map(Arg::Id)
                        .ok_or_else(|| AppError::BadRequest("id is not numeric".into()))
                }
                ParamShape::Record(name) => self
                    .store
                    .create_from_field_map(name, &request.body)
                    .map(Arg::Record),
            })
            .collect()
    }
}

/// Per-verb legal parameter lists.
fn check_shape(request: &Request, params: &[ParamShape]) -> Result<(), AppError> {
    let legal = match (request.verb, params) {
        (Verb::Get, []) | (Verb::Get, [ParamShape::Id]) => true,
        (Verb::Post, [ParamShape::Record(_)]) => true,
        (Verb::Put, [ParamShape::Id, ParamShape::Record(_)]) => true,
        (Verb::Delete, [ParamShape::Id]) => true,
        _ => false,
    };
    if legal {
        return Ok(());
    }
    let expected = match request.verb {
        Verb::Get => "no parameters or a single id",
        Verb::Post => "a single record",
        Verb::Put => "an id followed by a record",
        Verb::Delete => "a single id",
    };
    Err(AppError::UnsupportedParameterShape {
        verb: request.verb.to_string(),
        path: request.route_path().to_string(),
        detail: format!("expected {}, found {:?}", expected, params),
    })
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("handler panicked: {}", s)
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("handler panicked: {}", s)
    } else {
        "handler panicked".to_string()
    }
}
