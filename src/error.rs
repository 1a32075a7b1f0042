//! Typed errors: fatal configuration errors and request-time errors.

use thiserror::Error;

/// Malformed or illegal metadata found while scanning, registering or wiring.
/// Aborts startup.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("record {record} has no identifier field")]
    MissingIdentifier { record: String },
    #[error("record {record} declares more than one identifier field ({fields})")]
    MultipleIdentifiers { record: String, fields: String },
    #[error("identifier field {field} of record {record} must be of type Long, found {found}")]
    IdentifierType {
        record: String,
        field: String,
        found: String,
    },
    #[error("record {record} referenced by gateway {gateway} has no defined table")]
    UnknownRecord { gateway: String, record: String },
    #[error("table for record {0} is already defined")]
    DuplicateTable(String),
    #[error("gateway {gateway} duplicates the gateway already registered for record {record}")]
    DuplicateGateway { gateway: String, record: String },
    #[error("gateway {gateway} does not implement the canonical operation {operation}")]
    GatewayShape { gateway: String, operation: String },
    #[error("cannot resolve {entry} as a {role}")]
    Unresolvable { entry: String, role: &'static str },
    #[error("type {0} is registered more than once")]
    DuplicateType(String),
    #[error("illegal dependency in {component} field {field} on {target}: {reason}")]
    IllegalDependency {
        component: String,
        field: String,
        target: String,
        reason: &'static str,
    },
    #[error("unresolved dependency in {component} field {field}: no component of type {target}")]
    UnresolvedDependency {
        component: String,
        field: String,
        target: String,
    },
    #[error("dependency {component}.{field} is already wired")]
    AlreadyWired { component: String, field: String },
    #[error("route {verb} {path} is already registered")]
    DuplicateRoute { verb: String, path: String },
    #[error("{verb} method {method} in {group} must return a response envelope")]
    InvalidHandlerReturn {
        verb: String,
        group: String,
        method: String,
    },
    #[error("invalid path '{path}' in {group}")]
    InvalidPath { group: String, path: String },
}

/// Errors caught at the router boundary and rendered as an error envelope.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AppError {
    #[error("route not found: {verb} {path}")]
    RouteNotFound { verb: String, path: String },
    #[error("unsupported parameter shape for {verb} {path}: {detail}")]
    UnsupportedParameterShape {
        verb: String,
        path: String,
        detail: String,
    },
    #[error("field mapping mismatch for {record}: {detail}")]
    FieldMapping { record: String, detail: String },
    #[error("cannot convert '{value}' for field {field} to {target}")]
    Conversion {
        field: String,
        value: String,
        target: String,
    },
    #[error("not found: {0}")]
    NotFound(String),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("handler failed: {0}")]
    Handler(String),
    #[error("store lock poisoned")]
    LockPoisoned,
}

impl AppError {
    /// Stable machine-readable code for the error body.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::RouteNotFound { .. } => "route_not_found",
            AppError::UnsupportedParameterShape { .. } => "unsupported_parameter_shape",
            AppError::FieldMapping { .. } => "field_mapping",
            AppError::Conversion { .. } => "conversion_error",
            AppError::NotFound(_) => "not_found",
            AppError::BadRequest(_) => "bad_request",
            AppError::Handler(_) => "handler_error",
            AppError::LockPoisoned => "internal_error",
        }
    }
}
