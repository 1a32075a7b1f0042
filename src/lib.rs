//! Component SDK: a minimal application container with an in-memory entity
//! store, dependency wiring between declared components, and a verb/path
//! request router served over axum.

pub mod case;
pub mod config;
pub mod container;
pub mod error;
pub mod gateway;
pub mod handlers;
pub mod record;
pub mod registry;
pub mod response;
pub mod router;
pub mod routes;
pub mod state;
pub mod store;

pub use config::Settings;
pub use container::{Component, Container, Dependency, Inject};
pub use error::{AppError, ConfigError};
pub use gateway::Gateway;
pub use record::{FieldType, FieldValue, Record, RecordType};
pub use registry::{Registry, Scanner, Tag, TypeEntry};
pub use response::{error_body, Envelope};
pub use router::{Body, HandlerGroup, Id, Request, RequestRouter, Route, Verb};
pub use routes::{app_routes, common_routes};
pub use state::AppState;
pub use store::{EntityStore, Instance};
