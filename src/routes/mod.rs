//! axum router assembly.

pub mod common;

pub use common::common_routes;

use crate::handlers::dispatch;
use crate::state::AppState;
use axum::{extract::DefaultBodyLimit, Router};
use tower::ServiceBuilder;
use tower_http::limit::RequestBodyLimitLayer;

/// Health and version routes, with every other request falling back to the
/// request router. Bodies above `body_limit` bytes are rejected with 413.
pub fn app_routes(state: AppState, body_limit: usize) -> Router {
    Router::new()
        .merge(common_routes())
        .fallback(dispatch)
        .layer(
            ServiceBuilder::new()
                .layer(DefaultBodyLimit::disable())
                .layer(RequestBodyLimitLayer::new(body_limit)),
        )
        .with_state(state)
}
