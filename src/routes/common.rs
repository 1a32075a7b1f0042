//! Liveness and build info, served ahead of the dispatch fallback.

use crate::state::AppState;
use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

#[derive(Serialize)]
struct Health {
    status: &'static str,
    routes: usize,
}

#[derive(Serialize)]
struct BuildInfo {
    name: &'static str,
    version: &'static str,
}

/// The router only exists after wiring succeeded, so a live state is a ready one.
async fn health(State(state): State<AppState>) -> Json<Health> {
    Json(Health {
        status: "ok",
        routes: state.router.routes().len(),
    })
}

async fn version() -> Json<BuildInfo> {
    Json(BuildInfo {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// GET /health, GET /version.
pub fn common_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/version", get(version))
}
