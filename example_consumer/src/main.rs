//! Example consumer: a separate Rust project that uses component-sdk as a dependency.
//!
//! Run from repo root: `cargo run -p example-consumer`
//! Or from this directory: `cargo run`

mod domain;

use component_sdk::{app_routes, config, AppState};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let settings = config::init("component_sdk=info,example_consumer=info", env!("CARGO_CRATE_NAME"));

    let state = AppState::bootstrap(domain::registry(), &settings.root_namespace)?;

    let app = app_routes(state, settings.body_limit);
    let listener = TcpListener::bind(&settings.bind_addr).await?;
    tracing::info!("Example consumer listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
