pub mod docs;
pub mod health;
pub mod jobs;

use axum::{routing::get, Router};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::config::{AppMode, Config};
use crate::middleware::cors::cors_layer;
use crate::AppState;

/// Full application router: versioned job search, health and, outside release mode, the
/// OpenAPI document.
pub fn router(state: AppState, config: &Config) -> Router {
    let jobs_api = Router::new()
        .route("/api/v1/jobs", get(jobs::search_jobs))
        .route("/api/v1/jobs/count", get(jobs::search_jobs_count));

    let mut app = Router::new()
        .route("/health", get(health::health))
        .merge(jobs_api);

    if config.mode != AppMode::Release {
        app = app.route("/api-docs/openapi.json", get(docs::openapi_json));
    }

    tracing::debug!(component = "router", mode = ?config.mode, "routes registered");

    app.with_state(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(cors_layer(&config.cors_allowed_origins)),
    )
}
