//! Route configuration

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use jobdesk_core::Config;

use crate::handlers;
use crate::state::AppState;

// Multipart submissions carry up to five attachments of a few megabytes.
const MAX_REQUEST_BODY_BYTES: usize = 50 * 1024 * 1024;
const REQUEST_TIMEOUT_SECS: u64 = 120;

/// Assemble the router with all endpoints and middleware layers.
pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Router {
    let cors = if config.is_production() {
        CorsLayer::new()
    } else {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    };

    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route(
            "/api/applications",
            post(handlers::applications::submit_application),
        )
        .route(
            "/api/applications/status",
            put(handlers::applications::update_status),
        )
        .route("/api/jobs/approval", put(handlers::jobs::update_approval))
        .route("/api/auth/login", post(handlers::login::login))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(MAX_REQUEST_BODY_BYTES))
        .layer(TimeoutLayer::new(Duration::from_secs(REQUEST_TIMEOUT_SECS)))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
