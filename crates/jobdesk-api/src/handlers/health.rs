//! Health endpoint.

use std::sync::Arc;
use std::time::Duration;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use tokio::fs;

use crate::state::AppState;

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: String,
    database: String,
    storage: String,
}

/// GET /health — database liveness gates overall health; a missing storage
/// root only degrades it, since the share may be mounted per request.
pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    const TIMEOUT: Duration = Duration::from_secs(5);

    let mut response = HealthResponse {
        status: "healthy".to_string(),
        database: "unknown".to_string(),
        storage: "unknown".to_string(),
    };
    let mut overall_healthy = true;

    match tokio::time::timeout(TIMEOUT, sqlx::query("SELECT 1").execute(&state.db_pool)).await {
        Ok(Ok(_)) => {
            response.database = "healthy".to_string();
        }
        Ok(Err(e)) => {
            tracing::error!(error = %e, "Database health check failed");
            response.database = format!("unhealthy: {}", e);
            overall_healthy = false;
        }
        Err(_) => {
            tracing::error!("Database health check timed out");
            response.database = "timeout".to_string();
            overall_healthy = false;
        }
    }

    if fs::try_exists(state.intake.staging_root())
        .await
        .unwrap_or(false)
    {
        response.storage = "healthy".to_string();
    } else {
        tracing::warn!(
            root = %state.intake.staging_root().display(),
            "Storage root not reachable"
        );
        response.storage = "degraded".to_string();
    }

    let status_code = if overall_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    if !overall_healthy {
        response.status = "unhealthy".to_string();
    }

    (status_code, Json(response))
}
