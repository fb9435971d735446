//! Job approval endpoint.

use std::sync::Arc;

use axum::{extract::State, Json};
use serde_json::{json, Map, Value};

use crate::error::{HttpAppError, ValidatedJson};
use crate::state::AppState;
use crate::workflows;

/// PUT /api/jobs/approval
pub async fn update_approval(
    State(state): State<Arc<AppState>>,
    ValidatedJson(body): ValidatedJson<Map<String, Value>>,
) -> Result<Json<Value>, HttpAppError> {
    let message = workflows::update_job_approval(&state, &body).await?;
    Ok(Json(json!({ "message": message })))
}
