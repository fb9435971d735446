//! Application submission and status transition endpoints.

use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    Json,
};
use serde_json::{json, Map, Value};

use jobdesk_core::AppError;

use crate::error::{HttpAppError, ValidatedJson};
use crate::state::AppState;
use crate::workflows::{self, SubmissionResponse, TransitionRequest, UploadPart};

/// POST /api/applications — multipart form with a `jsonData` field holding
/// the serialized application payload plus zero or more file parts.
pub async fn submit_application(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<SubmissionResponse>, HttpAppError> {
    let mut json_data: Option<String> = None;
    let mut uploads: Vec<UploadPart> = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidPayload(format!("Malformed multipart body: {}", e)))?
    {
        match field.file_name() {
            Some(file_name) => {
                let file_name = file_name.to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::InvalidPayload(format!("Failed to read file part: {}", e)))?;
                uploads.push(UploadPart {
                    file_name,
                    content_type,
                    data: data.to_vec(),
                });
            }
            None => {
                if field.name() == Some("jsonData") {
                    let text = field.text().await.map_err(|e| {
                        AppError::InvalidPayload(format!("Failed to read jsonData: {}", e))
                    })?;
                    json_data = Some(text);
                }
            }
        }
    }

    let json_data = json_data
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::Validation("JSON data is required.".to_string()))?;
    let payload: Map<String, Value> = serde_json::from_str(&json_data)
        .map_err(|_| AppError::InvalidPayload("Invalid JSON data.".to_string()))?;

    let response = workflows::submit_application(&state, payload, uploads).await?;
    Ok(Json(response))
}

/// PUT /api/applications/status
pub async fn update_status(
    State(state): State<Arc<AppState>>,
    ValidatedJson(body): ValidatedJson<Map<String, Value>>,
) -> Result<Json<Value>, HttpAppError> {
    let request = TransitionRequest::parse(&body)?;
    let message = workflows::update_applicant_status(&state, &request).await?;
    Ok(Json(json!({ "message": message })))
}
