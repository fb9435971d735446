//! Admin login endpoint.

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::Deserialize;

use jobdesk_core::AppError;

use crate::auth::AuthenticatedUser;
use crate::error::{HttpAppError, ValidatedJson};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    ValidatedJson(body): ValidatedJson<LoginRequest>,
) -> Result<Json<AuthenticatedUser>, HttpAppError> {
    if body.username.trim().is_empty() || body.password.is_empty() {
        return Err(AppError::Validation(
            "Username and password are required".to_string(),
        )
        .into());
    }

    let user = state
        .auth
        .authenticate(body.username.trim(), &body.password)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid username or password".to_string()))?;

    Ok(Json(user))
}
