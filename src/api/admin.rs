//! Admin API endpoints.

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde_json::{json, Value};

use crate::errors::AppError;
use crate::models::ValidateAdminRequest;
use crate::AppState;

/// POST /api/admin/validate - Check the admin password without changing anything.
pub async fn validate_admin(
    State(state): State<AppState>,
    payload: Result<Json<ValidateAdminRequest>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let Json(request) = payload?;

    let password = request
        .admin_password
        .filter(|p| !p.is_empty())
        .ok_or_else(|| AppError::Validation("Missing adminPassword".to_string()))?;
    state.gate.require(Some(password.as_str()))?;

    Ok(Json(json!({ "success": true })))
}
