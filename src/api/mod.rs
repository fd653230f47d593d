//! REST API module.
//!
//! Contains all API routes and handlers consumed by the presentation layer.

mod admin;
mod campaign;
mod map;
mod messages;

pub use admin::*;
pub use campaign::*;
pub use map::*;
pub use messages::*;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::errors::AppError;
use crate::models::Resolved;

/// Success response envelope, tagged with the store that answered.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: T,
    #[serde(rename = "_source", skip_serializing_if = "Option::is_none")]
    pub source: Option<&'static str>,
}

impl<T: Serialize> From<Resolved<T>> for ApiResponse<T> {
    fn from(resolved: Resolved<T>) -> Self {
        Self {
            success: true,
            data: resolved.value,
            source: resolved.source.tag(),
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// Response type that can be either success or error.
pub type ApiResult<T> = Result<ApiResponse<T>, AppError>;

/// Fallback for a known path hit with the wrong verb.
pub async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}
