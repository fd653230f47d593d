//! Message API endpoints.

use axum::{extract::rejection::JsonRejection, extract::State, Json};

use super::ApiResult;
use crate::models::{CreateMessageRequest, MessageRecord};
use crate::AppState;

/// GET /api/messages - List messages, newest first.
pub async fn list_messages(State(state): State<AppState>) -> ApiResult<Vec<MessageRecord>> {
    Ok(state.messages.list().await?.into())
}

/// POST /api/messages - Leave a message.
pub async fn create_message(
    State(state): State<AppState>,
    payload: Result<Json<CreateMessageRequest>, JsonRejection>,
) -> ApiResult<MessageRecord> {
    let Json(request) = payload?;
    Ok(state.messages.create(&request).await?.into())
}
