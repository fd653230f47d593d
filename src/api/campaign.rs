//! Campaign API endpoints.

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::Serialize;

use super::ApiResult;
use crate::campaign::CampaignUpdate;
use crate::errors::AppError;
use crate::models::{CampaignChanges, CampaignRecord, UpdateCampaignRequest};
use crate::AppState;

/// Campaign record with its provenance inlined; the seed default has no `_source`.
#[derive(Debug, Serialize)]
pub struct CampaignResponse {
    #[serde(flatten)]
    pub record: CampaignRecord,
    #[serde(rename = "_source", skip_serializing_if = "Option::is_none")]
    pub source: Option<&'static str>,
}

/// GET /api/campaign - Get the campaign record.
pub async fn get_campaign(State(state): State<AppState>) -> Result<Json<CampaignResponse>, AppError> {
    let resolved = state.campaign.read().await?;

    Ok(Json(CampaignResponse {
        record: resolved.value,
        source: resolved.source.tag(),
    }))
}

/// POST /api/campaign - Adjust the counted total, goal or title. Admin only.
pub async fn update_campaign(
    State(state): State<AppState>,
    payload: Result<Json<UpdateCampaignRequest>, JsonRejection>,
) -> ApiResult<CampaignChanges> {
    let Json(request) = payload?;
    state.gate.require(request.admin_password.as_deref())?;

    let resolved = state.campaign.write(&CampaignUpdate::from(&request)).await?;
    Ok(resolved.into())
}
