//! Map API endpoints.

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};

use crate::models::{ResolveMapQuery, ResolvedMapLink};
use crate::AppState;

/// GET /api/map/resolve?url= - Resolve a shared map link. Always 200.
pub async fn resolve_map(
    State(state): State<AppState>,
    query: Result<Query<ResolveMapQuery>, QueryRejection>,
) -> Json<ResolvedMapLink> {
    let url = query.ok().and_then(|Query(q)| q.url);
    Json(state.maps.resolve(url.as_deref()).await)
}
