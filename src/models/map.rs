//! Resolved map link.

use serde::{Deserialize, Serialize};

/// Embeddable and navigation URLs derived from a shared map link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedMapLink {
    pub embed_url: String,
    pub direction_url: String,
    /// URL after following redirects; the input itself when the fetch failed
    pub final_url: String,
}

/// Query string of `GET /api/map/resolve`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResolveMapQuery {
    pub url: Option<String>,
}
