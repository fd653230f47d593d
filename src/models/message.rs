//! Encouragement messages left by visitors.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored message. Append-only; the name is whatever the visitor typed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageRecord {
    pub name: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// Request body for `POST /api/messages`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateMessageRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}
