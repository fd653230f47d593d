//! Backing stores for campaign and message records.
//!
//! Each store is a provider with a uniform try-read / try-write surface and a
//! provenance tag. Resolvers walk an ordered list of providers; the stores
//! themselves know nothing about fallback.

mod local;
mod supabase;

pub use local::*;
pub use supabase::*;

use async_trait::async_trait;

use crate::models::{CampaignRecord, MessageRecord, Source};

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("remote store request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("remote store returned {status}: {message}")]
    Remote { status: u16, message: String },
    #[error("local store I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("stored JSON is invalid: {0}")]
    Json(#[from] serde_json::Error),
}

/// Provider of the singleton campaign record.
#[async_trait]
pub trait CampaignStore: Send + Sync {
    fn source(&self) -> Source;

    /// Fetch the stored record. `Ok(None)` means the store answered but holds no row.
    async fn fetch(&self) -> Result<Option<CampaignRecord>, StoreError>;

    /// Insert or replace the singleton record.
    async fn upsert(&self, record: &CampaignRecord) -> Result<(), StoreError>;
}

/// Provider of the append-only message list.
#[async_trait]
pub trait MessageStore: Send + Sync {
    fn source(&self) -> Source;

    /// All messages, newest first.
    async fn list(&self) -> Result<Vec<MessageRecord>, StoreError>;

    async fn append(&self, message: &MessageRecord) -> Result<MessageRecord, StoreError>;
}
