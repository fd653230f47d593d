//! Local JSON fallback store.
//!
//! One file per record type under the data directory. Writes are plain
//! overwrites with no locking; concurrent writers race and the last one wins.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};

use super::{CampaignStore, MessageStore, StoreError};
use crate::models::{CampaignRecord, MessageRecord, Source};

const CAMPAIGN_FILE: &str = "campaign.json";
const MESSAGES_FILE: &str = "messages.json";

#[derive(Debug, Clone)]
pub struct LocalStore {
    dir: PathBuf,
}

impl LocalStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn campaign_path(&self) -> PathBuf {
        self.dir.join(CAMPAIGN_FILE)
    }

    pub fn messages_path(&self) -> PathBuf {
        self.dir.join(MESSAGES_FILE)
    }

    async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StoreError> {
        match tokio::fs::read(path).await {
            Ok(raw) => Ok(Some(serde_json::from_slice(&raw)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_json<T: Serialize + ?Sized>(&self, path: &Path, value: &T) -> Result<(), StoreError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let raw = serde_json::to_vec_pretty(value)?;
        tokio::fs::write(path, raw).await?;
        Ok(())
    }
}

#[async_trait]
impl CampaignStore for LocalStore {
    fn source(&self) -> Source {
        Source::Local
    }

    async fn fetch(&self) -> Result<Option<CampaignRecord>, StoreError> {
        Self::read_json(&self.campaign_path()).await
    }

    async fn upsert(&self, record: &CampaignRecord) -> Result<(), StoreError> {
        self.write_json(&self.campaign_path(), record).await
    }
}

#[async_trait]
impl MessageStore for LocalStore {
    fn source(&self) -> Source {
        Source::Local
    }

    async fn list(&self) -> Result<Vec<MessageRecord>, StoreError> {
        let mut messages: Vec<MessageRecord> = Self::read_json(&self.messages_path())
            .await?
            .unwrap_or_default();
        messages.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(messages)
    }

    async fn append(&self, message: &MessageRecord) -> Result<MessageRecord, StoreError> {
        let path = self.messages_path();
        let mut messages: Vec<MessageRecord> = Self::read_json(&path).await?.unwrap_or_default();
        messages.push(message.clone());
        self.write_json(&path, &messages).await?;
        Ok(message.clone())
    }
}
