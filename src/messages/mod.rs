//! Message board: append-only encouragement messages.

use std::sync::Arc;

use chrono::Utc;

use crate::config::StorageConfig;
use crate::errors::AppError;
use crate::models::{CreateMessageRequest, MessageRecord, Resolved};
use crate::store::{LocalStore, MessageStore, StoreError, SupabaseStore};

pub struct MessageBoard {
    readers: Vec<Arc<dyn MessageStore>>,
    writers: Vec<Arc<dyn MessageStore>>,
}

impl MessageBoard {
    pub fn new(readers: Vec<Arc<dyn MessageStore>>, writers: Vec<Arc<dyn MessageStore>>) -> Self {
        Self { readers, writers }
    }

    pub fn from_config(storage: &StorageConfig, client: &reqwest::Client) -> Self {
        let local: Arc<dyn MessageStore> = Arc::new(LocalStore::new(&storage.data_dir));

        let mut readers: Vec<Arc<dyn MessageStore>> = Vec::new();
        if let Some((url, key)) = storage.remote_read() {
            readers.push(Arc::new(SupabaseStore::with_client(client.clone(), url, key)));
        }
        readers.push(local.clone());

        let mut writers: Vec<Arc<dyn MessageStore>> = Vec::new();
        if let Some((url, key)) = storage.remote_write() {
            writers.push(Arc::new(SupabaseStore::with_client(client.clone(), url, key)));
        }
        writers.push(local);

        Self::new(readers, writers)
    }

    /// All messages, newest first, from the first store that answers.
    pub async fn list(&self) -> Result<Resolved<Vec<MessageRecord>>, AppError> {
        let mut failure: Option<StoreError> = None;

        for store in &self.readers {
            match store.list().await {
                Ok(messages) => return Ok(Resolved::new(messages, store.source())),
                Err(e) => {
                    tracing::warn!(source = ?store.source(), "Message list failed: {}", e);
                    if failure.is_none() {
                        failure = Some(e);
                    }
                }
            }
        }

        Err(unavailable(failure))
    }

    /// Validate and append a message. Both fields are trimmed and must be non-empty.
    pub async fn create(
        &self,
        request: &CreateMessageRequest,
    ) -> Result<Resolved<MessageRecord>, AppError> {
        let name = required(request.name.as_deref(), "name")?;
        let message = required(request.message.as_deref(), "message")?;

        let record = MessageRecord {
            name,
            message,
            created_at: Utc::now(),
        };

        let mut failure: Option<StoreError> = None;
        for store in &self.writers {
            match store.append(&record).await {
                Ok(stored) => {
                    tracing::info!(source = ?store.source(), "Message stored");
                    return Ok(Resolved::new(stored, store.source()));
                }
                Err(e) => {
                    tracing::warn!(source = ?store.source(), "Message append failed: {}", e);
                    if failure.is_none() {
                        failure = Some(e);
                    }
                }
            }
        }

        Err(unavailable(failure))
    }
}

fn required(value: Option<&str>, field: &str) -> Result<String, AppError> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(AppError::Validation(format!("{} is required", field))),
    }
}

fn unavailable(failure: Option<StoreError>) -> AppError {
    failure
        .map(AppError::from)
        .unwrap_or_else(|| AppError::BackendUnavailable("No message store configured".to_string()))
}
