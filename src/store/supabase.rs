//! Hosted PostgREST store.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use super::{CampaignStore, MessageStore, StoreError};
use crate::models::{CampaignRecord, MessageRecord, Source, CAMPAIGN_ID};

const CAMPAIGN_TABLE: &str = "campaign";
const MESSAGES_TABLE: &str = "messages";

#[derive(Deserialize)]
struct PostgrestError {
    message: Option<String>,
}

/// Thin client over the `/rest/v1` tables, bound to a single API key.
#[derive(Clone)]
pub struct SupabaseStore {
    client: reqwest::Client,
    rest_url: String,
    api_key: String,
}

impl SupabaseStore {
    pub fn with_client(client: reqwest::Client, base_url: &str, api_key: &str) -> Self {
        SupabaseStore {
            client,
            rest_url: format!("{}/rest/v1", base_url.trim_end_matches('/')),
            api_key: api_key.to_string(),
        }
    }

    fn request(&self, method: reqwest::Method, table: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, format!("{}/{}", self.rest_url, table))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &[(&str, &str)],
    ) -> Result<Vec<T>, StoreError> {
        let response = self
            .request(reqwest::Method::GET, table)
            .query(query)
            .send()
            .await?;
        Ok(check(response).await?.json().await?)
    }

    async fn write<T: Serialize + ?Sized>(
        &self,
        table: &str,
        prefer: &str,
        body: &T,
    ) -> Result<reqwest::Response, StoreError> {
        let response = self
            .request(reqwest::Method::POST, table)
            .header("Prefer", prefer)
            .json(body)
            .send()
            .await?;
        check(response).await
    }
}

/// Turn a non-2xx answer into `StoreError::Remote`, keeping PostgREST's message.
async fn check(response: reqwest::Response) -> Result<reqwest::Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<PostgrestError>(&body)
        .ok()
        .and_then(|e| e.message)
        .unwrap_or_else(|| {
            if body.is_empty() {
                status
                    .canonical_reason()
                    .unwrap_or("unknown error")
                    .to_string()
            } else {
                body
            }
        });

    Err(StoreError::Remote {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl CampaignStore for SupabaseStore {
    fn source(&self) -> Source {
        Source::Supabase
    }

    async fn fetch(&self) -> Result<Option<CampaignRecord>, StoreError> {
        let filter = format!("eq.{CAMPAIGN_ID}");
        let rows: Vec<CampaignRecord> = self
            .select(
                CAMPAIGN_TABLE,
                &[("select", "*"), ("id", filter.as_str()), ("limit", "1")],
            )
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn upsert(&self, record: &CampaignRecord) -> Result<(), StoreError> {
        self.write(
            CAMPAIGN_TABLE,
            "resolution=merge-duplicates,return=minimal",
            record,
        )
        .await?;
        Ok(())
    }
}

#[async_trait]
impl MessageStore for SupabaseStore {
    fn source(&self) -> Source {
        Source::Supabase
    }

    async fn list(&self) -> Result<Vec<MessageRecord>, StoreError> {
        self.select(
            MESSAGES_TABLE,
            &[
                ("select", "name,message,created_at"),
                ("order", "created_at.desc"),
            ],
        )
        .await
    }

    async fn append(&self, message: &MessageRecord) -> Result<MessageRecord, StoreError> {
        let response = self
            .write(MESSAGES_TABLE, "return=representation", &[message])
            .await?;

        // Some deployments answer 201 with an empty body despite the Prefer header.
        if response.status() == StatusCode::NO_CONTENT {
            return Ok(message.clone());
        }
        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(message.clone());
        }
        let rows: Vec<MessageRecord> = serde_json::from_str(&text)?;
        Ok(rows.into_iter().next().unwrap_or_else(|| message.clone()))
    }
}
