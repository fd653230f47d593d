//! Map link resolver.
//!
//! Follows a shared map link to its final URL and turns it into an
//! embeddable map plus a directions link. Never fails: anything that goes
//! wrong degrades to the default location.

mod extract;

pub use extract::*;

use std::time::Duration;

use reqwest::redirect::Policy;

use crate::models::ResolvedMapLink;

const MAX_REDIRECTS: usize = 10;

pub struct MapResolver {
    client: reqwest::Client,
    default_location: String,
}

impl MapResolver {
    pub fn new(timeout: Duration, default_location: impl Into<String>) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(Policy::limited(MAX_REDIRECTS))
            .build()?;

        Ok(Self {
            client,
            default_location: default_location.into(),
        })
    }

    /// Links for the configured default location.
    pub fn default_link(&self, final_url: String) -> ResolvedMapLink {
        MapTarget::Query(self.default_location.clone()).into_link(final_url)
    }

    /// Resolve a shared link. A missing input or a failed fetch yields the
    /// default location; a failed fetch keeps the input as `final_url`.
    pub async fn resolve(&self, url: Option<&str>) -> ResolvedMapLink {
        let Some(url) = url.filter(|u| !u.is_empty()) else {
            return self.default_link(String::new());
        };

        match self.follow(url).await {
            Ok(final_url) => {
                tracing::debug!(%url, %final_url, "Map link resolved");
                link_for(&final_url)
            }
            Err(e) => {
                tracing::warn!(%url, "Map link fetch failed: {}", e);
                self.default_link(url.to_string())
            }
        }
    }

    async fn follow(&self, url: &str) -> Result<String, reqwest::Error> {
        let response = self.client.get(url).send().await?;
        Ok(response.url().to_string())
    }
}
