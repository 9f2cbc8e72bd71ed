//! Timeline source: fetches posts newer than the cursor.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

use super::oauth::{Nonce, OAuthCredentials};
use crate::error::FetchError;

/// Default timeline endpoint (posts by the user and the accounts they follow).
pub const DEFAULT_TIMELINE_URL: &str = "https://api.twitter.com/1.1/statuses/home_timeline.json";

/// Largest page the timeline endpoints return.
pub const MAX_PAGE_SIZE: u32 = 200;

/// Parameters of one timeline request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelineQuery {
    /// Only return posts newer than this ID. Omitted on the first run.
    pub since_id: Option<String>,
    /// Number of posts to request.
    pub count: u32,
    /// Request untruncated bodies (`tweet_mode=extended`).
    pub extended_text: bool,
}

impl TimelineQuery {
    /// Query for everything after `cursor`, at the maximum page size.
    #[must_use]
    pub fn since(cursor: Option<String>) -> Self {
        Self {
            since_id: cursor.filter(|id| !id.is_empty()),
            count: MAX_PAGE_SIZE,
            extended_text: true,
        }
    }

    /// Query-string pairs in request order.
    #[must_use]
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("count", self.count.to_string())];
        if self.extended_text {
            params.push(("tweet_mode", "extended".to_string()));
        }
        if let Some(since_id) = &self.since_id {
            params.push(("since_id", since_id.clone()));
        }
        params
    }
}

/// Anything that can return a raw timeline response.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TimelineSource: Send + Sync {
    /// Fetch the decoded response body for the query.
    ///
    /// A well-formed answer is an array of post records, newest first. The
    /// body is returned whatever its shape; checking it is the digest
    /// builder's job.
    async fn fetch_timeline(&self, query: &TimelineQuery) -> Result<Value, FetchError>;
}

/// OAuth-signed client for the Twitter v1.1 timeline API.
pub struct TwitterClient {
    client: Client,
    timeline_url: String,
    credentials: OAuthCredentials,
}

impl TwitterClient {
    /// Create a new client for the given endpoint.
    pub fn new(
        timeline_url: impl Into<String>,
        credentials: OAuthCredentials,
    ) -> Result<Self, FetchError> {
        let client = Client::builder().timeout(Duration::from_secs(60)).build()?;

        Ok(Self {
            client,
            timeline_url: timeline_url.into(),
            credentials,
        })
    }
}

#[async_trait]
impl TimelineSource for TwitterClient {
    async fn fetch_timeline(&self, query: &TimelineQuery) -> Result<Value, FetchError> {
        let params = query.to_params();
        let authorization = self.credentials.authorization_header(
            "GET",
            &self.timeline_url,
            &params,
            &Nonce::generate(),
        );

        tracing::debug!(
            url = %self.timeline_url,
            since_id = ?query.since_id,
            count = query.count,
            "Requesting timeline"
        );

        let response = self
            .client
            .get(&self.timeline_url)
            .header(reqwest::header::AUTHORIZATION, authorization)
            .query(&params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".into());
            tracing::error!(status = status.as_u16(), body = %body, "Timeline request rejected");
            return Err(FetchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        let timeline: Value = serde_json::from_str(&body)?;

        match timeline.as_array() {
            Some(posts) => tracing::info!(count = posts.len(), "Fetched timeline"),
            None => tracing::warn!("Timeline response is not a list of posts"),
        }
        Ok(timeline)
    }
}
