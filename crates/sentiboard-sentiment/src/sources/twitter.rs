//! Twitter/X source via the v2 recent-search endpoint (bearer token auth).

use std::time::Duration;

use chrono::{DateTime, Utc};
use sentiboard_core::{RawItem, Source};
use serde::Deserialize;

use super::{collect_terms, HttpSettings};
use crate::error::{status_error, SentimentError};

const DEFAULT_API_BASE: &str = "https://api.twitter.com";
const SERVICE: &str = "twitter";
/// The recent-search endpoint rejects `max_results` outside `10..=100`.
const API_MIN_RESULTS: usize = 10;
const API_MAX_RESULTS: usize = 100;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Vec<Tweet>,
}

#[derive(Debug, Deserialize)]
struct Tweet {
    id: String,
    text: String,
    created_at: Option<DateTime<Utc>>,
}

/// Recent-search client for one bearer token.
pub struct TwitterClient {
    client: reqwest::Client,
    api_base: String,
    bearer_token: String,
    inter_request_delay: Duration,
}

impl TwitterClient {
    /// # Errors
    ///
    /// Returns [`SentimentError::Http`] if the HTTP client cannot be constructed.
    pub fn new(bearer_token: &str, settings: &HttpSettings) -> Result<Self, SentimentError> {
        Ok(Self {
            client: settings.build_client()?,
            api_base: DEFAULT_API_BASE.to_string(),
            bearer_token: bearer_token.to_string(),
            inter_request_delay: Duration::from_millis(settings.inter_request_delay_ms),
        })
    }

    /// Point the client at a different API host.
    #[must_use]
    pub fn with_api_base(mut self, api_base: &str) -> Self {
        self.api_base = api_base.trim_end_matches('/').to_string();
        self
    }

    /// Collect up to `max_count` recent tweets across `terms`.
    pub async fn collect(&self, terms: &[String], max_count: usize) -> Vec<RawItem> {
        collect_terms(
            Source::Twitter,
            terms,
            max_count,
            self.inter_request_delay,
            |term, limit| async move { self.search_term(&term, limit).await },
        )
        .await
    }

    async fn search_term(&self, term: &str, limit: usize) -> Result<Vec<RawItem>, SentimentError> {
        let url = format!("{}/2/tweets/search/recent", self.api_base);
        let query = format!("{term} -is:retweet lang:en");
        let max_results = limit.clamp(API_MIN_RESULTS, API_MAX_RESULTS).to_string();

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.bearer_token)
            .query(&[
                ("query", query.as_str()),
                ("max_results", max_results.as_str()),
                ("tweet.fields", "created_at"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(status_error(SERVICE, response.status(), &url));
        }

        let body: SearchResponse = response.json().await?;
        Ok(body.data.into_iter().take(limit).map(to_raw_item).collect())
    }
}

fn to_raw_item(tweet: Tweet) -> RawItem {
    RawItem {
        url: Some(format!("https://twitter.com/twitter/status/{}", tweet.id)),
        created_at: tweet.created_at.unwrap_or_else(Utc::now),
        text: tweet.text,
    }
}
