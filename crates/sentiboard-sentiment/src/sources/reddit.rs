//! Reddit source (client-credentials OAuth, site-wide search).

use std::time::Duration;

use chrono::{DateTime, Utc};
use sentiboard_core::{RawItem, Source};
use serde::Deserialize;

use super::{collect_terms, HttpSettings};
use crate::error::{status_error, SentimentError};

const DEFAULT_AUTH_BASE: &str = "https://www.reddit.com";
const DEFAULT_API_BASE: &str = "https://oauth.reddit.com";
const SERVICE: &str = "reddit";

/// Reddit OAuth token response.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Reddit search listing wrapper.
#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    children: Vec<Post>,
}

#[derive(Debug, Deserialize)]
struct Post {
    data: PostData,
}

#[derive(Debug, Deserialize)]
struct PostData {
    title: Option<String>,
    permalink: Option<String>,
    created_utc: Option<f64>,
}

/// Script-app credentials for the client-credentials grant.
#[derive(Debug, Clone)]
pub struct RedditCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub user_agent: String,
}

/// Reddit API client. A fresh access token is exchanged for every collection run.
pub struct RedditClient {
    client: reqwest::Client,
    credentials: RedditCredentials,
    auth_base: String,
    api_base: String,
    inter_request_delay: Duration,
}

impl RedditClient {
    /// # Errors
    ///
    /// Returns [`SentimentError::Http`] if the HTTP client cannot be constructed.
    pub fn new(credentials: RedditCredentials, settings: &HttpSettings) -> Result<Self, SentimentError> {
        Ok(Self {
            client: settings.build_client()?,
            credentials,
            auth_base: DEFAULT_AUTH_BASE.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            inter_request_delay: Duration::from_millis(settings.inter_request_delay_ms),
        })
    }

    /// Point token exchange and search at different hosts.
    #[must_use]
    pub fn with_base_urls(mut self, auth_base: &str, api_base: &str) -> Self {
        self.auth_base = auth_base.trim_end_matches('/').to_string();
        self.api_base = api_base.trim_end_matches('/').to_string();
        self
    }

    /// Collect up to `max_count` of the day's newest posts across `terms`.
    pub async fn collect(&self, terms: &[String], max_count: usize) -> Vec<RawItem> {
        if terms.is_empty() || max_count == 0 {
            return Vec::new();
        }

        let token = match self.fetch_token().await {
            Ok(token) => token,
            Err(e) => {
                tracing::error!(source = %Source::Reddit, error = %e, "Reddit token exchange failed");
                return Vec::new();
            }
        };
        let token = token.as_str();

        collect_terms(
            Source::Reddit,
            terms,
            max_count,
            self.inter_request_delay,
            |term, limit| async move { self.search_term(token, &term, limit).await },
        )
        .await
    }

    async fn fetch_token(&self) -> Result<String, SentimentError> {
        let url = format!("{}/api/v1/access_token", self.auth_base);
        let response = self
            .client
            .post(&url)
            .header("User-Agent", &self.credentials.user_agent)
            .basic_auth(
                &self.credentials.client_id,
                Some(&self.credentials.client_secret),
            )
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(status_error(SERVICE, response.status(), &url));
        }

        let token_resp: TokenResponse = response
            .json()
            .await
            .map_err(|e| SentimentError::Reddit(format!("token parse error: {e}")))?;

        Ok(token_resp.access_token)
    }

    async fn search_term(
        &self,
        token: &str,
        term: &str,
        limit: usize,
    ) -> Result<Vec<RawItem>, SentimentError> {
        let url = format!("{}/r/all/search", self.api_base);
        let limit_param = limit.to_string();

        let response = self
            .client
            .get(&url)
            .bearer_auth(token)
            .header("User-Agent", &self.credentials.user_agent)
            .query(&[
                ("q", term),
                ("sort", "new"),
                ("t", "day"),
                ("limit", limit_param.as_str()),
                ("type", "link"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(status_error(SERVICE, response.status(), &url));
        }

        let listing: Listing = response
            .json()
            .await
            .map_err(|e| SentimentError::Reddit(format!("Reddit response parse error: {e}")))?;

        Ok(listing
            .data
            .children
            .into_iter()
            .filter_map(to_raw_item)
            .take(limit)
            .collect())
    }
}

fn to_raw_item(post: Post) -> Option<RawItem> {
    let title = post.data.title.as_deref().map(str::trim).filter(|t| !t.is_empty())?;
    #[allow(clippy::cast_possible_truncation)]
    let created_at = post
        .data
        .created_utc
        .and_then(|secs| DateTime::from_timestamp(secs as i64, 0))
        .unwrap_or_else(Utc::now);

    Some(RawItem {
        text: title.to_string(),
        created_at,
        url: post
            .data
            .permalink
            .map(|permalink| format!("https://www.reddit.com{permalink}")),
    })
}
