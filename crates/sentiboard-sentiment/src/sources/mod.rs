//! Source fetchers.
//!
//! Each fetcher turns a list of search terms into raw items. Collection never
//! fails: transport errors, rate limits and rejected credentials are logged and
//! whatever was gathered so far is returned.

mod reddit;
mod twitter;

pub use reddit::{RedditClient, RedditCredentials};
pub use twitter::TwitterClient;

use std::future::Future;
use std::time::Duration;

use sentiboard_core::{RawItem, Source};

use crate::error::SentimentError;

/// HTTP behaviour shared by the fetchers.
#[derive(Debug, Clone)]
pub struct HttpSettings {
    pub timeout_secs: u64,
    pub user_agent: String,
    pub inter_request_delay_ms: u64,
}

impl HttpSettings {
    pub(crate) fn build_client(&self) -> Result<reqwest::Client, SentimentError> {
        Ok(reqwest::Client::builder()
            .timeout(Duration::from_secs(self.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(&self.user_agent)
            .build()?)
    }
}

/// One of the two known sources, or a placeholder when credentials are absent.
pub enum SourceFetcher {
    Twitter(TwitterClient),
    Reddit(RedditClient),
    Disabled(Source),
}

impl SourceFetcher {
    #[must_use]
    pub fn source(&self) -> Source {
        match self {
            Self::Twitter(_) => Source::Twitter,
            Self::Reddit(_) => Source::Reddit,
            Self::Disabled(source) => *source,
        }
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        !matches!(self, Self::Disabled(_))
    }

    /// Collect up to `max_count` items across `terms`.
    pub async fn collect(&self, terms: &[String], max_count: usize) -> Vec<RawItem> {
        match self {
            Self::Twitter(client) => client.collect(terms, max_count).await,
            Self::Reddit(client) => client.collect(terms, max_count).await,
            Self::Disabled(source) => {
                tracing::debug!(source = %source, "source disabled, returning no items");
                Vec::new()
            }
        }
    }
}

/// Items requested per term: an even share of `max_count`, at least one.
#[must_use]
pub fn per_term_budget(max_count: usize, term_count: usize) -> usize {
    if term_count == 0 {
        return 0;
    }
    (max_count / term_count).max(1)
}

/// Run `fetch_term` for each term until `max_count` items are gathered.
///
/// Errors that make further requests pointless stop the run; other errors skip
/// the term. Sleeps `delay` before each further term that is still needed.
pub(crate) async fn collect_terms<F, Fut>(
    source: Source,
    terms: &[String],
    max_count: usize,
    delay: Duration,
    mut fetch_term: F,
) -> Vec<RawItem>
where
    F: FnMut(String, usize) -> Fut,
    Fut: Future<Output = Result<Vec<RawItem>, SentimentError>>,
{
    let mut results: Vec<RawItem> = Vec::new();
    let budget = per_term_budget(max_count, terms.len());

    for (index, term) in terms.iter().enumerate() {
        if results.len() >= max_count {
            break;
        }
        let limit = budget.min(max_count - results.len());
        tracing::info!(source = %source, term = term.as_str(), limit, "collecting items for term");

        match fetch_term(term.clone(), limit).await {
            Ok(mut items) => {
                items.truncate(limit);
                results.extend(items);
            }
            Err(e) if e.is_fatal_for_run() => {
                tracing::error!(source = %source, term = term.as_str(), error = %e, "stopping collection");
                break;
            }
            Err(e) => {
                tracing::warn!(source = %source, term = term.as_str(), error = %e, "term search failed");
            }
        }

        let more_wanted = index + 1 < terms.len() && results.len() < max_count;
        if more_wanted && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    tracing::info!(source = %source, count = results.len(), "collection complete");
    results
}
