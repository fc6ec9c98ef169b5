use thiserror::Error;

#[derive(Debug, Error)]
pub enum SentimentError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{service} rate limit exceeded")]
    RateLimited { service: &'static str },

    #[error("{service} rejected the configured credentials")]
    Unauthorized { service: &'static str },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("sentiment model error: {0}")]
    Model(String),

    #[error("Reddit API error: {0}")]
    Reddit(String),
}

impl SentimentError {
    /// Errors after which further requests to the same service are pointless
    /// for the rest of the collection run.
    #[must_use]
    pub fn is_fatal_for_run(&self) -> bool {
        matches!(
            self,
            SentimentError::RateLimited { .. } | SentimentError::Unauthorized { .. }
        )
    }
}

/// Map a non-success response status to a typed error.
pub(crate) fn status_error(
    service: &'static str,
    status: reqwest::StatusCode,
    url: &str,
) -> SentimentError {
    match status.as_u16() {
        429 => SentimentError::RateLimited { service },
        401 | 403 => SentimentError::Unauthorized { service },
        code => SentimentError::UnexpectedStatus {
            status: code,
            url: url.to_string(),
        },
    }
}
