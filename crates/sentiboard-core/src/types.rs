use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sentiment label assigned to a single item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

impl Sentiment {
    pub const ALL: [Sentiment; 3] = [Sentiment::Positive, Sentiment::Negative, Sentiment::Neutral];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Negative => "negative",
            Sentiment::Neutral => "neutral",
        }
    }
}

impl std::fmt::Display for Sentiment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Origin fetcher of an item.
///
/// Serializes as `"Twitter"` / `"Reddit"`, the display form the dashboard
/// page renders directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Source {
    Twitter,
    Reddit,
}

impl Source {
    pub const ALL: [Source; 2] = [Source::Twitter, Source::Reddit];

    /// Lowercase key used in counters and log fields.
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Source::Twitter => "twitter",
            Source::Reddit => "reddit",
        }
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// Unclassified item as returned by a source fetcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawItem {
    pub text: String,
    /// When the source produced the content, not when it was collected.
    pub created_at: DateTime<Utc>,
    pub url: Option<String>,
}

/// A classified item as stored in the recent-items buffer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub text: String,
    pub source: Source,
    pub timestamp: DateTime<Utc>,
    pub sentiment: Sentiment,
    pub url: Option<String>,
}

impl Item {
    #[must_use]
    pub fn from_raw(raw: RawItem, source: Source, sentiment: Sentiment) -> Self {
        Self {
            text: raw.text,
            source,
            timestamp: raw.created_at,
            sentiment,
            url: raw.url,
        }
    }
}
