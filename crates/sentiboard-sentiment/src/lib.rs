//! Sentiment classification and source collection for sentiboard.
//!
//! Fetches recent posts from Twitter/X and Reddit, normalizes their text, and
//! labels each one positive, negative or neutral using either a hosted
//! classification model or a word-list heuristic.

pub mod classifier;
pub mod error;
pub mod model;
pub mod normalize;
pub mod scorer;
pub mod sources;

pub use classifier::Classifier;
pub use error::SentimentError;
pub use model::ModelClient;
pub use normalize::clean_text;
pub use scorer::{lexicon_counts, lexicon_sentiment, LexiconCounts};
pub use sources::{
    per_term_budget, HttpSettings, RedditClient, RedditCredentials, SourceFetcher, TwitterClient,
};
