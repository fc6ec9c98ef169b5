//! Sentiment classification with model-to-lexicon fallback.

use sentiboard_core::Sentiment;

use crate::error::SentimentError;
use crate::model::ModelClient;
use crate::normalize::clean_text;
use crate::scorer::lexicon_sentiment;

/// Classification strategy, chosen once at construction.
pub enum Classifier {
    /// Statistical model with lexicon fallback on any model failure.
    Model(ModelClient),
    /// Word-list heuristic only.
    Lexicon,
}

impl Classifier {
    #[must_use]
    pub fn lexicon() -> Self {
        Self::Lexicon
    }

    /// Build a classifier backed by the model server at `model_url`.
    ///
    /// # Errors
    ///
    /// Returns [`SentimentError`] if the model client cannot be constructed.
    pub fn with_model(model_url: &str, timeout_secs: u64) -> Result<Self, SentimentError> {
        Ok(Self::Model(ModelClient::new(model_url, timeout_secs)?))
    }

    #[must_use]
    pub fn strategy_name(&self) -> &'static str {
        match self {
            Self::Model(_) => "model",
            Self::Lexicon => "lexicon",
        }
    }

    /// Classify `text`. Never fails.
    ///
    /// Text that is empty after normalization is neutral.
    pub async fn analyze(&self, text: &str) -> Sentiment {
        let cleaned = clean_text(text);
        if cleaned.is_empty() {
            return Sentiment::Neutral;
        }

        match self {
            Self::Lexicon => lexicon_sentiment(&cleaned),
            Self::Model(model) => match model.classify(&cleaned).await {
                Ok(label) => label,
                Err(e) => {
                    tracing::warn!(error = %e, "model classification failed, using lexicon");
                    lexicon_sentiment(&cleaned)
                }
            },
        }
    }

    /// Release heavy resources held by the strategy, if any.
    pub async fn release(&self) {
        if let Self::Model(model) = self {
            model.release().await;
        }
    }
}
