//! Client for a text-classification inference server (TEI `/predict` API).
//!
//! The model handle is loaded lazily on the first classification and kept
//! until [`ModelClient::release`] drops it; the next call loads it again.
//! A failed load is remembered for [`LOAD_RETRY_BACKOFF`] so callers fall
//! back immediately instead of waiting out another timeout per item.

use std::sync::Arc;
use std::time::Duration;

use sentiboard_core::Sentiment;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::error::{status_error, SentimentError};

/// Top-label confidence below which a prediction is reported as neutral.
pub const CONFIDENCE_THRESHOLD: f32 = 0.65;

/// How long a failed load suppresses further load attempts.
pub const LOAD_RETRY_BACKOFF: Duration = Duration::from_secs(60);

const SERVICE: &str = "sentiment model";

#[derive(Debug, Deserialize)]
struct ModelInfo {
    model_id: String,
}

#[derive(Serialize)]
struct PredictRequest<'a> {
    inputs: &'a str,
    truncate: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Prediction {
    pub(crate) label: String,
    pub(crate) score: f32,
}

#[derive(Debug)]
struct LoadedModel {
    model_id: String,
    predict_url: String,
}

#[derive(Debug, Default)]
struct LoadState {
    model: Option<Arc<LoadedModel>>,
    failed_at: Option<Instant>,
}

/// HTTP client for the sentiment model server.
pub struct ModelClient {
    client: reqwest::Client,
    base_url: String,
    state: Mutex<LoadState>,
}

impl ModelClient {
    /// Create a `ModelClient` for the server at `base_url`.
    ///
    /// No request is made until the first classification.
    ///
    /// # Errors
    ///
    /// Returns [`SentimentError::Model`] if `base_url` is not a valid URL and
    /// [`SentimentError::Http`] if the HTTP client cannot be constructed.
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self, SentimentError> {
        reqwest::Url::parse(base_url)
            .map_err(|e| SentimentError::Model(format!("invalid model URL {base_url}: {e}")))?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            state: Mutex::new(LoadState::default()),
        })
    }

    /// Whether a model handle is currently held.
    pub async fn is_loaded(&self) -> bool {
        self.state.lock().await.model.is_some()
    }

    /// Drop the model handle and forget any load failure. Idempotent.
    pub async fn release(&self) {
        let mut state = self.state.lock().await;
        state.failed_at = None;
        if let Some(model) = state.model.take() {
            tracing::info!(model = %model.model_id, "released sentiment model handle");
        }
    }

    async fn ensure_loaded(&self) -> Result<Arc<LoadedModel>, SentimentError> {
        let mut state = self.state.lock().await;
        if let Some(model) = state.model.as_ref() {
            return Ok(Arc::clone(model));
        }
        if let Some(failed_at) = state.failed_at {
            if failed_at.elapsed() < LOAD_RETRY_BACKOFF {
                return Err(SentimentError::Model(
                    "model unavailable after failed load".to_string(),
                ));
            }
        }

        match self.fetch_info().await {
            Ok(info) => {
                tracing::info!(model = %info.model_id, "loaded sentiment model handle");
                let model = Arc::new(LoadedModel {
                    model_id: info.model_id,
                    predict_url: format!("{}/predict", self.base_url),
                });
                state.failed_at = None;
                state.model = Some(Arc::clone(&model));
                Ok(model)
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    backoff_secs = LOAD_RETRY_BACKOFF.as_secs(),
                    "sentiment model load failed"
                );
                state.failed_at = Some(Instant::now());
                Err(e)
            }
        }
    }

    async fn fetch_info(&self) -> Result<ModelInfo, SentimentError> {
        let url = format!("{}/info", self.base_url);
        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(status_error(SERVICE, response.status(), &url));
        }
        response
            .json()
            .await
            .map_err(|e| SentimentError::Model(format!("model info parse error: {e}")))
    }

    /// Classify already-normalized, non-empty text.
    ///
    /// # Errors
    ///
    /// Returns [`SentimentError`] if the server is unreachable, answers with a
    /// non-success status, or returns predictions that cannot be interpreted.
    pub async fn classify(&self, text: &str) -> Result<Sentiment, SentimentError> {
        let model = self.ensure_loaded().await?;

        let response = self
            .client
            .post(&model.predict_url)
            .json(&PredictRequest {
                inputs: text,
                truncate: true,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(status_error(SERVICE, response.status(), &model.predict_url));
        }

        let predictions: Vec<Prediction> = response
            .json()
            .await
            .map_err(|e| SentimentError::Model(format!("prediction parse error: {e}")))?;

        pick_label(&predictions)
    }
}

/// Choose the highest-scoring label, demoted to neutral below the threshold.
pub(crate) fn pick_label(predictions: &[Prediction]) -> Result<Sentiment, SentimentError> {
    let top = predictions
        .iter()
        .max_by(|a, b| a.score.total_cmp(&b.score))
        .ok_or_else(|| SentimentError::Model("empty prediction list".to_string()))?;

    let label = map_label(&top.label)?;
    if top.score < CONFIDENCE_THRESHOLD {
        return Ok(Sentiment::Neutral);
    }
    Ok(label)
}

fn map_label(label: &str) -> Result<Sentiment, SentimentError> {
    match label.to_ascii_lowercase().as_str() {
        "positive" | "pos" | "label_1" => Ok(Sentiment::Positive),
        "negative" | "neg" | "label_0" => Ok(Sentiment::Negative),
        "neutral" => Ok(Sentiment::Neutral),
        other => Err(SentimentError::Model(format!("unknown model label {other}"))),
    }
}
