//! Background collection loop.
//!
//! One cycle reads the current settings, gathers items (from the live sources
//! or the synthetic generator), classifies them, merges them into the
//! aggregation state and publishes the result. Between cycles the loop sleeps
//! for the mode's interval or until a settings change wakes it.

mod samples;

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::FutureExt;
use sentiboard_core::{AppConfig, Item, RawItem, Source};
use sentiboard_sentiment::{
    Classifier, HttpSettings, RedditClient, RedditCredentials, SentimentError, SourceFetcher,
    TwitterClient,
};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::Notify;

use crate::aggregate::Aggregator;
use crate::publisher::Publisher;
use crate::settings::{ConfigSnapshot, SharedSettings};

/// How the loop obtains items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Live,
    Demo,
    Degraded,
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::Live => write!(f, "live"),
            Mode::Demo => write!(f, "demo"),
            Mode::Degraded => write!(f, "degraded"),
        }
    }
}

/// Item sources and classifier, fixed at startup.
pub enum Pipeline {
    Live {
        twitter: SourceFetcher,
        reddit: SourceFetcher,
        classifier: Classifier,
    },
    Demo {
        classifier: Classifier,
    },
    /// Startup failed; synthetic items get a weighted random sentiment.
    Degraded { reason: String },
}

impl Pipeline {
    /// Build the pipeline described by `config`.
    ///
    /// Sources without credentials are disabled; with neither source enabled
    /// the pipeline runs in demo mode.
    ///
    /// # Errors
    ///
    /// Returns [`SentimentError`] if an HTTP client or the model client cannot
    /// be constructed. Callers fall back to [`Pipeline::Degraded`].
    pub fn from_config(config: &AppConfig) -> Result<Self, SentimentError> {
        let classifier = match config.sentiment_model_url.as_deref() {
            Some(url) if config.use_sentiment_model() => {
                Classifier::with_model(url, config.request_timeout_secs)?
            }
            _ => Classifier::lexicon(),
        };

        let http = HttpSettings {
            timeout_secs: config.request_timeout_secs,
            user_agent: config.user_agent.clone(),
            inter_request_delay_ms: config.inter_request_delay_ms,
        };

        let twitter = match config.twitter_bearer_token.as_deref() {
            Some(token) => SourceFetcher::Twitter(TwitterClient::new(token, &http)?),
            None => SourceFetcher::Disabled(Source::Twitter),
        };

        let reddit = match (&config.reddit_client_id, &config.reddit_client_secret) {
            (Some(client_id), Some(client_secret)) => {
                let credentials = RedditCredentials {
                    client_id: client_id.clone(),
                    client_secret: client_secret.clone(),
                    user_agent: config.reddit_user_agent.clone(),
                };
                SourceFetcher::Reddit(RedditClient::new(credentials, &http)?)
            }
            _ => SourceFetcher::Disabled(Source::Reddit),
        };

        if !twitter.is_enabled() && !reddit.is_enabled() {
            return Ok(Self::Demo { classifier });
        }

        Ok(Self::Live {
            twitter,
            reddit,
            classifier,
        })
    }

    #[must_use]
    pub fn mode(&self) -> Mode {
        match self {
            Self::Live { .. } => Mode::Live,
            Self::Demo { .. } => Mode::Demo,
            Self::Degraded { .. } => Mode::Degraded,
        }
    }

    /// The startup error that put the pipeline in degraded mode.
    #[must_use]
    pub fn init_error(&self) -> Option<&str> {
        match self {
            Self::Degraded { reason } => Some(reason),
            _ => None,
        }
    }

    fn classifier(&self) -> Option<&Classifier> {
        match self {
            Self::Live { classifier, .. } | Self::Demo { classifier } => Some(classifier),
            Self::Degraded { .. } => None,
        }
    }
}

/// Loop timing and per-profile limits.
#[derive(Debug, Clone)]
pub struct CollectorOptions {
    pub demo_interval: Duration,
    pub live_interval: Duration,
    pub error_cooldown: Duration,
    pub sample_count: usize,
    pub live_cycle_cap: Option<usize>,
    /// Drop the model handle after every cycle.
    pub release_after_cycle: bool,
}

impl CollectorOptions {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            demo_interval: Duration::from_secs(config.demo_interval_secs),
            live_interval: Duration::from_secs(config.live_interval_secs),
            error_cooldown: Duration::from_secs(config.error_cooldown_secs),
            sample_count: config.sample_count(),
            live_cycle_cap: config.live_cycle_cap(),
            release_after_cycle: config.low_memory,
        }
    }
}

#[derive(Debug, Error)]
pub enum CycleError {
    #[error("collection cycle panicked: {0}")]
    Panicked(String),
}

/// Outcome of one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleReport {
    pub collected: usize,
    /// False when a reset happened mid-cycle and the batch was discarded.
    pub merged: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WakeReason {
    Timer,
    Signaled,
}

/// Each source gets half the cycle cap; an odd remainder is dropped.
#[must_use]
pub fn per_source_cap(cycle_cap: usize) -> usize {
    cycle_cap / 2
}

pub struct Collector {
    pipeline: Pipeline,
    options: CollectorOptions,
    settings: Arc<SharedSettings>,
    aggregator: Arc<Aggregator>,
    publisher: Publisher,
    wake: Arc<Notify>,
}

impl Collector {
    #[must_use]
    pub fn new(
        pipeline: Pipeline,
        options: CollectorOptions,
        settings: Arc<SharedSettings>,
        aggregator: Arc<Aggregator>,
        publisher: Publisher,
        wake: Arc<Notify>,
    ) -> Self {
        Self {
            pipeline,
            options,
            settings,
            aggregator,
            publisher,
            wake,
        }
    }

    /// Run cycles until the process exits.
    pub async fn run(self) {
        tracing::info!(mode = %self.pipeline.mode(), "collection loop started");
        loop {
            match guarded(self.run_cycle()).await {
                Ok(report) => {
                    let interval = self.interval();
                    tracing::debug!(
                        collected = report.collected,
                        merged = report.merged,
                        secs = interval.as_secs(),
                        "cycle finished, waiting"
                    );
                    if self.wait_for_next_cycle(interval).await == WakeReason::Signaled {
                        tracing::info!("settings changed, starting cycle early");
                    }
                }
                Err(e) => {
                    tracing::error!(
                        error = %e,
                        cooldown_secs = self.options.error_cooldown.as_secs(),
                        "collection cycle failed"
                    );
                    tokio::time::sleep(self.options.error_cooldown).await;
                }
            }
        }
    }

    /// Collect, classify, merge and publish once.
    pub async fn run_cycle(&self) -> CycleReport {
        // Read the generation before the settings: a reset that lands after
        // this point invalidates the batch even if the new settings were seen.
        let generation = self.aggregator.generation();
        let config = self.settings.snapshot();
        tracing::info!(
            mode = %self.pipeline.mode(),
            terms = ?config.search_terms,
            max_items = config.max_items,
            "starting collection cycle"
        );

        let items = match &self.pipeline {
            Pipeline::Live {
                twitter,
                reddit,
                classifier,
            } => self.collect_live(twitter, reddit, classifier, &config).await,
            Pipeline::Demo { classifier } => self.synthesize(Some(classifier)).await,
            Pipeline::Degraded { .. } => self.synthesize(None).await,
        };
        let collected = items.len();

        let merged = match self.aggregator.merge(generation, &items) {
            Some(snapshot) => {
                tracing::info!(
                    collected,
                    positive = snapshot.positive,
                    negative = snapshot.negative,
                    neutral = snapshot.neutral,
                    total = snapshot.total(),
                    "cycle merged"
                );
                self.publisher.publish_snapshot(snapshot);
                true
            }
            None => {
                tracing::info!(collected, "settings were reset mid-cycle, discarding batch");
                false
            }
        };

        if self.options.release_after_cycle {
            if let Some(classifier) = self.pipeline.classifier() {
                classifier.release().await;
            }
        }

        CycleReport { collected, merged }
    }

    async fn collect_live(
        &self,
        twitter: &SourceFetcher,
        reddit: &SourceFetcher,
        classifier: &Classifier,
        config: &ConfigSnapshot,
    ) -> Vec<Item> {
        let cycle_cap = self
            .options
            .live_cycle_cap
            .map_or(config.max_items, |cap| config.max_items.min(cap));
        let share = per_source_cap(cycle_cap);

        let mut raw: Vec<(Source, RawItem)> = Vec::new();
        for fetcher in [twitter, reddit] {
            let source = fetcher.source();
            let fetched = fetcher.collect(&config.search_terms, share).await;
            tracing::info!(source = %source, count = fetched.len(), "fetched items");
            raw.extend(fetched.into_iter().map(|item| (source, item)));
        }

        let mut items = Vec::with_capacity(raw.len());
        for (source, item) in raw {
            let sentiment = classifier.analyze(&item.text).await;
            items.push(Item::from_raw(item, source, sentiment));
        }
        items
    }

    async fn synthesize(&self, classifier: Option<&Classifier>) -> Vec<Item> {
        let draws = {
            let mut rng = rand::rng();
            samples::draw_samples(&mut rng, self.options.sample_count, Utc::now())
        };

        let mut items = Vec::with_capacity(draws.len());
        for draw in draws {
            let sentiment = match classifier {
                Some(classifier) => classifier.analyze(draw.text).await,
                None => draw.fallback,
            };
            items.push(draw.into_item(sentiment));
        }
        items
    }

    fn interval(&self) -> Duration {
        match self.pipeline.mode() {
            Mode::Live => self.options.live_interval,
            Mode::Demo | Mode::Degraded => self.options.demo_interval,
        }
    }

    /// Sleep for `duration` or until woken. A wake sent while no one is
    /// waiting is kept and consumed by the next wait.
    async fn wait_for_next_cycle(&self, duration: Duration) -> WakeReason {
        tokio::select! {
            () = tokio::time::sleep(duration) => WakeReason::Timer,
            () = self.wake.notified() => WakeReason::Signaled,
        }
    }
}

/// Run `cycle`, turning a panic into a [`CycleError`].
async fn guarded<F: std::future::Future>(cycle: F) -> Result<F::Output, CycleError> {
    AssertUnwindSafe(cycle).catch_unwind().await.map_err(|panic| {
        let message = panic
            .downcast_ref::<&str>()
            .map(|s| (*s).to_string())
            .or_else(|| panic.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        CycleError::Panicked(message)
    })
}

#[cfg(test)]
#[path = "collector_test.rs"]
mod tests;
