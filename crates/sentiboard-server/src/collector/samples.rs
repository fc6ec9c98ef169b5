//! Synthetic items for demo and degraded mode.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use sentiboard_core::{Item, Sentiment, Source};

const SAMPLE_TEXTS: [&str; 10] = [
    "I love this new product! It's amazing and works perfectly.",
    "The service was terrible and the staff was rude.",
    "Just bought the latest smartphone and it's okay, nothing special.",
    "Can't believe how bad the weather is today.",
    "The movie was fantastic, highly recommend watching it.",
    "This restaurant has the best food in town!",
    "So disappointed with my recent purchase, it broke after one use.",
    "Not sure how I feel about the new update, some good features but also some problems.",
    "The concert last night was incredible!",
    "Just had a mediocre experience at the new cafe downtown.",
];

const SAMPLE_URL: &str = "https://example.com/sample";

/// Random choices for one synthetic item, drawn up front so no RNG is held
/// across classification awaits.
#[derive(Debug, Clone)]
pub(crate) struct SampleDraw {
    pub text: &'static str,
    pub source: Source,
    pub timestamp: DateTime<Utc>,
    /// Used only when no classifier is available.
    pub fallback: Sentiment,
}

impl SampleDraw {
    pub fn into_item(self, sentiment: Sentiment) -> Item {
        Item {
            text: self.text.to_string(),
            source: self.source,
            timestamp: self.timestamp,
            sentiment,
            url: Some(SAMPLE_URL.to_string()),
        }
    }
}

/// Draw `count` samples with timestamps 1 to 60 minutes before `now`.
pub(crate) fn draw_samples<R: Rng + ?Sized>(
    rng: &mut R,
    count: usize,
    now: DateTime<Utc>,
) -> Vec<SampleDraw> {
    (0..count)
        .map(|_| SampleDraw {
            text: SAMPLE_TEXTS[rng.random_range(0..SAMPLE_TEXTS.len())],
            source: Source::ALL[rng.random_range(0..Source::ALL.len())],
            timestamp: now - Duration::minutes(rng.random_range(1..=60)),
            fallback: weighted_sentiment(rng),
        })
        .collect()
}

/// Positive 0.4, negative 0.4, neutral 0.2.
pub(crate) fn weighted_sentiment<R: Rng + ?Sized>(rng: &mut R) -> Sentiment {
    let roll: f64 = rng.random();
    if roll < 0.4 {
        Sentiment::Positive
    } else if roll < 0.8 {
        Sentiment::Negative
    } else {
        Sentiment::Neutral
    }
}
