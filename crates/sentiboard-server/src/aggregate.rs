//! In-memory sentiment counters and the bounded recent-items buffer.

use std::sync::{Mutex, PoisonError};

use sentiboard_core::{Item, Sentiment, Source};
use serde::Serialize;

/// Per-source item counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SourceCounts {
    pub twitter: u64,
    pub reddit: u64,
}

impl SourceCounts {
    fn increment(&mut self, source: Source) {
        match source {
            Source::Twitter => self.twitter += 1,
            Source::Reddit => self.reddit += 1,
        }
    }
}

/// Immutable copy of the aggregation state, in the shape the dashboard renders.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DashboardSnapshot {
    pub positive: u64,
    pub negative: u64,
    pub neutral: u64,
    pub sources: SourceCounts,
    /// Newest first.
    pub recent_items: Vec<Item>,
}

impl DashboardSnapshot {
    #[must_use]
    pub fn total(&self) -> u64 {
        self.positive + self.negative + self.neutral
    }

    fn count(&mut self, sentiment: Sentiment) {
        match sentiment {
            Sentiment::Positive => self.positive += 1,
            Sentiment::Negative => self.negative += 1,
            Sentiment::Neutral => self.neutral += 1,
        }
    }

    /// Count every item, then put the batch in front of older items and drop
    /// whatever falls past `max_stored`.
    fn merge(&mut self, items: &[Item], max_stored: usize) {
        for item in items {
            self.count(item.sentiment);
            self.sources.increment(item.source);
        }

        let capacity = (items.len() + self.recent_items.len()).min(max_stored);
        let mut combined = Vec::with_capacity(capacity);
        combined.extend(items.iter().take(max_stored).cloned());
        let room = max_stored - combined.len();
        combined.extend(self.recent_items.drain(..).take(room));
        self.recent_items = combined;
    }
}

#[derive(Debug, Default)]
struct Inner {
    generation: u64,
    data: DashboardSnapshot,
}

/// Aggregation state guarded by one lock.
///
/// Every [`reset`](Self::reset) bumps a generation counter. A cycle records the
/// generation it started under and hands it to [`merge`](Self::merge); a merge
/// from a generation that has since been reset is discarded.
#[derive(Debug)]
pub struct Aggregator {
    inner: Mutex<Inner>,
    max_stored: usize,
}

impl Aggregator {
    #[must_use]
    pub fn new(max_stored: usize) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            max_stored,
        }
    }

    #[must_use]
    pub fn generation(&self) -> u64 {
        self.lock().generation
    }

    #[must_use]
    pub fn snapshot(&self) -> DashboardSnapshot {
        self.lock().data.clone()
    }

    /// Zero all counters, clear the buffer and start a new generation.
    pub fn reset(&self) -> DashboardSnapshot {
        let mut inner = self.lock();
        inner.generation += 1;
        inner.data = DashboardSnapshot::default();
        inner.data.clone()
    }

    /// Merge a classified batch collected under `generation`.
    ///
    /// Returns the post-merge snapshot, taken under the same lock, or `None`
    /// when the batch is stale.
    pub fn merge(&self, generation: u64, items: &[Item]) -> Option<DashboardSnapshot> {
        let mut inner = self.lock();
        if inner.generation != generation {
            return None;
        }
        inner.data.merge(items, self.max_stored);
        Some(inner.data.clone())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
