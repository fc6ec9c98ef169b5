//! Runtime-mutable search settings shared by the API and the collection loop.
//!
//! Both fields live behind one lock, so a reader never sees terms from one
//! update paired with the item cap from another. Resetting aggregation and
//! waking the loop after a change is the caller's job.

use std::sync::{Mutex, PoisonError};

use sentiboard_core::parse_search_terms;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Consistent copy of the current settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigSnapshot {
    pub search_terms: Vec<String>,
    pub max_items: usize,
}

/// Partial update as received from a client.
///
/// `search_terms` arrives as a comma-separated string, the form the
/// dashboard's text field submits.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ConfigUpdate {
    pub search_terms: Option<String>,
    pub max_items: Option<i64>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("search_terms must contain at least one non-empty term")]
    EmptySearchTerms,
    #[error("max_items must be a positive integer, got {0}")]
    InvalidMaxItems(i64),
}

#[derive(Debug)]
pub struct SharedSettings {
    current: Mutex<ConfigSnapshot>,
    max_items_ceiling: usize,
}

impl SharedSettings {
    /// `max_items` is clamped to `max_items_ceiling` here and on every update.
    #[must_use]
    pub fn new(search_terms: Vec<String>, max_items: usize, max_items_ceiling: usize) -> Self {
        Self {
            current: Mutex::new(ConfigSnapshot {
                search_terms,
                max_items: max_items.min(max_items_ceiling),
            }),
            max_items_ceiling,
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> ConfigSnapshot {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Apply `update`, returning whether any value actually changed.
    ///
    /// The whole update is validated before anything is written, so a
    /// rejected update leaves both fields untouched.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError`] if the terms parse to nothing or `max_items`
    /// is not positive.
    pub fn apply_update(&self, update: ConfigUpdate) -> Result<bool, SettingsError> {
        let terms = match update.search_terms.as_deref() {
            Some(raw) => {
                let parsed = parse_search_terms(raw);
                if parsed.is_empty() {
                    return Err(SettingsError::EmptySearchTerms);
                }
                Some(parsed)
            }
            None => None,
        };

        let max_items = match update.max_items {
            Some(n) if n < 1 => return Err(SettingsError::InvalidMaxItems(n)),
            Some(n) => Some(usize::try_from(n).map_or(self.max_items_ceiling, |n| {
                n.min(self.max_items_ceiling)
            })),
            None => None,
        };

        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        let mut changed = false;

        if let Some(terms) = terms {
            if terms != current.search_terms {
                current.search_terms = terms;
                changed = true;
            }
        }
        if let Some(max_items) = max_items {
            if max_items != current.max_items {
                current.max_items = max_items;
                changed = true;
            }
        }
        drop(current);

        Ok(changed)
    }
}
