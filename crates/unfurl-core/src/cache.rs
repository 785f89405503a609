//! Process-lifetime preview cache keyed by URL.
//!
//! The cache is deliberately naive: entries are never invalidated, expired,
//! or retried — a key present in the cache is never fetched again for the
//! cache's lifetime, including keys holding a `Failed` placeholder. There is
//! also no in-flight bookkeeping: a URL being fetched keeps reporting a miss
//! until the fetch settles, so two overlapping scan cycles can both fetch the
//! same URL. That race is tolerated; whichever write lands last wins, and
//! both writes carry equivalent data.
//!
//! Clones share the same underlying map, so one cache can back several plugin
//! instances. Reads and writes are synchronous and never suspend, which keeps
//! the scan and decoration-build paths free of await points.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::debug;

use crate::provider::PreviewContent;

/// What a settled fetch produced for a URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreviewOutcome {
    /// The provider rendered content.
    Ready(PreviewContent),
    /// The provider matched but explicitly had nothing to show.
    Empty,
    /// The provider failed; a generic error placeholder is shown instead.
    Failed,
}

/// A cached, settled fetch result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    /// The settled outcome.
    pub outcome: PreviewOutcome,
    /// When the fetch settled.
    pub fetched_at: DateTime<Utc>,
}

impl CacheEntry {
    /// Creates an entry settling now with the given outcome.
    pub fn new(outcome: PreviewOutcome) -> Self {
        Self {
            outcome,
            fetched_at: Utc::now(),
        }
    }
}

/// Shared URL → settled-preview map.
#[derive(Clone, Default)]
pub struct PreviewCache {
    inner: Arc<RwLock<HashMap<String, CacheEntry>>>,
}

impl PreviewCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a settled entry exists for `url`.
    pub fn has(&self, url: &str) -> bool {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(url)
    }

    /// Returns the settled entry for `url`, if any.
    pub fn get(&self, url: &str) -> Option<CacheEntry> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(url)
            .cloned()
    }

    /// Stores a settled entry for `url`, replacing any previous one.
    pub fn insert(&self, url: impl Into<String>, entry: CacheEntry) {
        let url = url.into();
        debug!(url = %url, outcome = ?entry.outcome, "caching preview result");
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(url, entry);
    }

    /// Number of settled entries.
    pub fn len(&self) -> usize {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for PreviewCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreviewCache")
            .field("entries", &self.len())
            .finish()
    }
}
