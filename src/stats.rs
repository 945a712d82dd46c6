//! Observable counters for remote classification lookups.

use std::sync::atomic::{AtomicU64, Ordering};

/// Atomic counters for one lookup category (Safe-Browsing or Parental).
///
/// One instance lives on each shared [`crate::ClassificationCache`], so the
/// counters observe every engine in the process. `requests` counts outbound
/// hash-prefix requests actually issued; coalesced and cached lookups do not
/// increment it.
#[derive(Debug, Default)]
pub struct LookupStats {
    requests: AtomicU64,
    cache_hits: AtomicU64,
}

impl LookupStats {
    pub fn new() -> Self {
        Self {
            requests: AtomicU64::new(0),
            cache_hits: AtomicU64::new(0),
        }
    }

    /// Upstream requests issued so far.
    pub fn requests(&self) -> u64 {
        self.requests.load(Ordering::Relaxed)
    }

    /// Lookups answered from the cache without an upstream request.
    pub fn cache_hits(&self) -> u64 {
        self.cache_hits.load(Ordering::Relaxed)
    }

    pub(crate) fn record_request(&self) {
        self.requests.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    /// Zero both counters.
    pub fn reset(&self) {
        self.requests.store(0, Ordering::Relaxed);
        self.cache_hits.store(0, Ordering::Relaxed);
    }
}
