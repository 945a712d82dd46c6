//! Shared TTL caches for remote classification verdicts.
//!
//! Two process-wide instances exist, one per lookup category. They are
//! shared by every engine in the process, which deduplicates upstream
//! traffic across engines and gives tests a single point to reset.

use once_cell::sync::Lazy;
use quick_cache::sync::Cache;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::stats::LookupStats;
use crate::verdict::Reason;

/// Default number of entries kept per category.
const DEFAULT_CAPACITY: usize = 65_536;

/// How long a positive (filtered) verdict is kept.
const POSITIVE_TTL: Duration = Duration::from_secs(60 * 60);

/// How long a negative (not found) verdict is kept.
const NEGATIVE_TTL: Duration = Duration::from_secs(60 * 60);

/// One cached classification outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheEntry {
    expires_at: Instant,
    /// Whether the name was flagged in this cache's category.
    pub filtered: bool,
    /// Reason recorded with the verdict.
    pub reason: Reason,
}

/// Size-bounded verdict cache with per-entry expiry.
///
/// Keys are normalized hostnames (lowercased, no trailing dot). An access
/// that finds an expired entry treats it as absent and evicts it.
pub struct ClassificationCache {
    entries: Cache<String, CacheEntry>,
    positive_ttl: Duration,
    negative_ttl: Duration,
    stats: LookupStats,
}

impl ClassificationCache {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Cache::new(capacity),
            positive_ttl: POSITIVE_TTL,
            negative_ttl: NEGATIVE_TTL,
            stats: LookupStats::new(),
        }
    }

    /// Override both TTLs; used by tests to exercise expiry.
    pub fn with_ttls(capacity: usize, positive_ttl: Duration, negative_ttl: Duration) -> Self {
        Self {
            entries: Cache::new(capacity),
            positive_ttl,
            negative_ttl,
            stats: LookupStats::new(),
        }
    }

    /// Fresh entry for `name`, or `None`.
    pub fn get(&self, name: &str) -> Option<CacheEntry> {
        let entry = self.entries.get(name)?;
        if Instant::now() >= entry.expires_at {
            self.entries.remove(name);
            return None;
        }
        Some(entry)
    }

    /// Record a verdict for `name`. The TTL follows the verdict polarity.
    pub fn put(&self, name: &str, filtered: bool, reason: Reason) {
        let ttl = if filtered {
            self.positive_ttl
        } else {
            self.negative_ttl
        };
        self.entries.insert(
            name.to_string(),
            CacheEntry {
                expires_at: Instant::now() + ttl,
                filtered,
                reason,
            },
        );
    }

    /// Drop every entry.
    pub fn purge(&self) {
        self.entries.clear();
        log::debug!("classification cache purged");
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Lookup counters for this cache's category.
    pub fn stats(&self) -> &LookupStats {
        &self.stats
    }
}

impl Default for ClassificationCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Process-wide cache for Safe-Browsing verdicts.
pub static SAFE_BROWSING_CACHE: Lazy<Arc<ClassificationCache>> =
    Lazy::new(|| Arc::new(ClassificationCache::new()));

/// Process-wide cache for Parental verdicts.
pub static PARENTAL_CACHE: Lazy<Arc<ClassificationCache>> =
    Lazy::new(|| Arc::new(ClassificationCache::new()));

/// Empty both shared caches and zero their counters.
pub fn purge_caches() {
    SAFE_BROWSING_CACHE.purge();
    SAFE_BROWSING_CACHE.stats().reset();
    PARENTAL_CACHE.purge();
    PARENTAL_CACHE.stats().reset();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_get() {
        let cache = ClassificationCache::with_capacity(16);
        assert!(cache.get("example.org").is_none());

        cache.put("example.org", true, Reason::FilteredSafeBrowsing);
        let entry = cache.get("example.org").unwrap();
        assert!(entry.filtered);
        assert_eq!(entry.reason, Reason::FilteredSafeBrowsing);
    }

    #[test]
    fn test_expired_entry_is_absent_and_evicted() {
        let cache = ClassificationCache::with_ttls(16, Duration::ZERO, Duration::ZERO);
        cache.put("example.org", true, Reason::FilteredSafeBrowsing);
        assert!(cache.get("example.org").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_negative_entries_use_negative_ttl() {
        let cache =
            ClassificationCache::with_ttls(16, Duration::from_secs(3600), Duration::ZERO);
        cache.put("stale.org", false, Reason::NotFilteredNotFound);
        assert!(cache.get("stale.org").is_none());

        cache.put("fresh.org", true, Reason::FilteredParental);
        assert!(cache.get("fresh.org").is_some());
    }

    #[test]
    fn test_purge() {
        let cache = ClassificationCache::with_capacity(16);
        cache.put("a.example.org", true, Reason::FilteredSafeBrowsing);
        cache.put("b.example.org", false, Reason::NotFilteredNotFound);
        assert_eq!(cache.len(), 2);

        cache.purge();
        assert!(cache.is_empty());
        assert!(cache.get("a.example.org").is_none());
    }

    #[test]
    fn test_replacement_overwrites() {
        let cache = ClassificationCache::with_capacity(16);
        cache.put("example.org", false, Reason::NotFilteredNotFound);
        cache.put("example.org", true, Reason::FilteredParental);
        let entry = cache.get("example.org").unwrap();
        assert!(entry.filtered);
        assert_eq!(entry.reason, Reason::FilteredParental);
    }
}
