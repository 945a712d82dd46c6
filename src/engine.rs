//! Engine facade: rule ingestion and the host classification ladder.

use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;

use crate::cache::{ClassificationCache, PARENTAL_CACHE, SAFE_BROWSING_CACHE};
use crate::error::Result;
use crate::remote::{
    Category, RemoteClassifier, DEFAULT_PARENTAL_SERVER, DEFAULT_SAFE_BROWSING_SERVER,
};
use crate::rule::{parse_rule, Polarity, RuleStore};
use crate::safesearch;
use crate::stats::LookupStats;
use crate::verdict::{Reason, Verdict};

#[derive(Debug, Clone, Copy, Default)]
struct FeatureFlags {
    safe_browsing: bool,
    parental: bool,
    parental_sensitivity: u32,
    safe_search: bool,
    destroyed: bool,
}

/// DNS content filter engine.
///
/// A fresh engine has an empty rule store and every auxiliary layer
/// disabled. All operations are safe to invoke from multiple threads in
/// parallel; configuration changes take effect for queries that start
/// afterwards.
///
/// # Example
///
/// ```
/// use dnssieve::{Engine, Reason};
///
/// let engine = Engine::new();
/// engine.add_rule("||doubleclick.net^", 0).unwrap();
///
/// let verdict = engine.check_host("www.doubleclick.net");
/// assert!(verdict.is_filtered);
/// assert_eq!(verdict.reason, Reason::FilteredBlackList);
/// ```
pub struct Engine {
    store: RuleStore,
    safe_browsing: RemoteClassifier,
    parental: RemoteClassifier,
    flags: RwLock<FeatureFlags>,
}

impl Engine {
    /// Create an engine backed by the process-wide classification caches.
    pub fn new() -> Self {
        Self::with_caches(
            Arc::clone(&SAFE_BROWSING_CACHE),
            Arc::clone(&PARENTAL_CACHE),
        )
    }

    /// Create an engine with injected caches; used by tests that need
    /// isolation from the shared process-wide instances.
    pub fn with_caches(
        safe_browsing_cache: Arc<ClassificationCache>,
        parental_cache: Arc<ClassificationCache>,
    ) -> Self {
        Self {
            store: RuleStore::new(),
            safe_browsing: RemoteClassifier::new(
                Category::SafeBrowsing,
                safe_browsing_cache,
                DEFAULT_SAFE_BROWSING_SERVER,
            ),
            parental: RemoteClassifier::new(
                Category::Parental,
                parental_cache,
                DEFAULT_PARENTAL_SERVER,
            ),
            flags: RwLock::new(FeatureFlags::default()),
        }
    }

    /// Parse one filter-list line and insert it into the rule store.
    ///
    /// `filter_id` identifies the source list and is kept on the rule for
    /// diagnostics. Returns [`crate::Error::InvalidSyntax`] for lines that
    /// do not form a DNS rule; callers loading whole lists typically skip
    /// those and continue.
    pub fn add_rule(&self, line: &str, filter_id: i64) -> Result<()> {
        match parse_rule(line, filter_id)? {
            Some(rule) => self.store.add(rule),
            // $badfilter: the rule disables itself.
            None => Ok(()),
        }
    }

    /// Number of rules accepted so far.
    pub fn count(&self) -> usize {
        self.store.len()
    }

    /// Decide whether `host` should be blocked, allowed, or rewritten.
    pub fn check_host(&self, host: &str) -> Verdict {
        let Some(host) = normalize_host(host) else {
            return Verdict::with_reason(Reason::FilteredInvalid);
        };
        let flags = *self.flags.read();

        if flags.safe_search {
            if let Some(target) = safesearch::lookup(&host) {
                return Verdict {
                    is_filtered: true,
                    reason: Reason::FilteredSafeSearch,
                    rule: None,
                    rewrite_to: Some(target.to_string()),
                };
            }
        }

        // $important overrides regular precedence; between two important
        // rules the allow (exception) form wins.
        if let Some(rule) = self.store.find_match(&host, Polarity::Allow, true) {
            return Verdict::with_rule(Reason::NotFilteredWhiteList, rule.text.clone());
        }
        if let Some(rule) = self.store.find_match(&host, Polarity::Block, true) {
            return Verdict::with_rule(Reason::FilteredBlackList, rule.text.clone());
        }
        if let Some(rule) = self.store.find_match(&host, Polarity::Allow, false) {
            return Verdict::with_rule(Reason::NotFilteredWhiteList, rule.text.clone());
        }
        if let Some(rule) = self.store.find_match(&host, Polarity::Block, false) {
            return Verdict::with_rule(Reason::FilteredBlackList, rule.text.clone());
        }

        if flags.safe_browsing {
            match self.safe_browsing.check(&host, 0) {
                Ok(true) => return Verdict::with_reason(Reason::FilteredSafeBrowsing),
                Ok(false) => {}
                Err(e) => {
                    log::warn!("safe-browsing check failed for {}: {}", host, e);
                    return Verdict::with_reason(Reason::NotFilteredError);
                }
            }
        }

        if flags.parental {
            match self.parental.check(&host, flags.parental_sensitivity) {
                Ok(true) => return Verdict::with_reason(Reason::FilteredParental),
                Ok(false) => {}
                Err(e) => {
                    log::warn!("parental check failed for {}: {}", host, e);
                    return Verdict::with_reason(Reason::NotFilteredError);
                }
            }
        }

        Verdict::default()
    }

    /// Force-safe replacement for `host`, once Safe-Search is enabled.
    pub fn safe_search_domain(&self, host: &str) -> Option<&'static str> {
        if !self.flags.read().safe_search {
            return None;
        }
        let host = normalize_host(host)?;
        safesearch::lookup(&host)
    }

    pub fn enable_safe_browsing(&self) {
        self.flags.write().safe_browsing = true;
    }

    /// Enable parental filtering. Category codes up to `sensitivity` filter.
    pub fn enable_parental(&self, sensitivity: u32) {
        let mut flags = self.flags.write();
        flags.parental = true;
        flags.parental_sensitivity = sensitivity;
    }

    pub fn enable_safe_search(&self) {
        self.flags.write().safe_search = true;
    }

    /// Point Safe-Browsing lookups at `addr` (`host:port` or a full URL).
    pub fn set_safe_browsing_server(&self, addr: &str) -> Result<()> {
        self.safe_browsing.set_server(addr)
    }

    /// Point Parental lookups at `addr` (`host:port` or a full URL).
    pub fn set_parental_server(&self, addr: &str) -> Result<()> {
        self.parental.set_server(addr)
    }

    /// Bound upstream lookups; must be positive.
    pub fn set_http_timeout(&self, timeout: Duration) -> Result<()> {
        self.safe_browsing.set_timeout(timeout)?;
        self.parental.set_timeout(timeout)
    }

    /// Lookup counters for one category's shared cache.
    pub fn lookup_stats(&self, category: Category) -> &LookupStats {
        match category {
            Category::SafeBrowsing => self.safe_browsing.cache().stats(),
            Category::Parental => self.parental.cache().stats(),
        }
    }

    /// Disable the auxiliary layers and release remote-lookup resources.
    /// Local rule filtering keeps working. Idempotent.
    pub fn destroy(&self) {
        let mut flags = self.flags.write();
        if flags.destroyed {
            return;
        }
        flags.destroyed = true;
        flags.safe_browsing = false;
        flags.parental = false;
        flags.safe_search = false;
        log::debug!("engine destroyed");
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.destroy();
    }
}

/// Normalize a hostname: lowercase, strip trailing dots, reject anything
/// outside `[a-z0-9._-]`. Idempotent.
fn normalize_host(host: &str) -> Option<String> {
    let stripped = host.trim_end_matches('.');
    if stripped.is_empty() {
        return None;
    }
    let lower = stripped.to_ascii_lowercase();
    if !lower
        .bytes()
        .all(|b| matches!(b, b'a'..=b'z' | b'0'..=b'9' | b'.' | b'_' | b'-'))
    {
        return None;
    }
    Some(lower)
}
