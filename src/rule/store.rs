//! Compiled rule storage and multi-pattern matching.
//!
//! Rules are held in two polarity buckets. Each bucket keeps its rules in
//! insertion order and lazily maintains a combined [`RegexSet`] so that a
//! match query costs roughly the same no matter how many rules are loaded.
//! Insertion only appends; the combined set is rebuilt on the first query
//! that observes new rules, and swapped in atomically so concurrent queries
//! keep using the previous (slightly stale) set meanwhile.

use arc_swap::ArcSwap;
use parking_lot::RwLock;
use regex::{RegexBuilder, RegexSet, RegexSetBuilder};
use std::sync::Arc;

use super::{CompiledRule, Polarity};
use crate::error::{Error, Result};

/// Compiled-size ceiling for the combined sets. Host patterns are small,
/// but tens of thousands of them overflow the regex crate default.
const SET_SIZE_LIMIT: usize = 1 << 28;

/// Combined automata covering a snapshot of one bucket's rules.
struct BucketMatcher {
    /// Number of rules this matcher covers.
    len: usize,
    set: RegexSet,
    /// Positions (in the rule vector) of `$important` rules, in order.
    important_idx: Vec<usize>,
    important_set: RegexSet,
}

impl BucketMatcher {
    fn empty() -> Self {
        Self {
            len: 0,
            set: RegexSet::empty(),
            important_idx: Vec::new(),
            important_set: RegexSet::empty(),
        }
    }

    fn build(rules: &[Arc<CompiledRule>]) -> Result<Self> {
        let patterns: Vec<&str> = rules.iter().map(|r| r.pattern.as_str()).collect();
        let important_idx: Vec<usize> = rules
            .iter()
            .enumerate()
            .filter(|(_, r)| r.important)
            .map(|(i, _)| i)
            .collect();
        let important_patterns: Vec<&str> =
            important_idx.iter().map(|&i| patterns[i]).collect();

        Ok(Self {
            len: rules.len(),
            set: build_set(&patterns)?,
            important_idx,
            important_set: build_set(&important_patterns)?,
        })
    }
}

fn build_set(patterns: &[&str]) -> Result<RegexSet> {
    RegexSetBuilder::new(patterns)
        .case_insensitive(true)
        .size_limit(SET_SIZE_LIMIT)
        .build()
        .map_err(|e| Error::Config(format!("failed to build combined matcher: {}", e)))
}

/// One polarity bucket with its lazily rebuilt combined matcher.
struct Bucket {
    rules: RwLock<Vec<Arc<CompiledRule>>>,
    matcher: ArcSwap<BucketMatcher>,
}

impl Bucket {
    fn new() -> Self {
        Self {
            rules: RwLock::new(Vec::new()),
            matcher: ArcSwap::from_pointee(BucketMatcher::empty()),
        }
    }

    fn push(&self, rule: Arc<CompiledRule>) {
        self.rules.write().push(rule);
    }

    fn find_match(&self, host: &str, only_important: bool) -> Option<Arc<CompiledRule>> {
        let rules = self.rules.read();
        let mut matcher = self.matcher.load_full();
        if matcher.len != rules.len() {
            matcher = self.rebuild(&rules, matcher);
        }

        let matched = if only_important {
            matcher.important_set.matches(host)
        } else {
            matcher.set.matches(host)
        };
        // The smallest pattern index is the earliest inserted rule.
        let first = matched.iter().next()?;
        let rule_idx = if only_important {
            matcher.important_idx[first]
        } else {
            first
        };
        rules.get(rule_idx).cloned()
    }

    /// Build a matcher for the observed snapshot and publish it unless a
    /// racing query already published a newer one.
    fn rebuild(
        &self,
        rules: &[Arc<CompiledRule>],
        previous: Arc<BucketMatcher>,
    ) -> Arc<BucketMatcher> {
        let fresh = match BucketMatcher::build(rules) {
            Ok(matcher) => Arc::new(matcher),
            Err(e) => {
                log::error!("keeping stale combined matcher: {}", e);
                return previous;
            }
        };
        log::debug!("rebuilt combined matcher for {} rules", fresh.len);
        self.matcher.rcu(|current| {
            if current.len >= fresh.len {
                Arc::clone(current)
            } else {
                Arc::clone(&fresh)
            }
        });
        fresh
    }

    fn len(&self) -> usize {
        self.rules.read().len()
    }
}

/// Thread-safe store of compiled rules, partitioned by polarity.
///
/// Appends and queries may interleave; once an append returns, every query
/// started afterwards sees the rule.
pub struct RuleStore {
    block: Bucket,
    allow: Bucket,
}

impl RuleStore {
    pub fn new() -> Self {
        Self {
            block: Bucket::new(),
            allow: Bucket::new(),
        }
    }

    fn bucket(&self, polarity: Polarity) -> &Bucket {
        match polarity {
            Polarity::Block => &self.block,
            Polarity::Allow => &self.allow,
        }
    }

    /// Validate and append one compiled rule.
    pub fn add(&self, rule: CompiledRule) -> Result<()> {
        // Validate the individual pattern now so a bad rule is rejected at
        // ingestion instead of poisoning the combined set.
        RegexBuilder::new(&rule.pattern)
            .case_insensitive(true)
            .size_limit(SET_SIZE_LIMIT)
            .build()
            .map_err(|_| Error::InvalidSyntax)?;

        self.bucket(rule.polarity).push(Arc::new(rule));
        Ok(())
    }

    /// First rule of `polarity` matching `host`, in insertion order.
    /// With `only_important`, rules without the flag are skipped.
    pub fn find_match(
        &self,
        host: &str,
        polarity: Polarity,
        only_important: bool,
    ) -> Option<Arc<CompiledRule>> {
        self.bucket(polarity).find_match(host, only_important)
    }

    /// Total number of stored rules across both buckets.
    pub fn len(&self) -> usize {
        self.block.len() + self.allow.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for RuleStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::parse_rule;

    fn add(store: &RuleStore, line: &str) {
        let rule = parse_rule(line, 0).unwrap().unwrap();
        store.add(rule).unwrap();
    }

    #[test]
    fn test_find_match_by_polarity() {
        let store = RuleStore::new();
        add(&store, "||doubleclick.net^");
        add(&store, "@@||test.example.org");

        let block = store
            .find_match("www.doubleclick.net", Polarity::Block, false)
            .unwrap();
        assert_eq!(block.text, "||doubleclick.net^");
        assert!(store
            .find_match("www.doubleclick.net", Polarity::Allow, false)
            .is_none());

        let allow = store
            .find_match("test.example.org", Polarity::Allow, false)
            .unwrap();
        assert_eq!(allow.text, "@@||test.example.org");
    }

    #[test]
    fn test_important_only_query() {
        let store = RuleStore::new();
        add(&store, "||example.org^");
        add(&store, "||test.example.org^$important");

        assert!(store
            .find_match("example.org", Polarity::Block, true)
            .is_none());
        let hit = store
            .find_match("test.example.org", Polarity::Block, true)
            .unwrap();
        assert_eq!(hit.text, "||test.example.org^$important");
    }

    #[test]
    fn test_insertion_order_wins() {
        let store = RuleStore::new();
        add(&store, "/example/");
        add(&store, "||example.org^");

        let hit = store
            .find_match("example.org", Polarity::Block, false)
            .unwrap();
        assert_eq!(hit.text, "/example/");
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        let store = RuleStore::new();
        let rule = parse_rule("/[unclosed/", 0).unwrap().unwrap();
        assert!(matches!(store.add(rule), Err(Error::InvalidSyntax)));
        assert!(store.is_empty());
    }

    #[test]
    fn test_matching_is_case_insensitive() {
        let store = RuleStore::new();
        add(&store, "||DoubleClick.net^");
        assert!(store
            .find_match("ads.doubleclick.net", Polarity::Block, false)
            .is_some());
    }

    #[test]
    fn test_rules_visible_after_insert() {
        let store = RuleStore::new();
        add(&store, "||one.example.org^");
        assert!(store
            .find_match("one.example.org", Polarity::Block, false)
            .is_some());

        // A later insert must be picked up by the lazily rebuilt matcher.
        add(&store, "||two.example.org^");
        assert!(store
            .find_match("two.example.org", Polarity::Block, false)
            .is_some());
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_concurrent_insert_and_query() {
        let store = Arc::new(RuleStore::new());
        let mut handles = Vec::new();
        for worker in 0..4 {
            let store = Arc::clone(&store);
            handles.push(std::thread::spawn(move || {
                for i in 0..100 {
                    let line = format!("||w{}-{}.example.org^", worker, i);
                    let rule = parse_rule(&line, 0).unwrap().unwrap();
                    store.add(rule).unwrap();
                    // Every rule inserted before this query must be found.
                    let host = format!("w{}-{}.example.org", worker, i);
                    assert!(store.find_match(&host, Polarity::Block, false).is_some());
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(store.len(), 400);
    }
}
