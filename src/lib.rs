//! dnssieve - a DNS-level content filter engine.
//!
//! This crate decides whether a hostname should be blocked, allowed, or
//! rewritten, and why. It sits inside a DNS resolver between the query
//! parser and the upstream resolver.
//!
//! # Features
//!
//! - **Filter-list rules**: hosts-file mask syntax, anchored domain
//!   patterns, full regular expressions, exception (`@@`) and
//!   `$important` override modifiers
//! - **Combined matching**: tens of thousands of rules compile into one
//!   regex set, so a query costs roughly the same at any scale
//! - **Safe-Browsing / Parental**: privacy-preserving hash-prefix lookups
//!   against a categorization service, with shared positive/negative
//!   caching and in-flight request de-duplication
//! - **Safe-Search**: rewrites known search-engine hosts to their
//!   force-safe equivalents
//! - **Thread-safe**: rule ingestion and host checks may run in parallel
//!
//! # Quick Start
//!
//! ```
//! use dnssieve::{Engine, Reason};
//!
//! let engine = Engine::new();
//! engine.add_rule("||doubleclick.net^", 0).unwrap();
//! engine.add_rule("@@||good.doubleclick.net^", 0).unwrap();
//!
//! let verdict = engine.check_host("ads.doubleclick.net");
//! assert!(verdict.is_filtered);
//! assert_eq!(verdict.reason, Reason::FilteredBlackList);
//!
//! let verdict = engine.check_host("good.doubleclick.net");
//! assert_eq!(verdict.reason, Reason::NotFilteredWhiteList);
//! ```
//!
//! # Remote classification
//!
//! Safe-Browsing and Parental checks hash every lookup name with SHA-256
//! and send only 4-byte hash prefixes upstream. Verdicts land in two
//! process-wide caches shared by all engines, and concurrent lookups for
//! the same prefix set share a single HTTP request:
//!
//! ```no_run
//! use dnssieve::Engine;
//!
//! let engine = Engine::new();
//! engine.enable_safe_browsing();
//! engine.enable_parental(3);
//!
//! let verdict = engine.check_host("wmconvirus.narod.ru");
//! if verdict.is_filtered {
//!     println!("blocked: {}", verdict.reason);
//! }
//! ```

mod cache;
mod engine;
mod error;
mod remote;
mod rule;
mod safesearch;
mod singleflight;
mod stats;
mod verdict;

pub use cache::{purge_caches, CacheEntry, ClassificationCache, PARENTAL_CACHE, SAFE_BROWSING_CACHE};
pub use engine::Engine;
pub use error::{Error, Result};
pub use remote::Category;
pub use rule::{CompiledRule, Polarity, RuleStore};
pub use stats::LookupStats;
pub use verdict::{Reason, Verdict};
