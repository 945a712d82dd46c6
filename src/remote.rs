//! Hash-prefix lookups against the remote categorization service.
//!
//! A hostname is expanded into its lookup names (the host plus every suffix
//! keeping at least two labels), each name is hashed with SHA-256, and the
//! 4-byte hash prefixes are sent to the service. The response lists full
//! hashes with category codes; only a full-hash match marks a name. Fresh
//! verdicts come from the shared cache; a miss issues at most one upstream
//! request per distinct prefix set at a time.

use parking_lot::RwLock;
use sha2::{Digest, Sha256};
use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Duration;

use crate::cache::ClassificationCache;
use crate::error::{Error, Result};
use crate::singleflight::SingleFlight;
use crate::verdict::Reason;

/// Default request timeout for upstream lookups.
pub(crate) const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

pub(crate) const DEFAULT_SAFE_BROWSING_SERVER: &str = "https://sb.adtidy.org";
pub(crate) const DEFAULT_PARENTAL_SERVER: &str = "https://pctrl.adtidy.org";

/// Category of a remote lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    SafeBrowsing,
    Parental,
}

impl Category {
    fn path(&self) -> &'static str {
        match self {
            Category::SafeBrowsing => "safebrowsing",
            Category::Parental => "parental",
        }
    }

    fn reason(&self) -> Reason {
        match self {
            Category::SafeBrowsing => Reason::FilteredSafeBrowsing,
            Category::Parental => Reason::FilteredParental,
        }
    }
}

/// One `FULLHASH:CATEGORY` pair from a service response.
#[derive(Debug, Clone, PartialEq, Eq)]
struct HashMatch {
    hash: String,
    category: u32,
}

/// Shared outcome of one coalesced lookup.
#[derive(Debug, Clone, Copy)]
enum FlightOutcome {
    Decided(bool),
    Failed,
}

/// Classifier for one category, backed by a shared verdict cache.
pub(crate) struct RemoteClassifier {
    category: Category,
    cache: Arc<ClassificationCache>,
    flights: SingleFlight<FlightOutcome>,
    server: RwLock<String>,
    timeout: RwLock<Duration>,
}

impl RemoteClassifier {
    pub(crate) fn new(
        category: Category,
        cache: Arc<ClassificationCache>,
        server: &str,
    ) -> Self {
        Self {
            category,
            cache,
            flights: SingleFlight::new(),
            server: RwLock::new(server.to_string()),
            timeout: RwLock::new(DEFAULT_TIMEOUT),
        }
    }

    pub(crate) fn cache(&self) -> &Arc<ClassificationCache> {
        &self.cache
    }

    pub(crate) fn set_server(&self, addr: &str) -> Result<()> {
        let addr = addr.trim();
        if addr.is_empty() || addr.contains(char::is_whitespace) {
            return Err(Error::Config(format!("invalid server address: {:?}", addr)));
        }
        *self.server.write() = addr.to_string();
        Ok(())
    }

    pub(crate) fn set_timeout(&self, timeout: Duration) -> Result<()> {
        if timeout.is_zero() {
            return Err(Error::Config("timeout must be positive".to_string()));
        }
        *self.timeout.write() = timeout;
        Ok(())
    }

    /// Whether `host` is flagged in this category.
    ///
    /// `sensitivity` only applies to the Parental category: a returned
    /// category code filters when the configured sensitivity is at least
    /// the code.
    pub(crate) fn check(&self, host: &str, sensitivity: u32) -> Result<bool> {
        // IP literals have no useful suffix set; only explicit rules apply.
        if host.parse::<std::net::Ipv4Addr>().is_ok() {
            return Ok(false);
        }
        let names = lookup_names(host);

        if let Some(decision) = self.cached_decision(&names) {
            self.cache.stats().record_cache_hit();
            return Ok(decision);
        }

        let digests: Vec<(String, String)> = names
            .iter()
            .map(|name| (name.clone(), hash_hex(name)))
            .collect();
        let mut prefixes: Vec<&str> = digests.iter().map(|(_, hex)| &hex[..8]).collect();
        prefixes.sort_unstable();
        prefixes.dedup();
        let key = prefixes.join(",");
        let url = format!("{}/{}/{}", self.endpoint(), self.category.path(), key);

        let outcome = self.flights.run(&key, || {
            // An earlier flight for this prefix set may have landed while
            // this caller was joining; its cached verdicts decide.
            if let Some(decision) = self.cached_decision(&names) {
                return FlightOutcome::Decided(decision);
            }
            self.cache.stats().record_request();
            match self.fetch(&url) {
                Ok(matches) => {
                    FlightOutcome::Decided(self.store_matches(&digests, &matches, sensitivity))
                }
                Err(e) => {
                    log::warn!("{} lookup failed: {}", self.category.path(), e);
                    FlightOutcome::Failed
                }
            }
        });

        match outcome {
            FlightOutcome::Decided(filtered) => Ok(filtered),
            FlightOutcome::Failed => Err(Error::Transport(format!(
                "{} lookup failed",
                self.category.path()
            ))),
        }
    }

    /// Decision from the cache alone: a fresh positive decides immediately,
    /// negatives decide only when every lookup name is covered.
    fn cached_decision(&self, names: &[String]) -> Option<bool> {
        let mut all_negative = true;
        for name in names {
            match self.cache.get(name) {
                Some(entry) if entry.filtered => return Some(true),
                Some(_) => {}
                None => all_negative = false,
            }
        }
        all_negative.then_some(false)
    }

    /// Record per-name verdicts from a service response; returns whether
    /// any lookup name was flagged.
    fn store_matches(
        &self,
        digests: &[(String, String)],
        matches: &[HashMatch],
        sensitivity: u32,
    ) -> bool {
        let mut filtered = false;
        for (name, full_hex) in digests {
            let hit = matches
                .iter()
                .any(|m| m.hash == *full_hex && self.applies(m.category, sensitivity));
            if hit {
                self.cache.put(name, true, self.category.reason());
                filtered = true;
            } else {
                self.cache.put(name, false, Reason::NotFilteredNotFound);
            }
        }
        filtered
    }

    fn applies(&self, category: u32, sensitivity: u32) -> bool {
        match self.category {
            Category::SafeBrowsing => true,
            Category::Parental => sensitivity >= category,
        }
    }

    fn endpoint(&self) -> String {
        let server = self.server.read().clone();
        if server.contains("://") {
            server
        } else {
            format!("http://{}", server)
        }
    }

    /// One request with a single retry on transport error.
    fn fetch(&self, url: &str) -> Result<Vec<HashMatch>> {
        let timeout = *self.timeout.read();
        let mut last_err = Error::Transport("no attempt made".to_string());
        for attempt in 1..=2 {
            match fetch_once(url, timeout) {
                Ok(matches) => return Ok(matches),
                Err(e) => {
                    log::warn!("lookup attempt {} failed: {}", attempt, e);
                    last_err = e;
                }
            }
        }
        Err(last_err)
    }
}

fn fetch_once(url: &str, timeout: Duration) -> Result<Vec<HashMatch>> {
    let response = ureq::get(url)
        .timeout(timeout)
        .call()
        .map_err(|e| Error::Transport(e.to_string()))?;
    // Only a plain 200 carries a verdict body; anything else (204, 206,
    // a followed redirect that resolved oddly) is a transport error.
    if response.status() != 200 {
        return Err(Error::Transport(format!(
            "unexpected status: {}",
            response.status()
        )));
    }
    let body = response
        .into_string()
        .map_err(|e| Error::Transport(e.to_string()))?;
    parse_response(&body)
}

/// Parse a response body of `FULLHASH:CATEGORY` lines.
fn parse_response(body: &str) -> Result<Vec<HashMatch>> {
    let mut matches = Vec::new();
    for line in body.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let (hash, category) = line
            .split_once(':')
            .ok_or_else(|| Error::Transport(format!("malformed response line: {:?}", line)))?;
        if hash.len() != 64 || !hash.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(Error::Transport(format!("malformed hash: {:?}", hash)));
        }
        let category: u32 = category
            .trim()
            .parse()
            .map_err(|_| Error::Transport(format!("malformed category: {:?}", category)))?;
        matches.push(HashMatch {
            hash: hash.to_ascii_lowercase(),
            category,
        });
    }
    Ok(matches)
}

/// The host itself plus every suffix that still has at least two labels.
fn lookup_names(host: &str) -> Vec<String> {
    let mut names = vec![host.to_string()];
    let mut rest = host;
    while let Some(pos) = rest.find('.') {
        rest = &rest[pos + 1..];
        if rest.contains('.') {
            names.push(rest.to_string());
        }
    }
    names
}

/// Lowercase hex SHA-256 of a lookup name.
fn hash_hex(name: &str) -> String {
    let digest = Sha256::digest(name.as_bytes());
    let mut out = String::with_capacity(64);
    for byte in digest {
        let _ = write!(out, "{:02x}", byte);
    }
    out
}
