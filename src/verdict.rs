//! Classification verdicts returned by the engine.

use std::fmt;

/// Reason describes why a hostname was, or was not, filtered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum Reason {
    /// No rule or remote category matched
    #[default]
    NotFilteredNotFound = 0,
    /// An exception (allow) rule matched
    NotFilteredWhiteList = 1,
    /// The remote classification service could not be consulted
    NotFilteredError = 2,
    /// A block rule matched
    FilteredBlackList = 3,
    /// The Safe-Browsing service flagged the host
    FilteredSafeBrowsing = 4,
    /// The Parental service flagged the host
    FilteredParental = 5,
    /// The hostname failed normalization
    FilteredInvalid = 6,
    /// A Safe-Search rewrite applies
    FilteredSafeSearch = 7,
}

impl Reason {
    /// Get the string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Reason::NotFilteredNotFound => "NotFilteredNotFound",
            Reason::NotFilteredWhiteList => "NotFilteredWhiteList",
            Reason::NotFilteredError => "NotFilteredError",
            Reason::FilteredBlackList => "FilteredBlackList",
            Reason::FilteredSafeBrowsing => "FilteredSafeBrowsing",
            Reason::FilteredParental => "FilteredParental",
            Reason::FilteredInvalid => "FilteredInvalid",
            Reason::FilteredSafeSearch => "FilteredSafeSearch",
        }
    }

    /// Whether this reason marks the host as filtered.
    pub fn is_filtered(&self) -> bool {
        matches!(
            self,
            Reason::FilteredBlackList
                | Reason::FilteredSafeBrowsing
                | Reason::FilteredParental
                | Reason::FilteredInvalid
                | Reason::FilteredSafeSearch
        )
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Reason {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NotFilteredNotFound" => Ok(Reason::NotFilteredNotFound),
            "NotFilteredWhiteList" => Ok(Reason::NotFilteredWhiteList),
            "NotFilteredError" => Ok(Reason::NotFilteredError),
            "FilteredBlackList" => Ok(Reason::FilteredBlackList),
            "FilteredSafeBrowsing" => Ok(Reason::FilteredSafeBrowsing),
            "FilteredParental" => Ok(Reason::FilteredParental),
            "FilteredInvalid" => Ok(Reason::FilteredInvalid),
            "FilteredSafeSearch" => Ok(Reason::FilteredSafeSearch),
            _ => Err(()),
        }
    }
}

/// The structured decision for one hostname.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Verdict {
    /// Whether the query should be blocked or rewritten.
    pub is_filtered: bool,
    /// Why the decision was made.
    pub reason: Reason,
    /// Original text of the rule that decided the verdict, if any.
    pub rule: Option<String>,
    /// Replacement hostname for Safe-Search rewrites.
    pub rewrite_to: Option<String>,
}

impl Verdict {
    pub(crate) fn with_reason(reason: Reason) -> Self {
        Self {
            is_filtered: reason.is_filtered(),
            reason,
            rule: None,
            rewrite_to: None,
        }
    }

    pub(crate) fn with_rule(reason: Reason, rule: String) -> Self {
        Self {
            is_filtered: reason.is_filtered(),
            reason,
            rule: Some(rule),
            rewrite_to: None,
        }
    }
}
