//! Filter-list rules: parsing, compilation, and storage.

mod compile;
mod store;

pub use store::RuleStore;

pub(crate) use compile::rule_to_regexp;

use crate::error::{Error, Result};

/// Polarity of a rule: block, or allow (exception).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    Block,
    Allow,
}

/// One compiled filter rule.
///
/// Rules are immutable once inserted into a [`RuleStore`].
#[derive(Debug, Clone)]
pub struct CompiledRule {
    /// Original line, kept for diagnostics and verdicts.
    pub text: String,
    pub polarity: Polarity,
    /// Whether the rule carries the `$important` override.
    pub important: bool,
    /// Canonical regular expression the pattern body lowered to.
    pub pattern: String,
    /// Identifier of the source filter list.
    pub filter_id: i64,
}

/// Split a rule body on the last unescaped `$`, yielding the pattern part
/// and the options part.
fn split_options(body: &str) -> Option<(&str, &str)> {
    let bytes = body.as_bytes();
    let mut split_at = None;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 1,
            b'$' => split_at = Some(i),
            _ => {}
        }
        i += 1;
    }
    split_at.map(|i| (&body[..i], &body[i + 1..]))
}

/// Parse one filter-list line.
///
/// Returns `Ok(None)` when the line carries `$badfilter` (the rule is
/// dropped), `Err(InvalidSyntax)` for comments, cosmetic rules, and any
/// option that does not apply to hostname filtering.
pub(crate) fn parse_rule(line: &str, filter_id: i64) -> Result<Option<CompiledRule>> {
    let text = line.trim();
    if text.is_empty() || text.starts_with('!') || text.starts_with('#') {
        return Err(Error::InvalidSyntax);
    }
    // Cosmetic rules have no meaning for hostnames.
    if text.contains("$$") {
        return Err(Error::InvalidSyntax);
    }

    let mut body = text;
    let mut polarity = Polarity::Block;
    if let Some(rest) = body.strip_prefix("@@") {
        polarity = Polarity::Allow;
        body = rest;
    }

    let mut important = false;
    let mut badfilter = false;
    if let Some((pattern_part, options)) = split_options(body) {
        body = pattern_part;
        // Validate the whole options list before acting on any of it, so
        // an unrecognized option rejects the rule even next to $badfilter.
        for option in options.split(',') {
            match option {
                "important" => important = true,
                "badfilter" => badfilter = true,
                _ => return Err(Error::InvalidSyntax),
            }
        }
    }
    if badfilter {
        return Ok(None);
    }

    let pattern = rule_to_regexp(body)?;
    Ok(Some(CompiledRule {
        text: text.to_string(),
        polarity,
        important,
        pattern,
        filter_id,
    }))
}
