//! Lowering of filter-list pattern bodies to regular expressions.

use crate::error::{Error, Result};

/// Left boundary for `||` rules: start of the host or a subdomain boundary.
const HOST_START: &str = r"^([a-z0-9-_.]+\.)?";

/// Right boundary: any non-hostname character or end of input.
const HOST_END: &str = r"([^ a-zA-Z0-9.%]|$)";

/// Characters that must be escaped when a pattern body is lowered.
fn is_special(ch: char) -> bool {
    matches!(
        ch,
        '.' | '+' | '?' | '(' | ')' | '{' | '}' | '[' | ']' | '\\' | '|' | '#' | '$'
    )
}

/// Escape a pattern body. `*` is the wildcard, `^` the separator mark.
fn escape_body(body: &str) -> String {
    let mut out = String::with_capacity(body.len() * 2);
    for ch in body.chars() {
        match ch {
            '*' => out.push_str(".*"),
            '^' => out.push_str(HOST_END),
            c if is_special(c) => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out
}

/// Convert one pattern body to its canonical regular expression.
///
/// The body is the rule line after the allow marker and options have been
/// stripped. Returns [`Error::InvalidSyntax`] for empty bodies and empty
/// regex literals.
pub(crate) fn rule_to_regexp(body: &str) -> Result<String> {
    if body.is_empty() || body == "/" {
        return Err(Error::InvalidSyntax);
    }

    // Regex literal: the content between slashes is used verbatim.
    if body.len() >= 2 && body.starts_with('/') && body.ends_with('/') {
        let inner = &body[1..body.len() - 1];
        if inner.is_empty() {
            return Err(Error::InvalidSyntax);
        }
        return Ok(inner.to_string());
    }

    // Domain anchor: matches the domain itself and any subdomain, up to a
    // separator or the end of the host.
    if let Some(rest) = body.strip_prefix("||") {
        let rest = rest.strip_suffix('^').unwrap_or(rest);
        return Ok(format!("{}{}{}", HOST_START, escape_body(rest), HOST_END));
    }

    let mut rest = body;
    let mut pattern = String::new();
    let left_anchor = if let Some(stripped) = rest.strip_prefix('|') {
        rest = stripped;
        true
    } else {
        false
    };
    let right_anchor = if let Some(stripped) = rest.strip_suffix('|') {
        rest = stripped;
        true
    } else {
        false
    };

    if left_anchor {
        pattern.push('^');
    }
    pattern.push_str(&escape_body(rest));
    if right_anchor {
        pattern.push('$');
    }
    Ok(pattern)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regex_literal() {
        assert_eq!(rule_to_regexp("/doubleclick/").unwrap(), "doubleclick");
        assert_eq!(
            rule_to_regexp(r"/example\.org/").unwrap(),
            r"example\.org"
        );
    }

    #[test]
    fn test_empty_regex_literal_rejected() {
        assert!(matches!(rule_to_regexp("/"), Err(Error::InvalidSyntax)));
        assert!(matches!(rule_to_regexp("//"), Err(Error::InvalidSyntax)));
        assert!(matches!(rule_to_regexp(""), Err(Error::InvalidSyntax)));
    }

    #[test]
    fn test_domain_anchor() {
        assert_eq!(
            rule_to_regexp("||doubleclick.net^").unwrap(),
            r"^([a-z0-9-_.]+\.)?doubleclick\.net([^ a-zA-Z0-9.%]|$)"
        );
        assert_eq!(
            rule_to_regexp("||test.example.org").unwrap(),
            r"^([a-z0-9-_.]+\.)?test\.example\.org([^ a-zA-Z0-9.%]|$)"
        );
    }

    #[test]
    fn test_both_anchors_and_escaping() {
        assert_eq!(
            rule_to_regexp(r"|double*?.+[]|(){}#$\|").unwrap(),
            r"^double.*\?\.\+\[\]\|\(\)\{\}\#\$\\$"
        );
    }

    #[test]
    fn test_left_anchor() {
        assert_eq!(rule_to_regexp("|example.org").unwrap(), r"^example\.org");
    }

    #[test]
    fn test_right_anchor() {
        assert_eq!(rule_to_regexp("example.org|").unwrap(), r"example\.org$");
    }

    #[test]
    fn test_mask() {
        assert_eq!(
            rule_to_regexp("test*.example.org^").unwrap(),
            r"test.*\.example\.org([^ a-zA-Z0-9.%]|$)"
        );
        assert_eq!(rule_to_regexp("exam*.com").unwrap(), r"exam.*\.com");
    }
}
