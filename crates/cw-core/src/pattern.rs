//! Domain pattern matching
//!
//! A pattern is either an exact hostname (`example.com`) or a wildcard
//! (`*.example.com`) that covers the base domain and every subdomain of it.
//!
//! # Examples
//!
//! ```
//! use cw_core::pattern::matches_domain;
//!
//! assert!(matches_domain("shop.example.com", "*.example.com"));
//! assert!(matches_domain("example.com", "*.example.com"));
//! assert!(!matches_domain("notexample.com", "*.example.com"));
//! ```

use std::sync::LazyLock;

use regex::Regex;

/// Prefix that marks a wildcard pattern.
pub const WILDCARD_PREFIX: &str = "*.";

static PATTERN_SYNTAX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\*\.)?[a-z0-9]+([-.][a-z0-9]+)*\.[a-z]{2,}$").expect("pattern syntax regex")
});

/// Error type for pattern normalization.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PatternError {
    #[error("Empty domain pattern")]
    Empty,
    #[error("Invalid domain pattern '{0}': use example.com or *.example.com")]
    Invalid(String),
}

/// Check if `domain` matches `pattern`.
///
/// Wildcards require a label boundary: `*.example.com` matches
/// `example.com` and `a.example.com`, never `notexample.com`.
#[inline]
pub fn matches_domain(domain: &str, pattern: &str) -> bool {
    match pattern.strip_prefix(WILDCARD_PREFIX) {
        Some(base) => {
            if domain.len() == base.len() {
                return domain == base;
            }
            domain.len() > base.len()
                && domain.ends_with(base)
                && domain.as_bytes()[domain.len() - base.len() - 1] == b'.'
        }
        None => domain == pattern,
    }
}

/// True if the pattern carries the wildcard prefix.
#[inline]
pub fn is_wildcard(pattern: &str) -> bool {
    pattern.starts_with(WILDCARD_PREFIX)
}

/// The domain a pattern is rooted at (`*.example.com` -> `example.com`).
#[inline]
pub fn pattern_base(pattern: &str) -> &str {
    pattern.strip_prefix(WILDCARD_PREFIX).unwrap_or(pattern)
}

/// Trim, lowercase and validate user input before it is stored in a list.
pub fn normalize_pattern(raw: &str) -> Result<String, PatternError> {
    let pattern = raw.trim().to_lowercase();
    if pattern.is_empty() {
        return Err(PatternError::Empty);
    }
    if !PATTERN_SYNTAX.is_match(&pattern) {
        return Err(PatternError::Invalid(pattern));
    }
    Ok(pattern)
}
