//! Whitelist / blacklist membership

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::pattern::{matches_domain, normalize_pattern, PatternError};

/// Check if `domain` matches any pattern in `list`.
///
/// An empty list never matches.
#[inline]
pub fn is_in_list<S: AsRef<str>>(domain: &str, list: &[S]) -> bool {
    list.iter().any(|pattern| matches_domain(domain, pattern.as_ref()))
}

/// Error type for list edits.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ListError {
    #[error(transparent)]
    Pattern(#[from] PatternError),
    #[error("Domain '{0}' is already in the list")]
    Duplicate(String),
    #[error("Domain '{0}' is not in the list")]
    NotFound(String),
}

/// Which user list an edit applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum ListKind {
    Whitelist,
    Blacklist,
}

impl ListKind {
    /// Settings key holding the list.
    pub fn key(&self) -> &'static str {
        match self {
            Self::Whitelist => "whitelist",
            Self::Blacklist => "blacklist",
        }
    }
}

/// Ordered set of domain patterns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DomainList(Vec<String>);

impl DomainList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap already-stored patterns as-is.
    pub fn from_patterns<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(patterns.into_iter().map(Into::into).collect())
    }

    /// Check if `domain` matches any pattern.
    #[inline]
    pub fn contains(&self, domain: &str) -> bool {
        is_in_list(domain, &self.0)
    }

    /// First pattern that matches `domain`, for logging.
    pub fn matching_pattern(&self, domain: &str) -> Option<&str> {
        self.0
            .iter()
            .map(String::as_str)
            .find(|pattern| matches_domain(domain, pattern))
    }

    /// Normalize and append a pattern. Returns the stored form.
    pub fn insert(&mut self, raw: &str) -> Result<&str, ListError> {
        let pattern = normalize_pattern(raw)?;
        if self.0.contains(&pattern) {
            return Err(ListError::Duplicate(pattern));
        }
        self.0.push(pattern);
        Ok(&self.0[self.0.len() - 1])
    }

    /// Remove a stored pattern by exact value.
    pub fn remove(&mut self, pattern: &str) -> Result<(), ListError> {
        let needle = pattern.trim().to_lowercase();
        let before = self.0.len();
        self.0.retain(|p| *p != needle);
        if self.0.len() == before {
            return Err(ListError::NotFound(needle));
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}
