//! Core type definitions for CookieWipe
//!
//! These types cross the boundary to the extension's JavaScript, so they
//! serialize with the same camelCase names the browser APIs use.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Browser tab identifier.
pub type TabId = i32;

// =============================================================================
// Cleanup Mode
// =============================================================================

/// When tracker/blacklisted cookies are removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum CleanupMode {
    /// Delete as soon as the cookie is created
    Immediate,
    /// Leave the cookie until its tab closes
    #[default]
    Deferred,
}

impl CleanupMode {
    /// Parse a stored mode string. Unknown values are `None`.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "immediate" => Some(Self::Immediate),
            "deferred" => Some(Self::Deferred),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Immediate => "immediate",
            Self::Deferred => "deferred",
        }
    }
}

// =============================================================================
// Decisions
// =============================================================================

/// What the policy engine wants done.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub enum Verdict {
    /// Keep everything
    Allow,
    /// Delete every cookie of the domain
    DeleteDomain,
    /// Delete the single cookie that triggered the event
    DeleteCookie,
    /// Keep the cookie for now; tab close decides
    Retain,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Allow => "allow",
            Self::DeleteDomain => "deleteDomain",
            Self::DeleteCookie => "deleteCookie",
            Self::Retain => "retain",
        }
    }
}

/// Which rule produced a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Reason {
    Whitelisted,
    Blacklisted,
    Tracker,
    #[serde(rename = "none")]
    Unlisted,
}

impl Reason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Whitelisted => "whitelisted",
            Self::Blacklisted => "blacklisted",
            Self::Tracker => "tracker",
            Self::Unlisted => "none",
        }
    }
}

/// Result of a policy evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Decision {
    pub verdict: Verdict,
    pub reason: Reason,
}

impl Decision {
    pub const fn new(verdict: Verdict, reason: Reason) -> Self {
        Self { verdict, reason }
    }

    pub const fn allow(reason: Reason) -> Self {
        Self::new(Verdict::Allow, reason)
    }

    pub const fn retain(reason: Reason) -> Self {
        Self::new(Verdict::Retain, reason)
    }

    /// True for `DeleteDomain` and `DeleteCookie`.
    pub fn is_delete(&self) -> bool {
        matches!(self.verdict, Verdict::DeleteDomain | Verdict::DeleteCookie)
    }
}

impl Default for Decision {
    fn default() -> Self {
        Self::allow(Reason::Unlisted)
    }
}

// =============================================================================
// Cookies
// =============================================================================

/// A cookie as reported by the browser's cookie store.
///
/// Never created by the engine itself; it is only read and referenced when
/// asking the store to remove it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CookieRecord {
    pub name: String,
    /// Cookie domain, possibly with a leading dot (`.example.com`)
    pub domain: String,
    #[serde(default = "default_path")]
    pub path: String,
    #[serde(default)]
    pub secure: bool,
    #[serde(default)]
    pub http_only: bool,
    #[serde(default)]
    pub store_id: String,
}

fn default_path() -> String {
    "/".to_string()
}

impl CookieRecord {
    pub fn new(name: &str, domain: &str) -> Self {
        Self {
            name: name.to_string(),
            domain: domain.to_string(),
            path: default_path(),
            secure: false,
            http_only: false,
            store_id: String::new(),
        }
    }

    /// Domain with any leading dot removed.
    pub fn bare_domain(&self) -> &str {
        self.domain.strip_prefix('.').unwrap_or(&self.domain)
    }

    /// URL the cookie store needs to locate this cookie.
    pub fn removal_url(&self) -> String {
        let scheme = if self.secure { "https" } else { "http" };
        format!("{}://{}{}", scheme, self.bare_domain(), self.path)
    }

    /// Arguments for `CookieStore::remove`.
    pub fn removal(&self) -> CookieRemoval {
        CookieRemoval {
            url: self.removal_url(),
            name: self.name.clone(),
            store_id: self.store_id.clone(),
        }
    }
}

/// Identifies one cookie for removal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CookieRemoval {
    pub url: String,
    pub name: String,
    pub store_id: String,
}

// =============================================================================
// Presentation hints
// =============================================================================

/// Badge background colour for a tab's domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum BadgeColor {
    Whitelisted,
    Blacklisted,
    Tracker,
    Neutral,
}

impl BadgeColor {
    /// CSS colour code passed to the browser action API.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Whitelisted => "#4CAF50",
            Self::Blacklisted => "#f44336",
            Self::Tracker => "#ff9800",
            Self::Neutral => "#2196F3",
        }
    }
}

/// Style of a transient in-page notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum NotificationKind {
    Info,
    Success,
    Blocked,
}
