//! Policy Engine
//!
//! Combines the whitelist, blacklist, enabled tracker presets and cookie name
//! classification into a cleanup decision. A `Policy` borrows one settings
//! snapshot and is cheap to build per event.
//!
//! Precedence, highest first:
//!
//! 1. whitelist (never delete)
//! 2. blacklist
//! 3. enabled tracker presets

use crate::cookie::{is_preference_cookie, is_tracking_cookie};
use crate::settings::Settings;
use crate::types::{BadgeColor, CleanupMode, CookieRecord, Decision, Reason, Verdict};

// =============================================================================
// Policy
// =============================================================================

/// Decision maker over one settings snapshot.
#[derive(Debug, Clone, Copy)]
pub struct Policy<'a> {
    settings: &'a Settings,
}

impl<'a> Policy<'a> {
    pub fn new(settings: &'a Settings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &'a Settings {
        self.settings
    }

    #[inline]
    pub fn is_whitelisted(&self, domain: &str) -> bool {
        self.settings.whitelist.contains(domain)
    }

    #[inline]
    pub fn is_blacklisted(&self, domain: &str) -> bool {
        self.settings.blacklist.contains(domain)
    }

    /// Check if `domain` is covered by an enabled tracker preset.
    #[inline]
    pub fn is_tracker_domain(&self, domain: &str) -> bool {
        self.settings.tracker_presets.matches(domain)
    }

    /// Decide for a domain, or for a single cookie event when `cookie` is set.
    pub fn decide(&self, domain: &str, cookie: Option<&CookieRecord>) -> Decision {
        match cookie {
            Some(cookie) => self.decide_cookie(cookie.bare_domain(), &cookie.name),
            None => self.decide_domain(domain),
        }
    }

    /// Domain-level decision, used when a tab closes.
    pub fn decide_domain(&self, domain: &str) -> Decision {
        if self.is_whitelisted(domain) {
            return Decision::allow(Reason::Whitelisted);
        }
        if self.is_blacklisted(domain) {
            return Decision::new(Verdict::DeleteDomain, Reason::Blacklisted);
        }
        if self.is_tracker_domain(domain) {
            return Decision::new(Verdict::DeleteDomain, Reason::Tracker);
        }
        Decision::allow(Reason::Unlisted)
    }

    /// Cookie-level decision, used when a cookie is created.
    ///
    /// Blacklist membership alone is enough to delete. A tracker preset match
    /// also needs a tracker-looking name, so first-party cookies on a
    /// tracker's own domain survive until the tab closes.
    pub fn decide_cookie(&self, cookie_domain: &str, cookie_name: &str) -> Decision {
        let domain = cookie_domain.strip_prefix('.').unwrap_or(cookie_domain);

        if self.is_whitelisted(domain) {
            return Decision::allow(Reason::Whitelisted);
        }

        let is_blacklisted = self.is_blacklisted(domain);
        let is_domain_tracker = self.is_tracker_domain(domain);
        let is_cookie_tracker = is_tracking_cookie(cookie_name);

        let reason = if is_blacklisted {
            Reason::Blacklisted
        } else if is_domain_tracker {
            Reason::Tracker
        } else {
            return Decision::allow(Reason::Unlisted);
        };

        let should_block = is_blacklisted || (is_domain_tracker && is_cookie_tracker);
        if should_block && self.settings.cleanup_mode == CleanupMode::Immediate {
            Decision::new(Verdict::DeleteCookie, reason)
        } else {
            Decision::retain(reason)
        }
    }

    /// Split a domain's cookies per the `retainPreferences` setting.
    pub fn plan_cleanup<'c>(&self, cookies: &'c [CookieRecord]) -> CleanupPlan<'c> {
        plan_cleanup(cookies, self.settings.retain_preferences)
    }

    /// Badge colour, in the same precedence as `decide_domain`.
    pub fn badge_color(&self, domain: &str) -> BadgeColor {
        let decision = self.decide_domain(domain);
        match decision.reason {
            Reason::Whitelisted => BadgeColor::Whitelisted,
            Reason::Blacklisted => BadgeColor::Blacklisted,
            Reason::Tracker => BadgeColor::Tracker,
            Reason::Unlisted => BadgeColor::Neutral,
        }
    }
}

// =============================================================================
// Retention
// =============================================================================

/// Which of a domain's cookies to delete and which to keep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupPlan<'c> {
    pub delete: Vec<&'c CookieRecord>,
    pub retain: Vec<&'c CookieRecord>,
}

impl CleanupPlan<'_> {
    pub fn is_empty(&self) -> bool {
        self.delete.is_empty() && self.retain.is_empty()
    }
}

/// Partition cookies for a domain-wide deletion.
///
/// With `retain_preferences`, preference-named cookies are kept.
pub fn plan_cleanup(cookies: &[CookieRecord], retain_preferences: bool) -> CleanupPlan<'_> {
    let (retain, delete): (Vec<&CookieRecord>, Vec<&CookieRecord>) = cookies
        .iter()
        .partition(|cookie| retain_preferences && is_preference_cookie(&cookie.name));
    CleanupPlan { delete, retain }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::list::DomainList;
    use crate::presets::{TrackerPreset, TrackerPresetSet};

    fn settings_with_google(mode: CleanupMode) -> Settings {
        let mut presets = TrackerPresetSet::new();
        presets.set(TrackerPreset::Google, true);
        Settings {
            enabled: true,
            cleanup_mode: mode,
            tracker_presets: presets,
            ..Settings::default()
        }
    }

    #[test]
    fn test_domain_decision_order() {
        let settings = Settings {
            whitelist: DomainList::from_patterns(["*.example.com"]),
            blacklist: DomainList::from_patterns(["ads.example.net"]),
            ..settings_with_google(CleanupMode::Deferred)
        };
        let policy = Policy::new(&settings);

        assert_eq!(policy.decide_domain("shop.example.com"), Decision::allow(Reason::Whitelisted));
        assert_eq!(
            policy.decide_domain("ads.example.net"),
            Decision::new(Verdict::DeleteDomain, Reason::Blacklisted)
        );
        assert_eq!(
            policy.decide_domain("stats.g.doubleclick.net"),
            Decision::new(Verdict::DeleteDomain, Reason::Tracker)
        );
        assert_eq!(policy.decide_domain("news.example.org"), Decision::allow(Reason::Unlisted));
    }

    #[test]
    fn test_whitelist_beats_blacklist_and_presets() {
        let settings = Settings {
            whitelist: DomainList::from_patterns(["*.google-analytics.com"]),
            blacklist: DomainList::from_patterns(["www.google-analytics.com"]),
            ..settings_with_google(CleanupMode::Immediate)
        };
        let policy = Policy::new(&settings);

        assert_eq!(
            policy.decide_domain("www.google-analytics.com"),
            Decision::allow(Reason::Whitelisted)
        );
        assert_eq!(
            policy.decide_cookie(".www.google-analytics.com", "_ga"),
            Decision::allow(Reason::Whitelisted)
        );
        assert_eq!(policy.badge_color("www.google-analytics.com"), BadgeColor::Whitelisted);
    }

    #[test]
    fn test_tracker_cookie_immediate_vs_deferred() {
        let immediate = settings_with_google(CleanupMode::Immediate);
        let cookie = CookieRecord::new("_ga", ".google-analytics.com");
        assert_eq!(
            Policy::new(&immediate).decide("google-analytics.com", Some(&cookie)),
            Decision::new(Verdict::DeleteCookie, Reason::Tracker)
        );

        let deferred = settings_with_google(CleanupMode::Deferred);
        assert_eq!(
            Policy::new(&deferred).decide("google-analytics.com", Some(&cookie)),
            Decision::retain(Reason::Tracker)
        );
    }

    #[test]
    fn test_tracker_domain_needs_tracker_name() {
        let settings = settings_with_google(CleanupMode::Immediate);
        let policy = Policy::new(&settings);

        assert_eq!(
            policy.decide_cookie("www.google-analytics.com", "_ga"),
            Decision::new(Verdict::DeleteCookie, Reason::Tracker)
        );
        assert_eq!(
            policy.decide_cookie("www.google-analytics.com", "random_custom"),
            Decision::retain(Reason::Tracker)
        );
    }

    #[test]
    fn test_tracker_name_on_unlisted_domain_is_allowed() {
        let settings = settings_with_google(CleanupMode::Immediate);
        assert_eq!(
            Policy::new(&settings).decide_cookie(".myblog.example", "_ga"),
            Decision::allow(Reason::Unlisted)
        );
    }

    #[test]
    fn test_blacklist_alone_deletes_cookie() {
        let settings = Settings {
            blacklist: DomainList::from_patterns(["tracker.example.com"]),
            ..settings_with_google(CleanupMode::Immediate)
        };
        assert_eq!(
            Policy::new(&settings).decide_cookie(".tracker.example.com", "sid"),
            Decision::new(Verdict::DeleteCookie, Reason::Blacklisted)
        );
    }

    #[test]
    fn test_disabled_preset_does_not_match() {
        let mut settings = settings_with_google(CleanupMode::Immediate);
        settings.tracker_presets.set(TrackerPreset::Google, false);
        let policy = Policy::new(&settings);
        assert_eq!(policy.decide_cookie("www.google-analytics.com", "_ga"), Decision::allow(Reason::Unlisted));
        assert_eq!(policy.decide_domain("www.google-analytics.com"), Decision::allow(Reason::Unlisted));
    }

    #[test]
    fn test_default_settings_allow_everything() {
        let settings = Settings::default();
        let policy = Policy::new(&settings);
        for domain in ["www.google-analytics.com", "connect.facebook.net", "example.com"] {
            assert!(!policy.decide_domain(domain).is_delete());
            assert!(!policy.decide_cookie(domain, "_ga").is_delete());
        }
    }

    #[test]
    fn test_plan_cleanup_retains_preferences() {
        let cookies = vec![
            CookieRecord::new("theme", ".example.com"),
            CookieRecord::new("dark_mode", "example.com"),
            CookieRecord::new("sid", "example.com"),
            CookieRecord::new("_ga", ".example.com"),
        ];

        let plan = plan_cleanup(&cookies, true);
        let retained: Vec<_> = plan.retain.iter().map(|c| c.name.as_str()).collect();
        let deleted: Vec<_> = plan.delete.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(retained, vec!["theme", "dark_mode"]);
        assert_eq!(deleted, vec!["sid", "_ga"]);

        let plan = plan_cleanup(&cookies, false);
        assert_eq!(plan.delete.len(), 4);
        assert!(plan.retain.is_empty());
    }

    #[test]
    fn test_badge_colors() {
        let settings = Settings {
            whitelist: DomainList::from_patterns(["bank.example"]),
            blacklist: DomainList::from_patterns(["*.spam.example"]),
            ..settings_with_google(CleanupMode::Immediate)
        };
        let policy = Policy::new(&settings);
        assert_eq!(policy.badge_color("bank.example"), BadgeColor::Whitelisted);
        assert_eq!(policy.badge_color("x.spam.example"), BadgeColor::Blacklisted);
        assert_eq!(policy.badge_color("www.googletagmanager.com"), BadgeColor::Tracker);
        assert_eq!(policy.badge_color("example.org"), BadgeColor::Neutral);
        assert_eq!(BadgeColor::Tracker.code(), "#ff9800");
    }
}
