//! Cookie name classification
//!
//! Two independent predicates over a cookie name: does it look like a known
//! tracking cookie, and does it look like a stored user preference. A name
//! can be both or neither.

use std::sync::LazyLock;

use regex::{RegexSet, RegexSetBuilder};

/// Known tracking cookie names, by provider.
pub const TRACKING_COOKIE_PATTERNS: &[&str] = &[
    // Facebook
    r"^_fb[cp]$",
    r"^_fbc$",
    r"^_fbp$",
    r"^fr$",
    // Google
    r"^_ga",
    r"^_gid$",
    r"^_gcl",
    r"^_gat",
    r"^IDE$",
    r"^NID$",
    r"^__gads$",
    // Microsoft
    r"^_uet",
    r"^MUID$",
    r"^ANONCHK$",
    r"^_clck$",
    r"^_clsk$",
    // Amazon
    r"^ad-id$",
    r"^ad-privacy$",
    r"^session-id$",
    // Pinterest
    r"^_pin_unauth$",
    // TikTok
    r"^_tt_enable_cookie$",
    r"^_ttp$",
    // LinkedIn
    r"^li_sugr$",
    r"^bcookie$",
    r"^bscookie$",
    // Twitter
    r"^personalization_id$",
    r"^guest_id$",
    r"^ct0$",
];

/// Cookie names that usually hold a benign site preference.
pub const PREFERENCE_COOKIE_PATTERNS: &[&str] = &[
    r"^(theme|dark.?mode|light.?mode)$",
    r"^(lang|language|locale|i18n)$",
    r"^(timezone|tz)$",
    r"^(cookie.?consent|cookie.?accept|gdpr)$",
    r"^(font.?size|text.?size)$",
    r"^(layout|view.?mode|display.?mode)$",
    r"^(preferences|prefs|settings)$",
    r"^(accessibility|a11y)$",
];

static TRACKING_SET: LazyLock<RegexSet> = LazyLock::new(|| build_set(TRACKING_COOKIE_PATTERNS));
static PREFERENCE_SET: LazyLock<RegexSet> = LazyLock::new(|| build_set(PREFERENCE_COOKIE_PATTERNS));

fn build_set(patterns: &[&str]) -> RegexSet {
    RegexSetBuilder::new(patterns)
        .case_insensitive(true)
        .build()
        .expect("static cookie patterns")
}

/// Check if a cookie name matches a known tracking cookie.
#[inline]
pub fn is_tracking_cookie(name: &str) -> bool {
    TRACKING_SET.is_match(name)
}

/// Check if a cookie name looks like a stored preference.
#[inline]
pub fn is_preference_cookie(name: &str) -> bool {
    PREFERENCE_SET.is_match(name)
}

/// Both classifications of one cookie name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CookieClass {
    pub tracking: bool,
    pub preference: bool,
}

impl CookieClass {
    pub fn of(name: &str) -> Self {
        Self {
            tracking: is_tracking_cookie(name),
            preference: is_preference_cookie(name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracking_names() {
        for name in [
            "_ga", "_ga_XYZ123", "_gid", "_gcl_au", "_gat_UA-1", "IDE", "NID", "__gads", "_fbp",
            "_fbc", "fr", "_uetsid", "MUID", "ANONCHK", "_clck", "_clsk", "ad-id", "session-id",
            "_pin_unauth", "_ttp", "_tt_enable_cookie", "li_sugr", "bcookie", "bscookie",
            "personalization_id", "guest_id", "ct0",
        ] {
            assert!(is_tracking_cookie(name), "{name} should be a tracker");
        }
    }

    #[test]
    fn test_tracking_is_case_insensitive() {
        assert!(is_tracking_cookie("_GA"));
        assert!(is_tracking_cookie("muid"));
        assert!(is_tracking_cookie("Ide"));
    }

    #[test]
    fn test_non_tracking_names() {
        for name in ["sid", "random_custom", "frx", "xfr", "ide_session", "my_ga", "_fbx", "csrftoken", ""] {
            assert!(!is_tracking_cookie(name), "{name} should not be a tracker");
        }
    }

    #[test]
    fn test_preference_names() {
        for name in [
            "theme", "dark_mode", "darkmode", "light-mode", "lang", "Locale", "i18n", "tz",
            "timezone", "cookie_consent", "gdpr", "font-size", "textsize", "layout", "view_mode",
            "prefs", "settings", "a11y", "accessibility",
        ] {
            assert!(is_preference_cookie(name), "{name} should be a preference");
        }
        for name in ["theme_id", "session", "_ga", "language_pack"] {
            assert!(!is_preference_cookie(name), "{name} should not be a preference");
        }
    }

    #[test]
    fn test_classes_are_independent() {
        assert_eq!(CookieClass::of("_ga"), CookieClass { tracking: true, preference: false });
        assert_eq!(CookieClass::of("theme"), CookieClass { tracking: false, preference: true });
        assert_eq!(CookieClass::of("sid"), CookieClass::default());
    }
}
