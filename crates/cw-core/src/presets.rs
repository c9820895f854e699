//! Tracker presets
//!
//! Each preset is a curated bundle of domain patterns for one advertising or
//! analytics provider. The tables are static; settings only decide which
//! presets are switched on.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use ts_rs::TS;

use crate::list::is_in_list;

/// Known tracker providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum TrackerPreset {
    Facebook,
    Instagram,
    Amazon,
    Microsoft,
    Google,
    Twitter,
    Tiktok,
    Linkedin,
}

impl TrackerPreset {
    pub const ALL: [TrackerPreset; 8] = [
        Self::Facebook,
        Self::Instagram,
        Self::Amazon,
        Self::Microsoft,
        Self::Google,
        Self::Twitter,
        Self::Tiktok,
        Self::Linkedin,
    ];

    /// Key used in stored settings.
    pub fn key(&self) -> &'static str {
        match self {
            Self::Facebook => "facebook",
            Self::Instagram => "instagram",
            Self::Amazon => "amazon",
            Self::Microsoft => "microsoft",
            Self::Google => "google",
            Self::Twitter => "twitter",
            Self::Tiktok => "tiktok",
            Self::Linkedin => "linkedin",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|preset| preset.key() == key)
    }

    /// Domain patterns covered by this preset.
    pub fn patterns(&self) -> &'static [&'static str] {
        match self {
            Self::Facebook => &["*.facebook.com", "*.fbcdn.net", "*.fbsbx.com", "*.facebook.net"],
            Self::Instagram => &["*.instagram.com", "*.cdninstagram.com"],
            Self::Amazon => &["*.amazon-adsystem.com", "*.amazonservices.com", "*.assoc-amazon.com"],
            Self::Microsoft => &["*.clarity.ms", "*.bat.bing.com", "*.atdmt.com"],
            Self::Google => &[
                "*.doubleclick.net",
                "*.googlesyndication.com",
                "*.googleadservices.com",
                "*.google-analytics.com",
                "*.googletagmanager.com",
            ],
            Self::Twitter => &["*.ads.twitter.com", "*.analytics.twitter.com", "*.t.co"],
            Self::Tiktok => &["*.analytics.tiktok.com", "*.tiktokcdn.com"],
            Self::Linkedin => &["*.ads.linkedin.com", "*.licdn.com"],
        }
    }

    /// Check if `domain` is covered by this preset.
    #[inline]
    pub fn matches(&self, domain: &str) -> bool {
        is_in_list(domain, self.patterns())
    }
}

/// Full preset table keyed by provider, as shown in the popup.
pub fn preset_table() -> BTreeMap<TrackerPreset, Vec<String>> {
    TrackerPreset::ALL
        .into_iter()
        .map(|preset| (preset, preset.patterns().iter().map(|p| p.to_string()).collect()))
        .collect()
}

/// Which presets are switched on.
///
/// Presets absent from the map are off.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TrackerPresetSet(BTreeMap<TrackerPreset, bool>);

impl TrackerPresetSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every preset switched on.
    pub fn all_enabled() -> Self {
        Self(TrackerPreset::ALL.into_iter().map(|preset| (preset, true)).collect())
    }

    /// Decode a stored `trackerPresets` object.
    ///
    /// Unknown provider keys and non-boolean values are skipped; anything
    /// that is not an object yields an empty set.
    pub fn from_value(value: &Value) -> Self {
        let mut set = Self::new();
        if let Some(map) = value.as_object() {
            for (key, enabled) in map {
                match (TrackerPreset::from_key(key), enabled.as_bool()) {
                    (Some(preset), Some(enabled)) => set.set(preset, enabled),
                    _ => log::debug!("Ignoring tracker preset entry {}={}", key, enabled),
                }
            }
        }
        set
    }

    pub fn to_value(&self) -> Value {
        let map = self
            .0
            .iter()
            .map(|(preset, enabled)| (preset.key().to_string(), Value::Bool(*enabled)))
            .collect();
        Value::Object(map)
    }

    pub fn set(&mut self, preset: TrackerPreset, enabled: bool) {
        self.0.insert(preset, enabled);
    }

    pub fn is_enabled(&self, preset: TrackerPreset) -> bool {
        self.0.get(&preset).copied().unwrap_or(false)
    }

    /// Presets currently switched on, in table order.
    pub fn enabled(&self) -> impl Iterator<Item = TrackerPreset> + '_ {
        TrackerPreset::ALL.into_iter().filter(|preset| self.is_enabled(*preset))
    }

    /// All patterns of enabled presets.
    pub fn enabled_patterns(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.enabled().flat_map(|preset| preset.patterns().iter().copied())
    }

    /// First enabled preset covering `domain`.
    pub fn matching_preset(&self, domain: &str) -> Option<TrackerPreset> {
        self.enabled().find(|preset| preset.matches(domain))
    }

    /// Check if `domain` is covered by any enabled preset.
    #[inline]
    pub fn matches(&self, domain: &str) -> bool {
        self.matching_preset(domain).is_some()
    }
}
