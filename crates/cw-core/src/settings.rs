//! Typed view of the extension's flat key-value settings
//!
//! Settings are read through from the store at the start of every
//! evaluation. Decoding never fails: a missing or malformed key falls back to
//! the permissive default (empty list, `false`, deferred cleanup, no presets),
//! so an unreadable store degrades to "allow everything".

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use ts_rs::TS;

use crate::list::{DomainList, ListError, ListKind};
use crate::presets::TrackerPresetSet;
use crate::types::CleanupMode;

// =============================================================================
// Storage keys
// =============================================================================

pub mod keys {
    pub const WHITELIST: &str = "whitelist";
    pub const BLACKLIST: &str = "blacklist";
    pub const ENABLED: &str = "enabled";
    pub const CLEANUP_MODE: &str = "cleanupMode";
    pub const RETAIN_PREFERENCES: &str = "retainPreferences";
    pub const TRACKER_PRESETS: &str = "trackerPresets";
    pub const NOTIFICATIONS_ENABLED: &str = "notificationsEnabled";
    pub const AD_BLOCK_ENABLED: &str = "adBlockEnabled";

    pub const ALL: &[&str] = &[
        WHITELIST,
        BLACKLIST,
        ENABLED,
        CLEANUP_MODE,
        RETAIN_PREFERENCES,
        TRACKER_PRESETS,
        NOTIFICATIONS_ENABLED,
        AD_BLOCK_ENABLED,
    ];
}

/// Storage area that holds user settings.
pub const SYNC_AREA: &str = "sync";

// =============================================================================
// Settings
// =============================================================================

/// Snapshot of all user settings for one evaluation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase", default)]
#[ts(export)]
pub struct Settings {
    pub whitelist: DomainList,
    pub blacklist: DomainList,
    /// Master switch; a disabled extension never deletes anything
    pub enabled: bool,
    pub cleanup_mode: CleanupMode,
    /// Keep preference cookies when wiping a domain
    pub retain_preferences: bool,
    pub tracker_presets: TrackerPresetSet,
    pub notifications_enabled: bool,
    pub ad_block_enabled: bool,
}

impl Settings {
    /// Values written on first install.
    pub fn first_run() -> Self {
        Self {
            whitelist: DomainList::new(),
            blacklist: DomainList::new(),
            enabled: true,
            cleanup_mode: CleanupMode::Immediate,
            retain_preferences: false,
            tracker_presets: TrackerPresetSet::all_enabled(),
            notifications_enabled: true,
            ad_block_enabled: true,
        }
    }

    /// Decode settings from raw store values, field by field.
    pub fn from_values(values: &Map<String, Value>) -> Self {
        let mut settings = Self::default();

        if let Some(value) = values.get(keys::WHITELIST) {
            settings.whitelist = decode_list(keys::WHITELIST, value);
        }
        if let Some(value) = values.get(keys::BLACKLIST) {
            settings.blacklist = decode_list(keys::BLACKLIST, value);
        }
        settings.enabled = decode_flag(values, keys::ENABLED);
        settings.retain_preferences = decode_flag(values, keys::RETAIN_PREFERENCES);
        settings.notifications_enabled = decode_flag(values, keys::NOTIFICATIONS_ENABLED);
        settings.ad_block_enabled = decode_flag(values, keys::AD_BLOCK_ENABLED);

        if let Some(value) = values.get(keys::CLEANUP_MODE) {
            match value.as_str().and_then(CleanupMode::from_str) {
                Some(mode) => settings.cleanup_mode = mode,
                None => log::warn!("Unknown cleanup mode {}, using deferred", value),
            }
        }
        if let Some(value) = values.get(keys::TRACKER_PRESETS) {
            settings.tracker_presets = TrackerPresetSet::from_value(value);
        }

        settings
    }

    /// Encode every field as a store value.
    pub fn to_values(&self) -> Map<String, Value> {
        let mut values = Map::new();
        values.insert(keys::WHITELIST.to_string(), list_value(&self.whitelist));
        values.insert(keys::BLACKLIST.to_string(), list_value(&self.blacklist));
        values.insert(keys::ENABLED.to_string(), Value::Bool(self.enabled));
        values.insert(
            keys::CLEANUP_MODE.to_string(),
            Value::String(self.cleanup_mode.as_str().to_string()),
        );
        values.insert(keys::RETAIN_PREFERENCES.to_string(), Value::Bool(self.retain_preferences));
        values.insert(keys::TRACKER_PRESETS.to_string(), self.tracker_presets.to_value());
        values.insert(
            keys::NOTIFICATIONS_ENABLED.to_string(),
            Value::Bool(self.notifications_enabled),
        );
        values.insert(keys::AD_BLOCK_ENABLED.to_string(), Value::Bool(self.ad_block_enabled));
        values
    }

    pub fn list(&self, kind: ListKind) -> &DomainList {
        match kind {
            ListKind::Whitelist => &self.whitelist,
            ListKind::Blacklist => &self.blacklist,
        }
    }

    pub fn list_mut(&mut self, kind: ListKind) -> &mut DomainList {
        match kind {
            ListKind::Whitelist => &mut self.whitelist,
            ListKind::Blacklist => &mut self.blacklist,
        }
    }

    /// Add a user-entered pattern to one of the lists.
    pub fn add_pattern(&mut self, kind: ListKind, raw: &str) -> Result<String, ListError> {
        self.list_mut(kind).insert(raw).map(str::to_string)
    }
}

/// First-run values for keys the store does not have yet.
///
/// Existing keys are never overwritten, so re-installing keeps user lists.
pub fn missing_first_run_values(current: &Map<String, Value>) -> Map<String, Value> {
    Settings::first_run()
        .to_values()
        .into_iter()
        .filter(|(key, value)| match current.get(key) {
            None | Some(Value::Null) => true,
            // An empty list is still "unset" for the list keys
            Some(Value::Array(existing)) => existing.is_empty() && value.is_array(),
            Some(_) => false,
        })
        .collect()
}

fn decode_list(key: &str, value: &Value) -> DomainList {
    match value.as_array() {
        Some(items) => DomainList::from_patterns(items.iter().filter_map(|item| {
            let pattern = item.as_str();
            if pattern.is_none() {
                log::warn!("Skipping non-string entry {} in {}", item, key);
            }
            pattern
        })),
        None => {
            log::warn!("Setting {} is not a list, treating as empty", key);
            DomainList::new()
        }
    }
}

fn decode_flag(values: &Map<String, Value>, key: &str) -> bool {
    values.get(key).and_then(Value::as_bool).unwrap_or(false)
}

fn list_value(list: &DomainList) -> Value {
    Value::Array(list.iter().map(|p| Value::String(p.to_string())).collect())
}

// =============================================================================
// Change notifications
// =============================================================================

/// Keys that changed in one storage area.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SettingsChange {
    pub keys: Vec<String>,
    pub area: String,
}

impl SettingsChange {
    pub fn sync<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
            area: SYNC_AREA.to_string(),
        }
    }

    pub fn touches(&self, key: &str) -> bool {
        self.keys.iter().any(|k| k == key)
    }

    /// True when a change can alter a domain's classification.
    pub fn affects_classification(&self) -> bool {
        self.area == SYNC_AREA
            && (self.touches(keys::WHITELIST)
                || self.touches(keys::BLACKLIST)
                || self.touches(keys::TRACKER_PRESETS))
    }
}
