//! CookieWipe Core Library
//!
//! This crate holds the decision logic of the CookieWipe cookie cleaner: which
//! cookies to delete, when, and which to keep. Browser APIs stay behind small
//! async traits so the same engine runs in the extension (through `cw-wasm`),
//! in the `cw-cli` tool and in tests.
//!
//! # Architecture
//!
//! Settings are read from the store for every event and decoded leniently
//! into a [`Settings`] snapshot. A [`Policy`] over that snapshot classifies a
//! domain or a single cookie; the [`Coordinator`] applies the decision when a
//! tab closes or a cookie is set.
//!
//! # Modules
//!
//! - `pattern`: Domain pattern matching and normalization
//! - `list`: Whitelist/blacklist membership
//! - `cookie`: Tracking and preference cookie name classification
//! - `presets`: Built-in tracker domain presets
//! - `settings`: Typed settings snapshot over the key-value store
//! - `policy`: Cleanup decisions and badge colours
//! - `store`: Browser collaborator traits and in-memory implementations
//! - `cleanup`: Per-domain deletion batches
//! - `lifecycle`: Tab and cookie event handling
//! - `messages`: Popup and content-script requests
//! - `url`: Host extraction from URLs
//! - `types`: Shared type definitions

pub mod cleanup;
pub mod cookie;
pub mod lifecycle;
pub mod list;
pub mod messages;
pub mod pattern;
pub mod policy;
pub mod presets;
pub mod settings;
pub mod store;
pub mod types;
pub mod url;

// Re-export commonly used types
pub use cleanup::{CleanupOutcome, CleanupReport};
pub use cookie::{is_preference_cookie, is_tracking_cookie, CookieClass};
pub use lifecycle::{BrowserEvent, CookieChange, Coordinator, Session, Stats};
pub use list::{is_in_list, DomainList, ListError, ListKind};
pub use messages::{Request, Response};
pub use pattern::{matches_domain, normalize_pattern, PatternError};
pub use policy::{CleanupPlan, Policy};
pub use presets::{TrackerPreset, TrackerPresetSet};
pub use settings::{Settings, SettingsChange};
pub use store::{CookieStore, MemoryCookieStore, MemorySettingsStore, Notifier, SettingsStore, StoreError};
pub use types::{BadgeColor, CleanupMode, CookieRecord, Decision, NotificationKind, Reason, TabId, Verdict};
pub use crate::url::domain_from_url;
