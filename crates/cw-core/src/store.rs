//! Browser collaborators
//!
//! The engine never talks to browser APIs directly. The settings store, the
//! cookie store and the outbound badge/notification channel are traits; the
//! extension glue implements them over `chrome.*`, tests and the CLI use the
//! in-memory versions below.

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::types::{BadgeColor, CookieRecord, CookieRemoval, NotificationKind, TabId};

/// Error type for collaborator calls.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),
    #[error("Operation rejected: {0}")]
    Rejected(String),
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

// =============================================================================
// Traits
// =============================================================================

/// Persistent key-value settings (`chrome.storage.sync`).
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Fetch the given keys. Absent keys are simply missing from the map.
    async fn get(&self, keys: &[&str]) -> Result<Map<String, Value>, StoreError>;

    /// Merge `values` into the store.
    async fn set(&self, values: Map<String, Value>) -> Result<(), StoreError>;
}

/// The browser's cookie jar (`chrome.cookies`).
#[async_trait]
pub trait CookieStore: Send + Sync {
    /// Cookies whose domain attribute equals `domain` exactly.
    ///
    /// `example.com` and `.example.com` are distinct lookups.
    async fn get_all(&self, domain: &str) -> Result<Vec<CookieRecord>, StoreError>;

    async fn remove(&self, removal: &CookieRemoval) -> Result<(), StoreError>;
}

/// Outbound presentation channel: action badge and in-page notifications.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn set_badge(&self, tab_id: TabId, text: &str, color: BadgeColor) -> Result<(), StoreError>;

    async fn notify(&self, message: &str, kind: NotificationKind) -> Result<(), StoreError>;
}

// =============================================================================
// In-memory implementations
// =============================================================================

fn poisoned() -> StoreError {
    StoreError::Unavailable("lock poisoned".to_string())
}

/// Settings held in a JSON map.
#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    values: Mutex<Map<String, Value>>,
}

impl MemorySettingsStore {
    pub fn new(values: Map<String, Value>) -> Self {
        Self {
            values: Mutex::new(values),
        }
    }

    /// Copy of everything stored.
    pub fn snapshot(&self) -> Result<Map<String, Value>, StoreError> {
        self.values.lock().map(|values| values.clone()).map_err(|_| poisoned())
    }
}

#[async_trait]
impl SettingsStore for MemorySettingsStore {
    async fn get(&self, keys: &[&str]) -> Result<Map<String, Value>, StoreError> {
        let values = self.values.lock().map_err(|_| poisoned())?;
        Ok(keys
            .iter()
            .filter_map(|key| values.get(*key).map(|value| (key.to_string(), value.clone())))
            .collect())
    }

    async fn set(&self, new_values: Map<String, Value>) -> Result<(), StoreError> {
        let mut values = self.values.lock().map_err(|_| poisoned())?;
        values.extend(new_values);
        Ok(())
    }
}

/// A cookie jar held in a vector.
#[derive(Debug, Default)]
pub struct MemoryCookieStore {
    cookies: Mutex<Vec<CookieRecord>>,
    /// Cookie names whose removal is refused
    locked: HashSet<String>,
}

impl MemoryCookieStore {
    pub fn new(cookies: Vec<CookieRecord>) -> Self {
        Self {
            cookies: Mutex::new(cookies),
            locked: HashSet::new(),
        }
    }

    /// Refuse removal of cookies with this name.
    pub fn with_locked(mut self, name: &str) -> Self {
        self.locked.insert(name.to_string());
        self
    }

    pub fn add(&self, cookie: CookieRecord) -> Result<(), StoreError> {
        self.cookies.lock().map_err(|_| poisoned())?.push(cookie);
        Ok(())
    }

    pub fn cookies(&self) -> Result<Vec<CookieRecord>, StoreError> {
        self.cookies.lock().map(|cookies| cookies.clone()).map_err(|_| poisoned())
    }

    pub fn len(&self) -> usize {
        self.cookies.lock().map(|cookies| cookies.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl CookieStore for MemoryCookieStore {
    async fn get_all(&self, domain: &str) -> Result<Vec<CookieRecord>, StoreError> {
        let cookies = self.cookies.lock().map_err(|_| poisoned())?;
        Ok(cookies.iter().filter(|c| c.domain == domain).cloned().collect())
    }

    async fn remove(&self, removal: &CookieRemoval) -> Result<(), StoreError> {
        if self.locked.contains(&removal.name) {
            return Err(StoreError::Rejected(format!("cookie {} is locked", removal.name)));
        }
        let mut cookies = self.cookies.lock().map_err(|_| poisoned())?;
        cookies.retain(|c| !(c.name == removal.name && c.store_id == removal.store_id && c.removal_url() == removal.url));
        Ok(())
    }
}
