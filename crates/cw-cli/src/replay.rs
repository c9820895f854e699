use std::fs;
use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;

use cw_core::lifecycle::{BrowserEvent, Coordinator, Stats};
use cw_core::store::{MemoryCookieStore, MemorySettingsStore, Notifier, StoreError};
use cw_core::types::{BadgeColor, CookieRecord, NotificationKind, TabId};

use crate::settings_file;

/// A recorded browser session: the initial cookie jar and the events that
/// followed.
#[derive(Debug, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub cookies: Vec<CookieRecord>,
    pub events: Vec<BrowserEvent>,
}

#[derive(Debug)]
pub struct ReplayResult {
    pub remaining: Vec<CookieRecord>,
    pub stats: Stats,
}

/// Prints notifications and logs badge updates.
struct ConsoleNotifier;

#[async_trait]
impl Notifier for ConsoleNotifier {
    async fn set_badge(&self, tab_id: TabId, text: &str, color: BadgeColor) -> Result<(), StoreError> {
        log::debug!("badge tab={} text={:?} color={}", tab_id, text, color.code());
        Ok(())
    }

    async fn notify(&self, message: &str, kind: NotificationKind) -> Result<(), StoreError> {
        println!("  [{:?}] {}", kind, message);
        Ok(())
    }
}

pub fn load_scenario(path: &Path) -> Result<Scenario, String> {
    let content = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read '{}': {}", path.display(), e))?;
    serde_json::from_str(&content).map_err(|e| format!("Invalid scenario '{}': {}", path.display(), e))
}

pub fn run_replay(settings_path: &Path, scenario: Scenario) -> Result<ReplayResult, String> {
    let values = settings_file::read_values(settings_path)?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("Failed to start tokio runtime: {}", e))?;

    runtime.block_on(async move {
        let mut coordinator = Coordinator::new(
            MemorySettingsStore::new(values),
            MemoryCookieStore::new(scenario.cookies),
            ConsoleNotifier,
        );

        for event in scenario.events {
            log::debug!("event {:?}", event);
            coordinator.dispatch(event).await;
        }

        let remaining = coordinator
            .cookie_store()
            .cookies()
            .map_err(|e| format!("Cookie store failed: {}", e))?;
        Ok(ReplayResult {
            remaining,
            stats: coordinator.session().stats(),
        })
    })
}
