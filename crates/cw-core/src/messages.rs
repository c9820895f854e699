//! Popup and content-script messages
//!
//! Requests are tagged by `action`; responses are plain JSON objects in the
//! shape the popup expects.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::cleanup::{cookies_for_domain, delete_domain_cookies, CleanupReport};
use crate::cookie::is_tracking_cookie;
use crate::lifecycle::{Coordinator, Stats};
use crate::pattern::pattern_base;
use crate::policy::Policy;
use crate::presets::{preset_table, TrackerPreset};
use crate::store::{CookieStore, Notifier, SettingsStore};
use crate::types::{CookieRecord, NotificationKind, TabId};
use crate::url::domain_from_url;

/// Inbound message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "action", rename_all = "camelCase")]
#[ts(export)]
pub enum Request {
    /// Cookie summary for the active tab's URL
    GetCookieCount { url: Option<String> },
    /// Wipe the active tab's domain right away
    DeleteCookiesNow { url: Option<String> },
    GetStats,
    GetTrackerPresets,
    /// Running ad count reported by a content script
    #[serde(rename_all = "camelCase")]
    AdBlockStats {
        tab_id: TabId,
        #[serde(default)]
        ads_blocked: u32,
    },
    /// Wipe every domain of every enabled tracker preset
    CleanTrackerCookies,
}

/// Cookie summary for one domain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CookieSummary {
    pub count: usize,
    pub domain: Option<String>,
    pub cookies: Vec<CookieRecord>,
    pub tracking_count: usize,
    pub is_tracker_domain: bool,
}

/// Outcome of a delete request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DeletionResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DeletionResult {
    pub fn deleted(count: usize) -> Self {
        Self {
            success: true,
            deleted_count: Some(count),
            error: None,
        }
    }

    pub fn failed(error: &str) -> Self {
        Self {
            success: false,
            deleted_count: None,
            error: Some(error.to_string()),
        }
    }
}

/// Outbound reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Response {
    CookieCount(CookieSummary),
    Deletion(DeletionResult),
    Stats(Stats),
    Presets {
        presets: BTreeMap<TrackerPreset, Vec<String>>,
    },
    Ack {
        success: bool,
    },
}

impl<S, C, N> Coordinator<S, C, N>
where
    S: SettingsStore,
    C: CookieStore,
    N: Notifier,
{
    /// Answer one popup or content-script message.
    pub async fn handle_message(&mut self, request: Request) -> Response {
        match request {
            Request::GetCookieCount { url } => {
                let domain = url.as_deref().and_then(domain_from_url);
                Response::CookieCount(self.cookie_summary(domain).await)
            }
            Request::DeleteCookiesNow { url } => {
                let Some(url) = url else {
                    return Response::Deletion(DeletionResult::failed("No active tab"));
                };
                match domain_from_url(&url) {
                    Some(domain) => Response::Deletion(self.delete_now(&domain).await),
                    None => Response::Deletion(DeletionResult::failed("No valid domain")),
                }
            }
            Request::GetStats => Response::Stats(self.session().stats()),
            Request::GetTrackerPresets => Response::Presets {
                presets: preset_table(),
            },
            Request::AdBlockStats { tab_id, ads_blocked } => {
                self.session_mut().record_ads(tab_id, ads_blocked);
                Response::Ack { success: true }
            }
            Request::CleanTrackerCookies => Response::Deletion(self.clean_tracker_cookies().await),
        }
    }

    async fn cookie_summary(&self, domain: Option<String>) -> CookieSummary {
        let Some(domain) = domain else {
            return CookieSummary::default();
        };

        let cookies = match cookies_for_domain(self.cookie_store(), &domain).await {
            Ok(cookies) => cookies,
            Err(e) => {
                log::warn!("Error getting cookies for {}: {}", domain, e);
                return CookieSummary {
                    domain: Some(domain),
                    ..CookieSummary::default()
                };
            }
        };

        let settings = self.load_settings().await;
        CookieSummary {
            count: cookies.len(),
            tracking_count: cookies.iter().filter(|c| is_tracking_cookie(&c.name)).count(),
            is_tracker_domain: Policy::new(&settings).is_tracker_domain(&domain),
            domain: Some(domain),
            cookies,
        }
    }

    async fn delete_now(&self, domain: &str) -> DeletionResult {
        let settings = self.load_settings().await;
        match delete_domain_cookies(self.cookie_store(), domain, settings.retain_preferences).await {
            Ok(report) => {
                let message = format!("Deleted {} cookies from {}", report.deleted, domain);
                self.notify(&settings, &message, NotificationKind::Success).await;
                DeletionResult::deleted(report.deleted)
            }
            Err(e) => DeletionResult::failed(&e.to_string()),
        }
    }

    async fn clean_tracker_cookies(&self) -> DeletionResult {
        let settings = self.load_settings().await;
        let mut total = CleanupReport::new("trackers");

        for pattern in settings.tracker_presets.enabled_patterns() {
            let domain = pattern_base(pattern);
            match delete_domain_cookies(self.cookie_store(), domain, false).await {
                Ok(report) => total.merge(report),
                Err(e) => log::warn!("Error cleaning tracker cookies for {}: {}", domain, e),
            }
        }

        let message = format!("Cleaned {} tracking cookies", total.deleted);
        self.notify(&settings, &message, NotificationKind::Success).await;
        DeletionResult::deleted(total.deleted)
    }
}
