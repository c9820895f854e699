//! Lifecycle Coordinator
//!
//! Reacts to tab and cookie events and turns policy decisions into cookie
//! store calls. Each tab moves through `Unknown -> Tracked(domain) -> Unknown`;
//! the association lives in a [`Session`] owned by the coordinator.
//!
//! Handlers take `&mut self`, so events are applied one at a time in arrival
//! order. Settings are re-read for every event: a list edit applies to the
//! next tab close, not to the snapshot taken when the tab was tracked.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::cleanup::{cookies_for_domain, delete_domain_cookies, remove_cookie, CleanupOutcome, CleanupReport};
use crate::pattern::{matches_domain, WILDCARD_PREFIX};
use crate::policy::Policy;
use crate::settings::{keys, Settings, SettingsChange};
use crate::store::{CookieStore, Notifier, SettingsStore};
use crate::types::{CookieRecord, Decision, NotificationKind, TabId, Verdict};
use crate::url::domain_from_url;

/// Blocked-cookie notifications are shown for the 1st, 6th, 11th... block.
const BLOCK_NOTIFY_EVERY: u32 = 5;

// =============================================================================
// Session state
// =============================================================================

/// Process-wide counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Stats {
    pub total_ads_blocked: u32,
    pub total_cookies_blocked: u32,
}

/// Mutable state carried across events.
#[derive(Debug, Default)]
pub struct Session {
    tabs: HashMap<TabId, String>,
    ads_by_tab: HashMap<TabId, u32>,
    stats: Stats,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Associate a tab with a domain, replacing any previous one.
    pub fn track(&mut self, tab_id: TabId, domain: String) -> Option<String> {
        self.tabs.insert(tab_id, domain)
    }

    /// Forget a tab. Returns the domain it was tracked under.
    pub fn untrack(&mut self, tab_id: TabId) -> Option<String> {
        self.ads_by_tab.remove(&tab_id);
        self.tabs.remove(&tab_id)
    }

    pub fn domain_for(&self, tab_id: TabId) -> Option<&str> {
        self.tabs.get(&tab_id).map(String::as_str)
    }

    pub fn tracked_tabs(&self) -> impl Iterator<Item = (TabId, &str)> {
        self.tabs.iter().map(|(tab_id, domain)| (*tab_id, domain.as_str()))
    }

    /// Tabs whose domain can see cookies set for `cookie_domain`.
    pub fn tabs_on(&self, cookie_domain: &str) -> Vec<(TabId, String)> {
        let pattern = format!("{}{}", WILDCARD_PREFIX, cookie_domain);
        let mut tabs: Vec<_> = self
            .tabs
            .iter()
            .filter(|(_, domain)| matches_domain(domain, &pattern))
            .map(|(tab_id, domain)| (*tab_id, domain.clone()))
            .collect();
        tabs.sort_unstable();
        tabs
    }

    /// Count one blocked cookie. Returns the new total.
    pub fn record_blocked_cookie(&mut self) -> u32 {
        self.stats.total_cookies_blocked = self.stats.total_cookies_blocked.saturating_add(1);
        self.stats.total_cookies_blocked
    }

    /// Record a tab's running ad count. Returns the new total.
    pub fn record_ads(&mut self, tab_id: TabId, count: u32) -> u32 {
        let previous = self.ads_by_tab.insert(tab_id, count).unwrap_or(0);
        self.stats.total_ads_blocked = self.stats.total_ads_blocked.saturating_add(count.saturating_sub(previous));
        self.stats.total_ads_blocked
    }

    pub fn ads_for(&self, tab_id: TabId) -> u32 {
        self.ads_by_tab.get(&tab_id).copied().unwrap_or(0)
    }

    pub fn stats(&self) -> Stats {
        self.stats
    }
}

// =============================================================================
// Events
// =============================================================================

/// A cookie was set or removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CookieChange {
    #[serde(default)]
    pub removed: bool,
    pub cookie: CookieRecord,
}

impl CookieChange {
    pub fn added(cookie: CookieRecord) -> Self {
        Self { removed: false, cookie }
    }
}

/// Browser events in the order the dispatcher delivered them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum BrowserEvent {
    TabUpdated { tab_id: TabId, url: Option<String> },
    TabActivated { tab_id: TabId, url: Option<String> },
    TabRemoved { tab_id: TabId },
    CookieChanged(CookieChange),
    SettingsChanged(SettingsChange),
    AdsBlocked { tab_id: TabId, count: u32 },
}

/// Result of a tab close that reached the policy engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabClosed {
    pub domain: String,
    pub decision: Decision,
    /// Present when cookies were wiped
    pub report: Option<CleanupReport>,
}

/// Result of a cookie creation event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieEvent {
    pub decision: Decision,
    /// Present when a removal was attempted
    pub outcome: Option<CleanupOutcome>,
}

// =============================================================================
// Coordinator
// =============================================================================

/// Event handlers over the browser collaborators.
pub struct Coordinator<S, C, N> {
    settings: S,
    cookies: C,
    notifier: N,
    session: Session,
}

impl<S, C, N> Coordinator<S, C, N>
where
    S: SettingsStore,
    C: CookieStore,
    N: Notifier,
{
    pub fn new(settings: S, cookies: C, notifier: N) -> Self {
        Self {
            settings,
            cookies,
            notifier,
            session: Session::new(),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn settings_store(&self) -> &S {
        &self.settings
    }

    pub fn cookie_store(&self) -> &C {
        &self.cookies
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Read the current settings; an unreadable store yields the defaults.
    pub async fn load_settings(&self) -> Settings {
        match self.settings.get(keys::ALL).await {
            Ok(values) => Settings::from_values(&values),
            Err(e) => {
                log::warn!("Settings unavailable, allowing everything: {}", e);
                Settings::default()
            }
        }
    }

    /// Route one event to its handler.
    pub async fn dispatch(&mut self, event: BrowserEvent) {
        match event {
            BrowserEvent::TabUpdated { tab_id, url } => {
                self.on_tab_updated(tab_id, url.as_deref()).await;
            }
            BrowserEvent::TabActivated { tab_id, url } => {
                self.on_tab_activated(tab_id, url.as_deref()).await;
            }
            BrowserEvent::TabRemoved { tab_id } => {
                self.on_tab_removed(tab_id).await;
            }
            BrowserEvent::CookieChanged(change) => {
                self.on_cookie_changed(&change).await;
            }
            BrowserEvent::SettingsChanged(change) => {
                self.on_settings_changed(&change).await;
            }
            BrowserEvent::AdsBlocked { tab_id, count } => {
                self.on_ads_blocked(tab_id, count);
            }
        }
    }

    /// A tab navigated. Returns the domain it is now tracked under.
    pub async fn on_tab_updated(&mut self, tab_id: TabId, url: Option<&str>) -> Option<String> {
        let domain = domain_from_url(url?)?;
        self.session.track(tab_id, domain.clone());

        let settings = self.load_settings().await;
        self.refresh_badge(tab_id, &domain, &settings).await;
        Some(domain)
    }

    /// The user switched to a tab.
    pub async fn on_tab_activated(&mut self, tab_id: TabId, url: Option<&str>) -> Option<String> {
        self.on_tab_updated(tab_id, url).await
    }

    /// A tab closed: wipe its domain if the policy says so.
    ///
    /// The association is cleared whatever the outcome. Returns `None` when
    /// the tab had no domain or the extension is disabled.
    pub async fn on_tab_removed(&mut self, tab_id: TabId) -> Option<TabClosed> {
        let domain = self.session.untrack(tab_id)?;

        let settings = self.load_settings().await;
        if !settings.enabled {
            log::debug!("Extension disabled, keeping cookies for {}", domain);
            return None;
        }

        let decision = Policy::new(&settings).decide_domain(&domain);
        if decision.verdict != Verdict::DeleteDomain {
            log::debug!("Domain {} is {}, keeping cookies", domain, decision.reason.as_str());
            return Some(TabClosed { domain, decision, report: None });
        }

        log::info!("Domain {} is {}, deleting cookies", domain, decision.reason.as_str());
        let report = match delete_domain_cookies(&self.cookies, &domain, settings.retain_preferences).await {
            Ok(report) => report,
            Err(e) => {
                log::warn!("Could not list cookies for {}: {}", domain, e);
                return Some(TabClosed { domain, decision, report: None });
            }
        };

        if report.deleted > 0 {
            let message = format!("Cleaned {} cookies from {}", report.deleted, domain);
            self.notify(&settings, &message, NotificationKind::Success).await;
        }

        Some(TabClosed {
            domain,
            decision,
            report: Some(report),
        })
    }

    /// A cookie was set or removed.
    ///
    /// Returns the decision for additions; `None` for removals and when the
    /// extension is disabled.
    pub async fn on_cookie_changed(&mut self, change: &CookieChange) -> Option<CookieEvent> {
        let settings = self.load_settings().await;
        if !settings.enabled {
            return None;
        }

        let event = if change.removed {
            None
        } else {
            Some(self.apply_cookie_decision(&settings, &change.cookie).await)
        };

        for (tab_id, domain) in self.session.tabs_on(change.cookie.bare_domain()) {
            self.refresh_badge(tab_id, &domain, &settings).await;
        }

        event
    }

    async fn apply_cookie_decision(&mut self, settings: &Settings, cookie: &CookieRecord) -> CookieEvent {
        let domain = cookie.bare_domain();
        let decision = Policy::new(settings).decide_cookie(domain, &cookie.name);
        if decision.verdict != Verdict::DeleteCookie {
            return CookieEvent { decision, outcome: None };
        }

        log::info!("Blocking cookie \"{}\" from {}", cookie.name, domain);
        let outcome = remove_cookie(&self.cookies, cookie).await;
        if outcome == CleanupOutcome::Deleted {
            let total = self.session.record_blocked_cookie();
            if total % BLOCK_NOTIFY_EVERY == 1 {
                let message = format!("Blocked tracking cookie from {}", domain);
                self.notify(settings, &message, NotificationKind::Blocked).await;
            }
        }

        CookieEvent {
            decision,
            outcome: Some(outcome),
        }
    }

    /// Settings changed: recolour badges when classification may differ.
    pub async fn on_settings_changed(&mut self, change: &SettingsChange) {
        if !change.affects_classification() {
            return;
        }
        let settings = self.load_settings().await;
        let mut tabs: Vec<(TabId, String)> = self
            .session
            .tracked_tabs()
            .map(|(tab_id, domain)| (tab_id, domain.to_string()))
            .collect();
        tabs.sort_unstable();
        for (tab_id, domain) in tabs {
            self.refresh_badge(tab_id, &domain, &settings).await;
        }
    }

    /// The content script reported its running ad count for a tab.
    pub fn on_ads_blocked(&mut self, tab_id: TabId, count: u32) -> u32 {
        self.session.record_ads(tab_id, count)
    }

    /// Recompute a tab's badge from its domain's cookie count and class.
    pub async fn refresh_badge(&self, tab_id: TabId, domain: &str, settings: &Settings) {
        let count = match cookies_for_domain(&self.cookies, domain).await {
            Ok(cookies) => cookies.len(),
            Err(e) => {
                log::warn!("Could not count cookies for {}: {}", domain, e);
                return;
            }
        };
        let text = if count > 0 { count.to_string() } else { String::new() };
        let color = Policy::new(settings).badge_color(domain);
        if let Err(e) = self.notifier.set_badge(tab_id, &text, color).await {
            log::debug!("Badge update for tab {} failed: {}", tab_id, e);
        }
    }

    /// Show a notification unless the user turned them off.
    pub(crate) async fn notify(&self, settings: &Settings, message: &str, kind: NotificationKind) {
        if !settings.notifications_enabled {
            return;
        }
        if let Err(e) = self.notifier.notify(message, kind).await {
            log::debug!("Notification not delivered: {}", e);
        }
    }

    pub(crate) fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde_json::{json, Map, Value};

    use super::*;
    use crate::store::{MemoryCookieStore, MemorySettingsStore, StoreError};
    use crate::types::{BadgeColor, Reason};

    /// Notifier that keeps everything it was asked to show.
    #[derive(Default)]
    pub(crate) struct RecordingNotifier {
        pub badges: Mutex<Vec<(TabId, String, BadgeColor)>>,
        pub messages: Mutex<Vec<(String, NotificationKind)>>,
    }

    impl RecordingNotifier {
        pub fn messages(&self) -> Vec<(String, NotificationKind)> {
            self.messages.lock().unwrap().clone()
        }

        pub fn last_badge(&self, tab_id: TabId) -> Option<(String, BadgeColor)> {
            self.badges
                .lock()
                .unwrap()
                .iter()
                .rev()
                .find(|(tab, _, _)| *tab == tab_id)
                .map(|(_, text, color)| (text.clone(), *color))
        }
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn set_badge(&self, tab_id: TabId, text: &str, color: BadgeColor) -> Result<(), StoreError> {
            self.badges.lock().unwrap().push((tab_id, text.to_string(), color));
            Ok(())
        }

        async fn notify(&self, message: &str, kind: NotificationKind) -> Result<(), StoreError> {
            self.messages.lock().unwrap().push((message.to_string(), kind));
            Ok(())
        }
    }

    pub(crate) type TestCoordinator = Coordinator<MemorySettingsStore, MemoryCookieStore, RecordingNotifier>;

    pub(crate) fn values(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    pub(crate) fn coordinator(settings: Value, cookies: Vec<CookieRecord>) -> TestCoordinator {
        Coordinator::new(
            MemorySettingsStore::new(values(settings)),
            MemoryCookieStore::new(cookies),
            RecordingNotifier::default(),
        )
    }

    fn base_settings() -> Value {
        json!({
            "enabled": true,
            "cleanupMode": "immediate",
            "notificationsEnabled": true,
            "trackerPresets": { "google": true },
        })
    }

    #[tokio::test]
    async fn test_blacklisted_cookie_deleted_immediately() {
        let mut settings = base_settings();
        settings["blacklist"] = json!(["tracker.example.com"]);
        let cookie = CookieRecord::new("sid", ".tracker.example.com");
        let mut coord = coordinator(settings, vec![cookie.clone()]);

        let event = coord.on_cookie_changed(&CookieChange::added(cookie)).await.unwrap();
        assert_eq!(event.decision, Decision::new(Verdict::DeleteCookie, Reason::Blacklisted));
        assert_eq!(event.outcome, Some(CleanupOutcome::Deleted));
        assert!(coord.cookie_store().is_empty());
        assert_eq!(coord.session().stats().total_cookies_blocked, 1);
        assert_eq!(
            coord.notifier().messages(),
            vec![("Blocked tracking cookie from tracker.example.com".to_string(), NotificationKind::Blocked)]
        );
    }

    #[tokio::test]
    async fn test_tracker_preset_needs_tracker_name() {
        let ga = CookieRecord::new("_ga", ".www.google-analytics.com");
        let custom = CookieRecord::new("random_custom", ".www.google-analytics.com");
        let mut coord = coordinator(base_settings(), vec![ga.clone(), custom.clone()]);

        let event = coord.on_cookie_changed(&CookieChange::added(ga)).await.unwrap();
        assert_eq!(event.decision.verdict, Verdict::DeleteCookie);

        let event = coord.on_cookie_changed(&CookieChange::added(custom.clone())).await.unwrap();
        assert_eq!(event.decision, Decision::retain(Reason::Tracker));
        assert_eq!(event.outcome, None);
        assert_eq!(coord.cookie_store().cookies().unwrap(), vec![custom]);
    }

    #[tokio::test]
    async fn test_deferred_mode_keeps_cookie_until_tab_close() {
        let mut settings = base_settings();
        settings["cleanupMode"] = json!("deferred");
        let ga = CookieRecord::new("_ga", ".google-analytics.com");
        let mut coord = coordinator(settings, vec![ga.clone()]);

        coord.on_tab_updated(7, Some("https://google-analytics.com/collect")).await;
        let event = coord.on_cookie_changed(&CookieChange::added(ga)).await.unwrap();
        assert_eq!(event.decision, Decision::retain(Reason::Tracker));
        assert_eq!(coord.cookie_store().len(), 1);

        let closed = coord.on_tab_removed(7).await.unwrap();
        assert_eq!(closed.decision.verdict, Verdict::DeleteDomain);
        assert_eq!(closed.report.unwrap().deleted, 1);
        assert!(coord.cookie_store().is_empty());
    }

    #[tokio::test]
    async fn test_whitelisted_tab_close_deletes_nothing() {
        let mut settings = base_settings();
        settings["whitelist"] = json!(["*.example.com"]);
        settings["blacklist"] = json!(["shop.example.com"]);
        let cookies = vec![
            CookieRecord::new("cart", "shop.example.com"),
            CookieRecord::new("sid", ".shop.example.com"),
        ];
        let mut coord = coordinator(settings, cookies);

        assert_eq!(
            coord.on_tab_updated(3, Some("https://shop.example.com/basket")).await,
            Some("shop.example.com".to_string())
        );
        let closed = coord.on_tab_removed(3).await.unwrap();
        assert_eq!(closed.decision, Decision::allow(Reason::Whitelisted));
        assert_eq!(closed.report, None);
        assert_eq!(coord.cookie_store().len(), 2);
        assert_eq!(coord.session().domain_for(3), None);
    }

    #[tokio::test]
    async fn test_tab_close_retains_preferences() {
        let mut settings = base_settings();
        settings["blacklist"] = json!(["*.news.example"]);
        settings["retainPreferences"] = json!(true);
        let cookies = vec![
            CookieRecord::new("theme", ".news.example"),
            CookieRecord::new("dark_mode", "news.example"),
            CookieRecord::new("sid", ".news.example"),
            CookieRecord::new("uid", "news.example"),
        ];
        let mut coord = coordinator(settings, cookies);

        coord.on_tab_updated(1, Some("https://news.example/")).await;
        let report = coord.on_tab_removed(1).await.unwrap().report.unwrap();
        assert_eq!(report.deleted, 2);
        assert_eq!(report.retained, 2);

        let names: Vec<_> = coord.cookie_store().cookies().unwrap().into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["theme", "dark_mode"]);
        assert_eq!(
            coord.notifier().messages(),
            vec![("Cleaned 2 cookies from news.example".to_string(), NotificationKind::Success)]
        );
    }

    #[tokio::test]
    async fn test_tab_close_uses_settings_at_close_time() {
        let mut coord = coordinator(base_settings(), vec![CookieRecord::new("sid", "late.example")]);
        coord.on_tab_updated(2, Some("https://late.example/")).await;

        coord
            .settings_store()
            .set(values(json!({ "blacklist": ["late.example"] })))
            .await
            .unwrap();

        let closed = coord.on_tab_removed(2).await.unwrap();
        assert_eq!(closed.decision.reason, Reason::Blacklisted);
        assert!(coord.cookie_store().is_empty());
    }

    #[tokio::test]
    async fn test_disabled_extension_clears_association_without_deleting() {
        let mut settings = base_settings();
        settings["enabled"] = json!(false);
        settings["blacklist"] = json!(["spam.example"]);
        let cookie = CookieRecord::new("sid", "spam.example");
        let mut coord = coordinator(settings, vec![cookie.clone()]);

        coord.on_tab_updated(4, Some("http://spam.example")).await;
        assert_eq!(coord.on_tab_removed(4).await, None);
        assert_eq!(coord.session().domain_for(4), None);
        assert_eq!(coord.on_cookie_changed(&CookieChange::added(cookie)).await, None);
        assert_eq!(coord.cookie_store().len(), 1);
    }

    #[tokio::test]
    async fn test_navigation_overwrites_and_ignores_bad_urls() {
        let mut coord = coordinator(base_settings(), Vec::new());
        coord.on_tab_updated(9, Some("https://first.example/")).await;
        coord.on_tab_updated(9, Some("https://second.example/")).await;
        assert_eq!(coord.session().domain_for(9), Some("second.example"));

        assert_eq!(coord.on_tab_updated(9, Some("about:blank")).await, None);
        assert_eq!(coord.on_tab_updated(9, None).await, None);
        assert_eq!(coord.session().domain_for(9), Some("second.example"));

        assert_eq!(coord.on_tab_removed(42).await, None);
    }

    #[tokio::test]
    async fn test_failed_cookie_removal_is_reported_not_counted() {
        let mut settings = base_settings();
        settings["blacklist"] = json!(["spam.example"]);
        let cookie = CookieRecord::new("sid", "spam.example");
        let mut coord = Coordinator::new(
            MemorySettingsStore::new(values(settings)),
            MemoryCookieStore::new(vec![cookie.clone()]).with_locked("sid"),
            RecordingNotifier::default(),
        );

        let event = coord.on_cookie_changed(&CookieChange::added(cookie)).await.unwrap();
        assert!(matches!(event.outcome, Some(CleanupOutcome::Failed(_))));
        assert_eq!(coord.session().stats().total_cookies_blocked, 0);
        assert!(coord.notifier().messages().is_empty());
    }

    #[tokio::test]
    async fn test_blocked_notifications_are_throttled() {
        let mut settings = base_settings();
        settings["blacklist"] = json!(["spam.example"]);
        let mut coord = coordinator(settings, Vec::new());

        for i in 0..7 {
            let cookie = CookieRecord::new(&format!("c{i}"), "spam.example");
            coord.cookie_store().add(cookie.clone()).unwrap();
            coord.on_cookie_changed(&CookieChange::added(cookie)).await;
        }
        assert_eq!(coord.session().stats().total_cookies_blocked, 7);
        // 1st and 6th block
        assert_eq!(coord.notifier().messages().len(), 2);
    }

    #[tokio::test]
    async fn test_notifications_can_be_disabled() {
        let mut settings = base_settings();
        settings["blacklist"] = json!(["spam.example"]);
        settings["notificationsEnabled"] = json!(false);
        let cookie = CookieRecord::new("sid", "spam.example");
        let mut coord = coordinator(settings, vec![cookie.clone()]);

        coord.on_cookie_changed(&CookieChange::added(cookie)).await;
        assert_eq!(coord.session().stats().total_cookies_blocked, 1);
        assert!(coord.notifier().messages().is_empty());
    }

    #[tokio::test]
    async fn test_badges_follow_cookies_and_settings() {
        let cookies = vec![
            CookieRecord::new("a", "site.example"),
            CookieRecord::new("b", ".site.example"),
        ];
        let mut coord = coordinator(base_settings(), cookies);

        coord.on_tab_updated(5, Some("https://site.example/")).await;
        assert_eq!(coord.notifier().last_badge(5), Some(("2".to_string(), BadgeColor::Neutral)));

        coord
            .settings_store()
            .set(values(json!({ "whitelist": ["site.example"] })))
            .await
            .unwrap();
        coord.on_settings_changed(&SettingsChange::sync(["whitelist"])).await;
        assert_eq!(coord.notifier().last_badge(5), Some(("2".to_string(), BadgeColor::Whitelisted)));

        let removed = CookieChange {
            removed: true,
            cookie: CookieRecord::new("c", ".site.example"),
        };
        assert_eq!(coord.on_cookie_changed(&removed).await, None);
        assert_eq!(coord.notifier().badges.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_dispatch_replays_events() {
        let mut settings = base_settings();
        settings["blacklist"] = json!(["spam.example"]);
        let mut coord = coordinator(settings, vec![CookieRecord::new("sid", "spam.example")]);

        let events: Vec<BrowserEvent> = serde_json::from_value(json!([
            { "type": "tabUpdated", "tabId": 1, "url": "https://spam.example/" },
            { "type": "adsBlocked", "tabId": 1, "count": 3 },
            { "type": "tabRemoved", "tabId": 1 },
        ]))
        .unwrap();
        for event in events {
            coord.dispatch(event).await;
        }

        assert!(coord.cookie_store().is_empty());
        assert_eq!(coord.session().stats().total_ads_blocked, 3);
        assert_eq!(coord.session().ads_for(1), 0);
    }

    #[test]
    fn test_session_ads_accumulate_by_delta() {
        let mut session = Session::new();
        assert_eq!(session.record_ads(1, 2), 2);
        assert_eq!(session.record_ads(1, 5), 5);
        assert_eq!(session.record_ads(2, 1), 6);
        assert_eq!(session.record_ads(1, 5), 6);
        assert_eq!(session.ads_for(1), 5);
    }

    #[test]
    fn test_session_counters_saturate() {
        let mut session = Session::new();
        assert_eq!(session.record_ads(1, u32::MAX), u32::MAX);
        assert_eq!(session.record_ads(2, 1), u32::MAX);
        assert_eq!(session.stats().total_ads_blocked, u32::MAX);

        session.stats.total_cookies_blocked = u32::MAX;
        assert_eq!(session.record_blocked_cookie(), u32::MAX);
    }

    #[tokio::test]
    async fn test_ad_report_from_message_cannot_overflow() {
        let mut coord = coordinator(base_settings(), Vec::new());
        coord.on_ads_blocked(1, u32::MAX);
        assert_eq!(coord.on_ads_blocked(2, 7), u32::MAX);
    }

    /// Settings store that is never reachable.
    struct UnavailableSettingsStore;

    #[async_trait]
    impl SettingsStore for UnavailableSettingsStore {
        async fn get(&self, _keys: &[&str]) -> Result<Map<String, Value>, StoreError> {
            Err(StoreError::Unavailable("storage quota exceeded".to_string()))
        }

        async fn set(&self, _values: Map<String, Value>) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("storage quota exceeded".to_string()))
        }
    }

    #[tokio::test]
    async fn test_unreadable_settings_delete_nothing() {
        let cookies = vec![
            CookieRecord::new("sid", ".spam.example"),
            CookieRecord::new("_ga", ".www.google-analytics.com"),
        ];
        let mut coord = Coordinator::new(
            UnavailableSettingsStore,
            MemoryCookieStore::new(cookies.clone()),
            RecordingNotifier::default(),
        );

        assert_eq!(coord.load_settings().await, Settings::default());

        coord.on_tab_updated(1, Some("https://spam.example/")).await;
        assert_eq!(coord.on_tab_removed(1).await, None);
        assert_eq!(coord.session().domain_for(1), None);

        let ga = CookieChange::added(cookies[1].clone());
        assert_eq!(coord.on_cookie_changed(&ga).await, None);

        assert_eq!(coord.cookie_store().cookies().unwrap(), cookies);
        assert_eq!(coord.session().stats(), Stats::default());
        assert!(coord.notifier().messages().is_empty());
    }

    #[test]
    fn test_session_tabs_on_cookie_domain() {
        let mut session = Session::new();
        session.track(1, "example.com".to_string());
        session.track(2, "www.example.com".to_string());
        session.track(3, "notexample.com".to_string());
        let tabs: Vec<_> = session.tabs_on("example.com").into_iter().map(|(t, _)| t).collect();
        assert_eq!(tabs, vec![1, 2]);
    }
}
