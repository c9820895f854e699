//! WebAssembly bindings for CookieWipe
//!
//! The extension's service worker passes settings as the JSON object it read
//! from `chrome.storage.sync`; every call decodes them afresh. Tab tracking
//! lives in a per-worker [`Session`].

use std::cell::RefCell;

use cw_core::{
    cookie, pattern, policy,
    presets::preset_table,
    settings::Settings,
    types::{CookieRecord, Decision, TabId},
    url::domain_from_url,
    Policy, Session,
};
use serde_json::{Map, Value};
use wasm_bindgen::prelude::*;

thread_local! {
    static SESSION: RefCell<Session> = RefCell::new(Session::new());
}

// =============================================================================
// Decoding helpers
// =============================================================================

fn parse_settings(settings_json: &str) -> Result<Settings, String> {
    let values: Map<String, Value> =
        serde_json::from_str(settings_json).map_err(|e| format!("Invalid settings JSON: {}", e))?;
    Ok(Settings::from_values(&values))
}

/// Settings for a decision; undecodable input means "allow everything".
fn settings_or_default(settings_json: &str) -> Settings {
    parse_settings(settings_json).unwrap_or_else(|e| {
        web_sys::console::warn_1(&JsValue::from_str(&e));
        Settings::default()
    })
}

fn parse_cookies(cookies_json: &str) -> Result<Vec<CookieRecord>, String> {
    serde_json::from_str(cookies_json).map_err(|e| format!("Invalid cookie list: {}", e))
}

fn to_js(value: &impl serde::Serialize) -> Result<JsValue, JsValue> {
    let json = serde_json::to_string(value).map_err(|e| JsValue::from_str(&e.to_string()))?;
    js_sys::JSON::parse(&json)
}

fn decision_to_js(decision: Decision) -> JsValue {
    let result = js_sys::Object::new();
    let _ = js_sys::Reflect::set(&result, &"verdict".into(), &JsValue::from_str(decision.verdict.as_str()));
    let _ = js_sys::Reflect::set(&result, &"reason".into(), &JsValue::from_str(decision.reason.as_str()));
    let _ = js_sys::Reflect::set(&result, &"delete".into(), &JsValue::from(decision.is_delete()));
    result.into()
}

// =============================================================================
// Policy
// =============================================================================

#[wasm_bindgen]
pub fn decide_domain(settings_json: &str, domain: &str) -> JsValue {
    let settings = settings_or_default(settings_json);
    decision_to_js(Policy::new(&settings).decide_domain(domain))
}

#[wasm_bindgen]
pub fn decide_cookie(settings_json: &str, cookie_domain: &str, cookie_name: &str) -> JsValue {
    let settings = settings_or_default(settings_json);
    decision_to_js(Policy::new(&settings).decide_cookie(cookie_domain, cookie_name))
}

#[wasm_bindgen]
pub fn badge_color(settings_json: &str, domain: &str) -> String {
    let settings = settings_or_default(settings_json);
    Policy::new(&settings).badge_color(domain).code().to_string()
}

/// Split a domain's cookies into removals and kept preference cookies.
#[wasm_bindgen]
pub fn plan_cleanup(cookies_json: &str, retain_preferences: bool) -> Result<JsValue, JsValue> {
    let cookies = parse_cookies(cookies_json).map_err(|e| JsValue::from_str(&e))?;
    let plan = policy::plan_cleanup(&cookies, retain_preferences);

    let delete = js_sys::Array::new();
    for cookie in &plan.delete {
        delete.push(&to_js(&cookie.removal())?);
    }
    let retain = js_sys::Array::new();
    for cookie in &plan.retain {
        retain.push(&JsValue::from_str(&cookie.name));
    }

    let result = js_sys::Object::new();
    let _ = js_sys::Reflect::set(&result, &"delete".into(), &delete);
    let _ = js_sys::Reflect::set(&result, &"retain".into(), &retain);
    Ok(result.into())
}

// =============================================================================
// Classification
// =============================================================================

#[wasm_bindgen]
pub fn is_tracking_cookie(name: &str) -> bool {
    cookie::is_tracking_cookie(name)
}

#[wasm_bindgen]
pub fn is_preference_cookie(name: &str) -> bool {
    cookie::is_preference_cookie(name)
}

#[wasm_bindgen]
pub fn get_tracker_presets() -> Result<JsValue, JsValue> {
    to_js(&preset_table())
}

#[wasm_bindgen]
pub fn extract_domain(url: &str) -> Option<String> {
    domain_from_url(url)
}

/// Validate user input for the whitelist/blacklist editors.
#[wasm_bindgen]
pub fn normalize_pattern(raw: &str) -> Result<String, JsValue> {
    pattern::normalize_pattern(raw).map_err(|e| JsValue::from_str(&e.to_string()))
}

#[wasm_bindgen]
pub fn first_run_settings() -> Result<JsValue, JsValue> {
    to_js(&Settings::first_run().to_values())
}

// =============================================================================
// Tab tracking
// =============================================================================

/// Record the domain a tab navigated to. Returns it, or `undefined` for
/// URLs without a host.
#[wasm_bindgen]
pub fn track_tab(tab_id: TabId, url: &str) -> Option<String> {
    let domain = domain_from_url(url)?;
    SESSION.with(|session| session.borrow_mut().track(tab_id, domain.clone()));
    Some(domain)
}

#[wasm_bindgen]
pub fn untrack_tab(tab_id: TabId) -> Option<String> {
    SESSION.with(|session| session.borrow_mut().untrack(tab_id))
}

#[wasm_bindgen]
pub fn tracked_domain(tab_id: TabId) -> Option<String> {
    SESSION.with(|session| session.borrow().domain_for(tab_id).map(str::to_string))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cw_core::types::{Reason, Verdict};

    #[test]
    fn test_parse_settings() {
        let settings = parse_settings(r#"{"enabled": true, "blacklist": ["ads.example.net"]}"#).unwrap();
        assert!(settings.enabled);
        assert_eq!(
            Policy::new(&settings).decide_domain("ads.example.net"),
            Decision::new(Verdict::DeleteDomain, Reason::Blacklisted)
        );
        assert!(parse_settings("[1, 2]").is_err());
        assert!(parse_settings("not json").is_err());
    }

    #[test]
    fn test_parse_cookies() {
        let cookies = parse_cookies(r#"[{"name": "_ga", "domain": ".example.com", "storeId": "0"}]"#).unwrap();
        assert_eq!(cookies[0].path, "/");
        assert!(parse_cookies(r#"[{"name": "_ga"}]"#).is_err());
    }

    #[test]
    fn test_tab_tracking() {
        assert_eq!(track_tab(11, "https://Shop.Example.com/cart"), Some("shop.example.com".to_string()));
        assert_eq!(track_tab(11, "about:blank"), None);
        assert_eq!(tracked_domain(11), Some("shop.example.com".to_string()));
        assert_eq!(untrack_tab(11), Some("shop.example.com".to_string()));
        assert_eq!(tracked_domain(11), None);
    }

    #[test]
    fn test_plain_exports() {
        assert!(is_tracking_cookie("_fbp"));
        assert!(is_preference_cookie("lang"));
        assert_eq!(extract_domain("http://example.org:8080/x"), Some("example.org".to_string()));
    }
}
