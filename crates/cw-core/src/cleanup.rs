//! Cookie deletion batches
//!
//! A batch gathers a domain's cookies (bare and dot-prefixed lookups), splits
//! them with the retention plan and removes the rest one by one. A failed
//! removal is recorded and the batch carries on.

use std::collections::HashSet;

use serde::Serialize;

use crate::policy::plan_cleanup;
use crate::store::{CookieStore, StoreError};
use crate::types::CookieRecord;

/// What happened to one cookie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleanupOutcome {
    Deleted,
    /// Kept as a preference cookie
    Retained,
    Failed(String),
}

/// Aggregated result of one batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupReport {
    pub domain: String,
    pub deleted: usize,
    pub retained: usize,
    /// `(cookie name, reason)` for each failed removal
    pub failed: Vec<(String, String)>,
}

impl CleanupReport {
    pub fn new(domain: &str) -> Self {
        Self {
            domain: domain.to_string(),
            ..Self::default()
        }
    }

    pub fn record(&mut self, cookie: &CookieRecord, outcome: CleanupOutcome) {
        match outcome {
            CleanupOutcome::Deleted => self.deleted += 1,
            CleanupOutcome::Retained => self.retained += 1,
            CleanupOutcome::Failed(reason) => self.failed.push((cookie.name.clone(), reason)),
        }
    }

    /// Fold another batch into this one (multi-domain sweeps).
    pub fn merge(&mut self, other: CleanupReport) {
        self.deleted += other.deleted;
        self.retained += other.retained;
        self.failed.extend(other.failed);
    }

    pub fn total(&self) -> usize {
        self.deleted + self.retained + self.failed.len()
    }
}

/// Every cookie stored for `domain` or `.domain`, without duplicates.
pub async fn cookies_for_domain<C>(store: &C, domain: &str) -> Result<Vec<CookieRecord>, StoreError>
where
    C: CookieStore + ?Sized,
{
    let mut cookies = store.get_all(domain).await?;
    cookies.extend(store.get_all(&format!(".{}", domain)).await?);

    let mut seen = HashSet::new();
    cookies.retain(|c| seen.insert((c.name.clone(), c.domain.clone(), c.path.clone(), c.store_id.clone())));
    Ok(cookies)
}

/// Remove a single cookie.
pub async fn remove_cookie<C>(store: &C, cookie: &CookieRecord) -> CleanupOutcome
where
    C: CookieStore + ?Sized,
{
    match store.remove(&cookie.removal()).await {
        Ok(()) => CleanupOutcome::Deleted,
        Err(e) => {
            log::warn!("Failed to delete cookie {} on {}: {}", cookie.name, cookie.domain, e);
            CleanupOutcome::Failed(e.to_string())
        }
    }
}

/// Delete every cookie of `domain`, keeping preference cookies when asked.
///
/// Fails only if the cookies cannot be listed.
pub async fn delete_domain_cookies<C>(
    store: &C,
    domain: &str,
    retain_preferences: bool,
) -> Result<CleanupReport, StoreError>
where
    C: CookieStore + ?Sized,
{
    let cookies = cookies_for_domain(store, domain).await?;
    let plan = plan_cleanup(&cookies, retain_preferences);

    let mut report = CleanupReport::new(domain);
    for cookie in plan.retain {
        report.record(cookie, CleanupOutcome::Retained);
    }
    for cookie in plan.delete {
        let outcome = remove_cookie(store, cookie).await;
        report.record(cookie, outcome);
    }

    if report.retained > 0 {
        log::info!(
            "Deleted {} cookies for domain: {}, retained {} preference cookies",
            report.deleted,
            domain,
            report.retained
        );
    } else {
        log::info!("Deleted {} cookies for domain: {}", report.deleted, domain);
    }

    Ok(report)
}
