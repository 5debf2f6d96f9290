// src/cron/batch.rs
// =============================================================================
// Re-checks every stored backlink, one after another.
//
// How it works:
// 1. Load all records from the store (storage-list order)
// 2. For each record: run the checker, then persist status / linkType /
//    anchorText
// 3. A failure on one record is logged and counted, the loop carries on
// 4. Stamp the last-cron-run marker, even if some records failed
//
// Records are processed one at a time. The JSON store rewrites the whole
// file on every update.
// There is no overall deadline. Each fetch has its own timeout, so a run over
// N records takes at most about N x timeout.
// =============================================================================

use crate::checker::{CheckResult, LinkChecker};
use crate::error::Result;
use crate::storage::{Backlink, BacklinkStatus, BacklinkStore};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

/// Counters for one batch run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummary {
    pub total: usize,
    pub checked: usize,
    pub active: usize,
    pub lost: usize,
    pub no_follow: usize,
    pub errors: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    pub results: BatchSummary,
    /// When the run finished (also stored as lastCronRun)
    pub timestamp: DateTime<Utc>,
}

impl BatchSummary {
    fn record(&mut self, result: &CheckResult) {
        self.checked += 1;
        match result.status {
            BacklinkStatus::Active => self.active += 1,
            BacklinkStatus::Lost => self.lost += 1,
            BacklinkStatus::NoFollow => self.no_follow += 1,
            BacklinkStatus::Pending => {}
        }
    }
}

/// Runs one batch over the whole store.
///
/// Only failing to list the records or to stamp the run marker is an error;
/// per-record failures end up in `errors`.
pub async fn run_batch(store: &dyn BacklinkStore, checker: &dyn LinkChecker) -> Result<BatchReport> {
    info!("Starting backlink check batch");

    let backlinks = store.list().await?;
    let mut summary = BatchSummary {
        total: backlinks.len(),
        ..Default::default()
    };

    for backlink in &backlinks {
        match check_one(store, checker, backlink).await {
            Ok(result) => {
                debug!(id = %backlink.id, status = ?result.status, "Backlink checked");
                summary.record(&result);
            }
            Err(e) => {
                error!(id = %backlink.id, error = %e, "Error checking backlink");
                summary.errors += 1;
            }
        }
    }

    let timestamp = store.record_cron_run().await?;

    info!(
        total = summary.total,
        checked = summary.checked,
        active = summary.active,
        lost = summary.lost,
        no_follow = summary.no_follow,
        errors = summary.errors,
        "Backlink check batch completed"
    );

    Ok(BatchReport {
        results: summary,
        timestamp,
    })
}

// Check + persist. A record deleted mid-run still counts as checked.
async fn check_one(
    store: &dyn BacklinkStore,
    checker: &dyn LinkChecker,
    backlink: &Backlink,
) -> Result<CheckResult> {
    let result = checker
        .check(&backlink.external_url, &backlink.target_url)
        .await?;
    store.update(&backlink.id, result.to_patch()).await?;
    Ok(result)
}
