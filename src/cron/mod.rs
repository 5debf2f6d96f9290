// src/cron/mod.rs
// =============================================================================
// This module runs the periodic re-check of all stored backlinks.
//
// The schedule itself lives outside this program (a platform cron job calls
// the /api/seo-tracker/cron endpoint, or an operator runs
// `backlink-tracker cron`). This module only does one pass when asked.
// =============================================================================

mod batch;

pub use batch::{run_batch, BatchReport, BatchSummary};
