// src/storage/mod.rs
// =============================================================================
// This module stores the tracked backlinks.
//
// Submodules:
// - record: the Backlink type plus the shapes used to create and edit it
// - json: a store that keeps everything in one pretty-printed JSON file
//
// The rest of the crate only talks to the `BacklinkStore` trait, so the JSON
// file can be swapped for a database without touching the checker, the batch
// runner or the HTTP handlers.
// =============================================================================

mod json;
mod record;

pub use json::JsonFileStore;
pub use record::{
    generate_id, Backlink, BacklinkPatch, BacklinkStatus, LinkType, NewBacklink, StorageData,
};

use crate::error::Result;
use chrono::{DateTime, Utc};
use futures::future::BoxFuture;

/// Persistent collection of backlink records.
///
/// Methods return boxed futures so the store can live behind
/// `Arc<dyn BacklinkStore>` in the server state.
pub trait BacklinkStore: Send + Sync {
    /// All records in insertion order. Empty when nothing was stored yet.
    fn list(&self) -> BoxFuture<'_, Result<Vec<Backlink>>>;

    fn get<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<Option<Backlink>>>;

    /// Adds a record with a fresh id, `createdAt = now` and status Pending.
    fn create(&self, new: NewBacklink) -> BoxFuture<'_, Result<Backlink>>;

    /// Merges `patch` into the record and stamps `lastChecked = now`.
    ///
    /// The timestamp is refreshed on every update, including manual edits
    /// that only touch notes. Returns `None` when the id is unknown.
    fn update<'a>(
        &'a self,
        id: &'a str,
        patch: BacklinkPatch,
    ) -> BoxFuture<'a, Result<Option<Backlink>>>;

    /// Removes the record. Returns whether anything was removed.
    fn delete<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<bool>>;

    /// Remembers that a batch run just finished.
    fn record_cron_run(&self) -> BoxFuture<'_, Result<DateTime<Utc>>>;

    fn last_cron_run(&self) -> BoxFuture<'_, Result<Option<DateTime<Utc>>>>;
}
