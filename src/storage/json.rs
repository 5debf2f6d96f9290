// src/storage/json.rs
// =============================================================================
// A BacklinkStore backed by a single JSON file.
//
// File format:
//   { "backlinks": [ ...records... ], "lastCronRun": "2024-06-10T08:00:00Z" }
//
// Every mutation reads the whole file, changes it in memory and writes the
// whole file back. That is fine for the expected size (dozens of records).
//
// A mutex serializes read-modify-write cycles inside this process. Each write
// goes to a staging file that is renamed over the original, so a concurrent
// read sees either the old or the new content. Two processes writing the same
// file can still overwrite each other (last writer wins).
// =============================================================================

use super::record::{generate_id, Backlink, BacklinkPatch, NewBacklink, StorageData};
use super::BacklinkStore;
use crate::error::Result;
use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, error};

pub struct JsonFileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    // Sibling of the storage file, so the rename stays on one filesystem
    fn staging_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    // Reads the file. A missing file is an empty collection.
    async fn read(&self) -> Result<StorageData> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(StorageData::default()),
            Err(e) => {
                error!(path = %self.path.display(), error = %e, "Error reading storage");
                return Err(e.into());
            }
        };

        serde_json::from_str(&content).map_err(|e| {
            error!(path = %self.path.display(), error = %e, "Storage file is not valid JSON");
            e.into()
        })
    }

    // Writes the whole collection back, creating the directory on first use.
    async fn write(&self, data: &StorageData) -> Result<()> {
        let json = serde_json::to_string_pretty(data)?;

        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            if let Err(e) = tokio::fs::create_dir_all(dir).await {
                error!(dir = %dir.display(), error = %e, "Error creating storage directory");
                return Err(e.into());
            }
        }

        // Readers never see a half-written file: write aside, then rename over
        let staging = self.staging_path();
        if let Err(e) = tokio::fs::write(&staging, json).await {
            error!(path = %staging.display(), error = %e, "Error writing storage");
            return Err(e.into());
        }
        if let Err(e) = tokio::fs::rename(&staging, &self.path).await {
            error!(path = %self.path.display(), error = %e, "Error replacing storage file");
            return Err(e.into());
        }

        debug!(path = %self.path.display(), records = data.backlinks.len(), "Storage written");
        Ok(())
    }
}

impl BacklinkStore for JsonFileStore {
    fn list(&self) -> BoxFuture<'_, Result<Vec<Backlink>>> {
        Box::pin(async move { Ok(self.read().await?.backlinks) })
    }

    fn get<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<Option<Backlink>>> {
        Box::pin(async move {
            let data = self.read().await?;
            Ok(data.backlinks.into_iter().find(|b| b.id == id))
        })
    }

    fn create(&self, new: NewBacklink) -> BoxFuture<'_, Result<Backlink>> {
        Box::pin(async move {
            let _guard = self.write_lock.lock().await;
            let mut data = self.read().await?;

            let now = Utc::now();
            // Regenerate on the off chance the random suffix collides
            let mut id = generate_id(now);
            while data.backlinks.iter().any(|b| b.id == id) {
                id = generate_id(now);
            }

            let backlink = Backlink::new(id, new, now);
            data.backlinks.push(backlink.clone());
            self.write(&data).await?;

            Ok(backlink)
        })
    }

    fn update<'a>(
        &'a self,
        id: &'a str,
        patch: BacklinkPatch,
    ) -> BoxFuture<'a, Result<Option<Backlink>>> {
        Box::pin(async move {
            let _guard = self.write_lock.lock().await;
            let mut data = self.read().await?;

            let Some(backlink) = data.backlinks.iter_mut().find(|b| b.id == id) else {
                return Ok(None);
            };

            backlink.apply(patch);
            backlink.last_checked = Some(Utc::now());
            let updated = backlink.clone();

            self.write(&data).await?;
            Ok(Some(updated))
        })
    }

    fn delete<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<bool>> {
        Box::pin(async move {
            let _guard = self.write_lock.lock().await;
            let mut data = self.read().await?;

            let before = data.backlinks.len();
            data.backlinks.retain(|b| b.id != id);

            if data.backlinks.len() == before {
                return Ok(false);
            }

            self.write(&data).await?;
            Ok(true)
        })
    }

    fn record_cron_run(&self) -> BoxFuture<'_, Result<DateTime<Utc>>> {
        Box::pin(async move {
            let _guard = self.write_lock.lock().await;
            let mut data = self.read().await?;

            let now = Utc::now();
            data.last_cron_run = Some(now);
            self.write(&data).await?;

            Ok(now)
        })
    }

    fn last_cron_run(&self) -> BoxFuture<'_, Result<Option<DateTime<Utc>>>> {
        Box::pin(async move { Ok(self.read().await?.last_cron_run) })
    }
}
