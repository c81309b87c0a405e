//! Local persistence of the last good feed payload.
//!
//! The snapshot lives under two keys, stored as files in one directory:
//!
//! ```text
//! storage_dir/
//! ├── feed_cache_data   # payload JSON, exactly as fetched
//! └── feed_cache_time   # unix milliseconds of the fetch
//! ```
//!
//! The snapshot is only ever a fallback, so every storage failure is logged
//! and swallowed at the [`SnapshotStore`] boundary.

use chrono::{DateTime, Utc};
use std::future::Future;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, instrument, warn};

use crate::error::StorageError;
use crate::models::{CachedSnapshot, FeedPayload};

pub const DATA_KEY: &str = "feed_cache_data";
pub const TIME_KEY: &str = "feed_cache_time";

/// Where the last good payload is kept between runs.
pub trait SnapshotStore: Send + Sync {
    /// Persist `payload` stamped with the current time. Never fails.
    fn save(&self, payload: &FeedPayload) -> impl Future<Output = ()> + Send;

    /// The stored snapshot, or `None` when absent or unreadable.
    fn load(&self) -> impl Future<Output = Option<CachedSnapshot>> + Send;
}

/// [`SnapshotStore`] keeping each key as a file under one directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    async fn try_save(&self, payload: &FeedPayload) -> Result<(), StorageError> {
        fs::create_dir_all(&self.dir).await?;
        let json = serde_json::to_string(payload)?;
        fs::write(self.dir.join(DATA_KEY), json).await?;
        fs::write(
            self.dir.join(TIME_KEY),
            Utc::now().timestamp_millis().to_string(),
        )
        .await?;
        Ok(())
    }

    async fn try_load(&self) -> Result<Option<CachedSnapshot>, StorageError> {
        let data_path = self.dir.join(DATA_KEY);
        let Some(data) = read_key(&data_path).await? else {
            return Ok(None);
        };
        let payload: FeedPayload = serde_json::from_str(&data)?;

        let saved_at = match read_key(&self.dir.join(TIME_KEY)).await? {
            Some(raw) => parse_millis(&raw)?,
            None => {
                // Data without a stamp: fall back to the file's mtime.
                let modified = fs::metadata(&data_path).await?.modified()?;
                DateTime::<Utc>::from(modified)
            }
        };
        Ok(Some(CachedSnapshot { payload, saved_at }))
    }
}

impl SnapshotStore for FileStore {
    #[instrument(level = "debug", skip_all, fields(dir = %self.dir.display()))]
    async fn save(&self, payload: &FeedPayload) {
        match self.try_save(payload).await {
            Ok(()) => debug!(elements = payload.len(), "Saved feed snapshot"),
            Err(e) => warn!(error = %e, "Failed to save feed snapshot; continuing"),
        }
    }

    #[instrument(level = "debug", skip_all, fields(dir = %self.dir.display()))]
    async fn load(&self) -> Option<CachedSnapshot> {
        match self.try_load().await {
            Ok(Some(snapshot)) => {
                info!(saved_at = %snapshot.saved_at, "Loaded feed snapshot");
                Some(snapshot)
            }
            Ok(None) => {
                debug!("No feed snapshot stored");
                None
            }
            Err(e) => {
                warn!(error = %e, "Failed to read feed snapshot; ignoring");
                None
            }
        }
    }
}

async fn read_key(path: &Path) -> Result<Option<String>, StorageError> {
    match fs::read_to_string(path).await {
        Ok(s) => Ok(Some(s)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn parse_millis(raw: &str) -> Result<DateTime<Utc>, StorageError> {
    raw.trim()
        .parse::<i64>()
        .ok()
        .and_then(DateTime::from_timestamp_millis)
        .ok_or_else(|| StorageError::InvalidTimestamp(raw.to_string()))
}
