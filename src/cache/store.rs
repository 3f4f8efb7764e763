//! Durable per-device storage of raw question pool payloads.
//!
//! One file per bank, `<cache_dir>/<name>.json`, holding exactly the bytes
//! last fetched from the remote pool. The store never expires or deletes
//! entries on its own; overwrites are driven by the synchronizer.

use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use crate::error::SyncError;
use crate::models::BankName;

pub struct CacheStore {
    cache_dir: PathBuf,
}

impl CacheStore {
    /// Create a store rooted at `cache_dir`, creating the directory tree.
    pub fn new(cache_dir: PathBuf) -> Result<Self, SyncError> {
        fs::create_dir_all(&cache_dir).map_err(SyncError::Storage)?;
        Ok(Self { cache_dir })
    }

    fn entry_path(&self, name: BankName) -> PathBuf {
        self.cache_dir.join(format!("{}.json", name.as_str()))
    }

    pub fn exists(&self, name: BankName) -> bool {
        self.entry_path(name).exists()
    }

    /// Raw cached bytes for `name`.
    pub fn read(&self, name: BankName) -> Result<Vec<u8>, SyncError> {
        fs::read(self.entry_path(name)).map_err(|_| SyncError::NotFound(name.to_string()))
    }

    /// Overwrite the cached payload for `name` with `bytes`.
    pub fn write(&self, name: BankName, bytes: &[u8]) -> Result<(), SyncError> {
        debug!(bank = %name, bytes = bytes.len(), "writing cache entry");
        fs::write(self.entry_path(name), bytes).map_err(SyncError::Storage)
    }

    /// When the cache entry was last written, if it exists.
    pub fn modified_at(&self, name: BankName) -> Option<DateTime<Utc>> {
        let meta = fs::metadata(self.entry_path(name)).ok()?;
        let modified = meta.modified().ok()?;
        Some(DateTime::<Utc>::from(modified))
    }

    /// Human-readable age of the cache entry, "never" when absent.
    pub fn age_display(&self, name: BankName) -> String {
        match self.modified_at(name) {
            Some(at) => format_age(Utc::now() - at),
            None => "never".to_string(),
        }
    }

    /// Age strings for every known bank, for status display.
    pub fn ages(&self) -> Vec<(BankName, String)> {
        BankName::ALL
            .iter()
            .map(|&name| (name, self.age_display(name)))
            .collect()
    }
}

fn format_age(age: Duration) -> String {
    let minutes = age.num_minutes();
    if minutes < 1 {
        // Covers sub-minute ages and clock skew
        "just now".to_string()
    } else if minutes < 60 {
        format!("{}m ago", minutes)
    } else if minutes < 1440 {
        format!("{}h ago", minutes / 60)
    } else {
        format!("{}d ago", minutes / 1440)
    }
}
