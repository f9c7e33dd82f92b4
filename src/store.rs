//! Key-Value Storage
//!
//! Generic persistence seam for the updater. The host decides what actually
//! backs it (site options, transients, a settings table); the updater only
//! sees `get`/`set`/`delete`. Two instances are used: one durable store for
//! package records and one short-TTL store for cached API responses.
//!
//! Storage failures are deliberately soft: a store that cannot read or
//! write behaves as if the key were absent, and the updater re-checks on a
//! later page load.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

/// Opaque key-value persistence with optional per-entry TTL.
pub trait KeyValueStore: Send + Sync {
    /// Fetch a value. Expired or missing entries return `None`.
    fn get(&self, key: &str) -> Option<Vec<u8>>;

    /// Store a value. `None` TTL means the entry never expires.
    fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>);

    /// Remove a value. Removing a missing key is a no-op.
    fn delete(&self, key: &str);
}

/// In-memory store with expiry stamps.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, MemoryEntry>>,
}

struct MemoryEntry {
    value: Vec<u8>,
    expires_at: Option<i64>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<Vec<u8>> {
        let mut entries = self.entries.lock().unwrap();
        let expired = match entries.get(key) {
            Some(entry) => matches!(entry.expires_at, Some(at) if at <= Utc::now().timestamp()),
            None => return None,
        };
        if expired {
            entries.remove(key);
            return None;
        }
        entries.get(key).map(|entry| entry.value.clone())
    }

    fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) {
        let expires_at = ttl.map(|ttl| Utc::now().timestamp() + ttl.as_secs() as i64);
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), MemoryEntry { value, expires_at });
    }

    fn delete(&self, key: &str) {
        self.entries.lock().unwrap().remove(key);
    }
}

/// Entry wrapper persisted by `FileStore`.
#[derive(Debug, Serialize, Deserialize)]
struct FileEntry {
    value: Vec<u8>,
    expires_at: Option<i64>,
}

/// File-backed store: one JSON file per key under a base directory.
///
/// Writes go to a temp file first, then rename (atomic), so a reader never
/// observes a torn entry.
pub struct FileStore {
    base_dir: PathBuf,
}

impl FileStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        let safe: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
            .collect();
        self.base_dir.join(format!("{}.json", safe))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<Vec<u8>> {
        let path = self.entry_path(key);
        let content = fs::read_to_string(&path).ok()?;
        let entry: FileEntry = match serde_json::from_str(&content) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(key, error = %e, "discarding unreadable store entry");
                let _ = fs::remove_file(&path);
                return None;
            }
        };
        if matches!(entry.expires_at, Some(at) if at <= Utc::now().timestamp()) {
            let _ = fs::remove_file(&path);
            return None;
        }
        Some(entry.value)
    }

    fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) {
        let entry = FileEntry {
            value,
            expires_at: ttl.map(|ttl| Utc::now().timestamp() + ttl.as_secs() as i64),
        };
        let content = match serde_json::to_string(&entry) {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!(key, error = %e, "failed to serialize store entry");
                return;
            }
        };

        let path = self.entry_path(key);
        let temp_path = path.with_extension("tmp");
        let result = fs::create_dir_all(&self.base_dir)
            .and_then(|_| fs::write(&temp_path, &content))
            .and_then(|_| fs::rename(&temp_path, &path));
        if let Err(e) = result {
            tracing::warn!(key, error = %e, "failed to write store entry");
        }
    }

    fn delete(&self, key: &str) {
        let path = self.entry_path(key);
        if path.exists() {
            let _ = fs::remove_file(&path);
        }
    }
}
