//! Update State
//!
//! The persisted per-package update record and its store. The record is the
//! single source of truth for "is there an update": the response cache is a
//! disposable projection and never feeds version comparison.

use crate::store::KeyValueStore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Namespace prefix for record keys in the backing store.
const NAMESPACE: &str = "packwatch_";

/// Persisted update state for one tracked package.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageRecord {
    /// Package slug (identity).
    pub slug: String,
    /// Package homepage URL.
    pub url: String,
    /// Version currently installed on the host.
    pub current_version: String,
    /// Newest version reported by a successful remote check. Starts equal
    /// to `current_version` and is only ever overwritten by a successful
    /// response, never cleared.
    pub latest_known_version: String,
    /// Download package URL from the last successful check, empty until then.
    pub download_url: String,
    /// Epoch seconds of the last completed check. Monotonically
    /// non-decreasing across saves for the same slug.
    pub last_checked_at: i64,
    /// Opaque remote-side identifier.
    pub remote_id: String,
}

impl PackageRecord {
    /// Default record seeded on first run: no update known, nothing to
    /// download yet.
    pub fn seeded(slug: &str, url: &str, current_version: &str, now: i64) -> Self {
        Self {
            slug: slug.to_string(),
            url: url.to_string(),
            current_version: current_version.to_string(),
            latest_known_version: current_version.to_string(),
            download_url: String::new(),
            last_checked_at: now,
            remote_id: "0".to_string(),
        }
    }

    /// Seconds since the record was last checked.
    pub fn age(&self, now: i64) -> i64 {
        now - self.last_checked_at
    }
}

/// Load/save interface over the durable key-value store.
pub struct UpdateStateStore {
    store: Arc<dyn KeyValueStore>,
}

impl UpdateStateStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    fn key(slug: &str) -> String {
        format!("{}{}", NAMESPACE, slug)
    }

    /// Load the record for a slug. Absence is a valid first-run state;
    /// a corrupt stored value is treated the same way.
    pub fn load(&self, slug: &str) -> Option<PackageRecord> {
        let bytes = self.store.get(&Self::key(slug))?;
        match serde_json::from_slice(&bytes) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!(slug, error = %e, "discarding corrupt package record");
                None
            }
        }
    }

    /// Persist the record as a single whole-record replace.
    pub fn save(&self, record: &PackageRecord) {
        match serde_json::to_vec(record) {
            Ok(bytes) => self.store.set(&Self::key(&record.slug), bytes, None),
            Err(e) => {
                tracing::warn!(slug = %record.slug, error = %e, "failed to serialize package record")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn state_store() -> (Arc<MemoryStore>, UpdateStateStore) {
        let store = Arc::new(MemoryStore::new());
        let state = UpdateStateStore::new(store.clone());
        (store, state)
    }

    #[test]
    fn test_seeded_defaults() {
        let record = PackageRecord::seeded("acme-plugin", "https://acme.example", "1.0.0", 1000);
        assert_eq!(record.latest_known_version, "1.0.0");
        assert_eq!(record.download_url, "");
        assert_eq!(record.last_checked_at, 1000);
        assert_eq!(record.remote_id, "0");
    }

    #[test]
    fn test_age() {
        let record = PackageRecord::seeded("acme-plugin", "", "1.0.0", 1000);
        assert_eq!(record.age(1500), 500);
    }

    #[test]
    fn test_load_absent() {
        let (_, state) = state_store();
        assert!(state.load("acme-plugin").is_none());
    }

    #[test]
    fn test_save_load_roundtrip() {
        let (_, state) = state_store();
        let record = PackageRecord::seeded("acme-plugin", "https://acme.example", "1.0.0", 42);
        state.save(&record);
        assert_eq!(state.load("acme-plugin"), Some(record));
    }

    #[test]
    fn test_records_are_namespaced() {
        let (store, state) = state_store();
        let record = PackageRecord::seeded("acme-plugin", "", "1.0.0", 0);
        state.save(&record);
        assert!(store.get("packwatch_acme-plugin").is_some());
    }

    #[test]
    fn test_corrupt_record_treated_as_absent() {
        let (store, state) = state_store();
        store.set("packwatch_acme-plugin", b"{broken".to_vec(), None);
        assert!(state.load("acme-plugin").is_none());
    }
}
