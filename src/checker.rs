//! Update Checker
//!
//! The staleness-control state machine. Decides when to hit the remote API,
//! merges responses into the persisted record, and answers the two queries
//! the host surfaces need: "is there an update" and "what is the package
//! metadata".
//!
//! A record moves `ABSENT -> SEEDED -> { STALE <-> FRESH }`. Only a response
//! carrying both a version and a download URL counts as a true refresh; a
//! well-formed response missing either field advances the check timestamp
//! without touching version data, and a transport error advances nothing so
//! the next page load retries.

use crate::config::{ConfigError, UpdaterConfig};
use crate::metadata::{CheckResponse, PackageMetadata, PluginInfoResponse};
use crate::state::{PackageRecord, UpdateStateStore};
use crate::store::KeyValueStore;
use crate::transport::{RemoteTransport, ACTION_CHECK_FOR_UPDATE, ACTION_GET_PLUGIN_INFO};
use crate::version;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;

/// Namespace prefix for cached plugin-information responses.
const CACHE_NAMESPACE: &str = "packwatch_filter_";

/// Time source, injectable so staleness is testable without sleeping.
pub trait Clock: Send + Sync {
    /// Current time as epoch seconds.
    fn now(&self) -> i64;
}

/// Wall-clock time.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        Utc::now().timestamp()
    }
}

/// Update checker for a single tracked package.
pub struct UpdateChecker {
    config: UpdaterConfig,
    state: UpdateStateStore,
    cache: Arc<dyn KeyValueStore>,
    transport: Arc<dyn RemoteTransport>,
    clock: Arc<dyn Clock>,
    record: Option<PackageRecord>,
}

impl UpdateChecker {
    /// Build a checker over the durable record store, the short-TTL
    /// response cache and a transport. Validates the config up front.
    pub fn new(
        config: UpdaterConfig,
        records: Arc<dyn KeyValueStore>,
        cache: Arc<dyn KeyValueStore>,
        transport: Arc<dyn RemoteTransport>,
    ) -> Result<Self, ConfigError> {
        Self::with_clock(config, records, cache, transport, Arc::new(SystemClock))
    }

    /// Same as [`UpdateChecker::new`] with an explicit time source.
    pub fn with_clock(
        config: UpdaterConfig,
        records: Arc<dyn KeyValueStore>,
        cache: Arc<dyn KeyValueStore>,
        transport: Arc<dyn RemoteTransport>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            state: UpdateStateStore::new(records),
            cache,
            transport,
            clock,
            record: None,
            config,
        })
    }

    pub fn config(&self) -> &UpdaterConfig {
        &self.config
    }

    /// The last-loaded record, if any check cycle has run.
    pub fn record(&self) -> Option<&PackageRecord> {
        self.record.as_ref()
    }

    fn cache_key(&self) -> String {
        format!("{}{}", CACHE_NAMESPACE, self.config.slug)
    }

    /// Run the conditional check cycle. Idempotent, safe on every page
    /// load: at most one remote call, and none at all while the record is
    /// fresh.
    ///
    /// On the very first run the record is seeded and then checked
    /// immediately, so a new install is never a full staleness window
    /// behind the remote.
    pub fn ensure_checked(&mut self) {
        match self.state.load(&self.config.slug) {
            None => {
                let seeded = PackageRecord::seeded(
                    &self.config.slug,
                    &self.config.package_url,
                    &self.config.current_version,
                    self.clock.now(),
                );
                self.state.save(&seeded);
                self.record = Some(seeded);
                self.refresh(true);
            }
            Some(record) => {
                let stale = record.age(self.clock.now()) > self.config.staleness_interval_secs;
                self.record = Some(record);
                if stale {
                    self.refresh(false);
                } else {
                    tracing::debug!(slug = %self.config.slug, "record fresh, skipping update check");
                }
            }
        }
    }

    /// Perform the remote update check, unconditionally when `force` is
    /// true, otherwise only if the record is stale. Returns the record the
    /// caller should act on; failures leave it untouched.
    pub fn refresh(&mut self, force: bool) -> &PackageRecord {
        let now = self.clock.now();

        if self.record.is_none() {
            let loaded = self.state.load(&self.config.slug).unwrap_or_else(|| {
                let seeded = PackageRecord::seeded(
                    &self.config.slug,
                    &self.config.package_url,
                    &self.config.current_version,
                    now,
                );
                self.state.save(&seeded);
                seeded
            });
            self.record = Some(loaded);
        }

        let due = force
            || self
                .record
                .as_ref()
                .is_some_and(|record| record.age(now) > self.config.staleness_interval_secs);
        if !due {
            return self.record.as_ref().expect("record loaded above");
        }

        match self
            .transport
            .post(ACTION_CHECK_FOR_UPDATE, &[("plugin", &self.config.slug)])
        {
            Err(e) => {
                // A failed check must not look like a fresh one, so the
                // timestamp stays put and the next page load retries.
                tracing::warn!(slug = %self.config.slug, error = %e, "update check failed");
            }
            Ok(value) => {
                let response: CheckResponse = match serde_json::from_value(value) {
                    Ok(response) => response,
                    Err(e) => {
                        // Valid JSON but not the expected shape; counts as
                        // a checked-but-empty response, loudly.
                        tracing::warn!(slug = %self.config.slug, error = %e, "update check response has unexpected shape");
                        CheckResponse {
                            version: None,
                            download_url: None,
                        }
                    }
                };
                let cache_key = self.cache_key();
                let record = self.record.as_mut().expect("record loaded above");
                match (response.version, response.download_url) {
                    (Some(new_version), Some(download_url)) => {
                        tracing::info!(
                            slug = %self.config.slug,
                            version = %new_version,
                            "update check merged remote version"
                        );
                        record.latest_known_version = new_version;
                        record.download_url = download_url;
                        record.last_checked_at = now.max(record.last_checked_at);
                        self.state.save(record);
                        // The cached metadata predates this response.
                        self.cache.delete(&cache_key);
                    }
                    _ => {
                        // Well-formed but empty still counts as "we checked".
                        tracing::warn!(
                            slug = %self.config.slug,
                            "update check response missing version or download URL"
                        );
                        record.last_checked_at = now.max(record.last_checked_at);
                        self.state.save(record);
                    }
                }
            }
        }

        self.record.as_ref().expect("record loaded above")
    }

    /// True iff the last-loaded record advertises a version strictly newer
    /// than the installed one. Never triggers a check.
    pub fn has_update(&self) -> bool {
        match &self.record {
            Some(record) => {
                version::is_newer(&record.latest_known_version, &self.config.current_version)
            }
            None => false,
        }
    }

    /// Answer the host's plugin-information query, from the response cache
    /// when possible. Any failure returns the caller-supplied fallback; a
    /// remote outage must never break the host UI.
    pub fn get_metadata(&self, fallback: PackageMetadata) -> PackageMetadata {
        let key = self.cache_key();

        if let Some(bytes) = self.cache.get(&key) {
            match serde_json::from_slice::<PackageMetadata>(&bytes) {
                Ok(metadata) => {
                    tracing::debug!(slug = %self.config.slug, "plugin info served from cache");
                    return metadata;
                }
                Err(e) => {
                    tracing::warn!(slug = %self.config.slug, error = %e, "discarding corrupt cached plugin info");
                    self.cache.delete(&key);
                }
            }
        }

        let value = match self
            .transport
            .post(ACTION_GET_PLUGIN_INFO, &[("plugin", &self.config.slug)])
        {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(slug = %self.config.slug, error = %e, "plugin info request failed");
                self.cache.delete(&key);
                return fallback;
            }
        };

        let response: PluginInfoResponse = match serde_json::from_value(value) {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(slug = %self.config.slug, error = %e, "plugin info response undecodable");
                self.cache.delete(&key);
                return fallback;
            }
        };

        if response.key_error.is_some() {
            tracing::warn!(slug = %self.config.slug, "plugin info request rejected: key error");
            self.cache.delete(&key);
            return fallback;
        }

        if let Ok(bytes) = serde_json::to_vec(&response.metadata) {
            let ttl = Duration::from_secs(self.config.cache_ttl_secs() as u64);
            self.cache.set(&key, bytes, Some(ttl));
        }
        response.metadata
    }
}
