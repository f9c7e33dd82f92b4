//! Packwatch Configuration Module
//! Typed updater configuration with validated construction

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default staleness interval: 12 hours.
pub const DEFAULT_STALENESS_INTERVAL_SECS: i64 = 43_200;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required config field: {0}")]
    MissingField(&'static str),
    #[error("Staleness interval must be greater than 60 seconds, got {0}")]
    IntervalTooShort(i64),
}

/// Configuration for a single tracked package.
///
/// One `UpdaterConfig` per `UpdateChecker` instance; all fields are fixed
/// for the lifetime of the checker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdaterConfig {
    /// Stable unique identifier for the package.
    pub slug: String,
    /// Package homepage URL, stored into the persisted record.
    pub package_url: String,
    /// Remote licensing/update API endpoint.
    pub endpoint_url: String,
    /// Version of the package currently installed on the host.
    pub current_version: String,
    /// Seconds after which a cached check is considered outdated.
    #[serde(default = "default_staleness_interval")]
    pub staleness_interval_secs: i64,
    /// The host's internal path/id for this package, used only when
    /// writing into host update-list structures.
    pub host_path: String,
    /// Host platform version, sent with every remote request.
    #[serde(default)]
    pub host_version: String,
    /// Referring site URL, sent with every remote request.
    #[serde(default)]
    pub site_url: String,
    /// License key for licensed endpoints, sent as `key` when present.
    #[serde(default)]
    pub license_key: Option<String>,
    /// Skip TLS certificate verification, scoped to this subsystem's own
    /// actions only. Never applies to other traffic.
    #[serde(default)]
    pub skip_tls_verification: bool,
}

fn default_staleness_interval() -> i64 {
    DEFAULT_STALENESS_INTERVAL_SECS
}

impl UpdaterConfig {
    /// Create a config with the required fields and defaults for the rest.
    pub fn new(
        slug: impl Into<String>,
        endpoint_url: impl Into<String>,
        current_version: impl Into<String>,
    ) -> Self {
        Self {
            slug: slug.into(),
            package_url: String::new(),
            endpoint_url: endpoint_url.into(),
            current_version: current_version.into(),
            staleness_interval_secs: DEFAULT_STALENESS_INTERVAL_SECS,
            host_path: String::new(),
            host_version: String::new(),
            site_url: String::new(),
            license_key: None,
            skip_tls_verification: false,
        }
    }

    /// Validate the configuration.
    ///
    /// The response cache TTL is `staleness_interval - 60`, so the interval
    /// must stay strictly above one minute.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.slug.is_empty() {
            return Err(ConfigError::MissingField("slug"));
        }
        if self.endpoint_url.is_empty() {
            return Err(ConfigError::MissingField("endpoint_url"));
        }
        if self.current_version.is_empty() {
            return Err(ConfigError::MissingField("current_version"));
        }
        if self.staleness_interval_secs <= 60 {
            return Err(ConfigError::IntervalTooShort(self.staleness_interval_secs));
        }
        Ok(())
    }

    /// TTL for cached plugin-information responses, in seconds.
    pub fn cache_ttl_secs(&self) -> i64 {
        self.staleness_interval_secs - 60
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> UpdaterConfig {
        UpdaterConfig::new("acme-plugin", "https://updates.example.com/api", "1.0.0")
    }

    #[test]
    fn test_defaults() {
        let config = valid_config();
        assert_eq!(config.staleness_interval_secs, 43_200);
        assert_eq!(config.cache_ttl_secs(), 43_140);
        assert!(config.license_key.is_none());
        assert!(!config.skip_tls_verification);
    }

    #[test]
    fn test_validate_ok() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_validate_missing_slug() {
        let mut config = valid_config();
        config.slug = String::new();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingField("slug"))
        ));
    }

    #[test]
    fn test_validate_missing_endpoint() {
        let mut config = valid_config();
        config.endpoint_url = String::new();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingField("endpoint_url"))
        ));
    }

    #[test]
    fn test_validate_interval_too_short() {
        let mut config = valid_config();
        config.staleness_interval_secs = 60;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::IntervalTooShort(60))
        ));
    }
}
