//! Packwatch - Plugin update notifier for CMS hosts
//!
//! Periodically polls a remote licensing/update API on behalf of a single
//! software package, caches the result, and feeds it into the host's native
//! "check for updates" and "plugin information" surfaces.
//!
//! Components:
//! - `config` - Typed updater configuration
//! - `store` - Key-value persistence seam plus shipped backends
//! - `state` - The persisted per-package update record
//! - `transport` - Blocking HTTP transport to the remote API
//! - `metadata` - Wire types and normalized plugin metadata
//! - `checker` - Staleness policy, merging, caching
//! - `host` - Capability gate and host hook adapters
//!
//! ```no_run
//! use std::sync::Arc;
//! use packwatch::{
//!     AlwaysAllowed, FileStore, HttpTransport, MemoryStore, UpdateChecker, UpdateNotifier,
//!     UpdaterConfig,
//! };
//!
//! let mut config = UpdaterConfig::new(
//!     "acme-plugin",
//!     "https://updates.example.com/api",
//!     "1.0.0",
//! );
//! config.host_path = "acme-plugin/acme-plugin.php".to_string();
//!
//! let transport = Arc::new(HttpTransport::new(&config)?);
//! let checker = UpdateChecker::new(
//!     config,
//!     Arc::new(FileStore::new("/var/lib/packwatch")),
//!     Arc::new(MemoryStore::new()),
//!     transport,
//! )?;
//! let mut notifier = UpdateNotifier::new(checker, Arc::new(AlwaysAllowed));
//!
//! notifier.ensure_checked();
//! if notifier.has_update() {
//!     // surface it
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod checker;
pub mod config;
pub mod host;
pub mod metadata;
pub mod state;
pub mod store;
pub mod transport;
pub mod version;

pub use checker::{Clock, SystemClock, UpdateChecker};
pub use config::{ConfigError, UpdaterConfig};
pub use host::{AlwaysAllowed, CapabilityGate, HostUpdateList, UpdateEntry, UpdateNotifier};
pub use metadata::PackageMetadata;
pub use state::{PackageRecord, UpdateStateStore};
pub use store::{FileStore, KeyValueStore, MemoryStore};
pub use transport::{HttpTransport, RemoteTransport, TransportError};
