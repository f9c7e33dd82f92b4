//! Host Adapters
//!
//! The surfaces this subsystem plugs into on the CMS side: amending the
//! host's update list, answering plugin-information lookups for our slug,
//! and forcing a check when the user visits the updates page. Each
//! amendment is a pure value transformation of the host object handed in.
//!
//! Everything is gated on the host's capability check: when the current
//! user may not update plugins, the notifier is inert end to end.

use crate::checker::UpdateChecker;
use crate::metadata::PackageMetadata;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Host-side permission check.
pub trait CapabilityGate: Send + Sync {
    fn can_update(&self) -> bool;
}

/// Gate that always grants, for hosts without per-user capabilities.
pub struct AlwaysAllowed;

impl CapabilityGate for AlwaysAllowed {
    fn can_update(&self) -> bool {
        true
    }
}

/// One entry in the host's "plugins with updates" list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateEntry {
    pub slug: String,
    pub url: String,
    pub new_version: String,
    /// Download package URL the host installer will fetch.
    pub package: String,
}

/// The host's update-list object, keyed by the host's internal plugin path.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HostUpdateList {
    pub response: HashMap<String, UpdateEntry>,
}

/// Composes the checker with the capability gate and exposes the hook
/// surfaces the host dispatches into.
pub struct UpdateNotifier {
    checker: UpdateChecker,
    gate: Arc<dyn CapabilityGate>,
}

impl UpdateNotifier {
    pub fn new(checker: UpdateChecker, gate: Arc<dyn CapabilityGate>) -> Self {
        Self { checker, gate }
    }

    pub fn checker(&self) -> &UpdateChecker {
        &self.checker
    }

    /// Run the conditional check cycle, unless gated off.
    pub fn ensure_checked(&mut self) {
        if !self.gate.can_update() {
            return;
        }
        self.checker.ensure_checked();
    }

    /// Whether an update is known for the tracked package.
    pub fn has_update(&self) -> bool {
        self.gate.can_update() && self.checker.has_update()
    }

    /// Hook: amend the host's update list with our entry when an update
    /// exists. Returns the list untouched otherwise.
    pub fn amend_update_list(&mut self, mut list: HostUpdateList) -> HostUpdateList {
        if !self.gate.can_update() {
            return list;
        }
        self.checker.ensure_checked();

        let host_path = self.checker.config().host_path.clone();
        if host_path.is_empty() || !self.checker.has_update() {
            return list;
        }

        if let Some(record) = self.checker.record() {
            tracing::debug!(slug = %record.slug, version = %record.latest_known_version, "amending host update list");
            list.response.insert(
                host_path,
                UpdateEntry {
                    slug: record.slug.clone(),
                    url: record.url.clone(),
                    new_version: record.latest_known_version.clone(),
                    package: record.download_url.clone(),
                },
            );
        }
        list
    }

    /// Hook: answer the host's plugin-information lookup when the queried
    /// slug is ours; any other slug gets the host's own result back.
    pub fn plugin_information(&self, slug: &str, fallback: PackageMetadata) -> PackageMetadata {
        if !self.gate.can_update() || slug != self.checker.config().slug {
            return fallback;
        }
        self.checker.get_metadata(fallback)
    }

    /// Hook: the user is looking at the updates page, so check now
    /// regardless of staleness.
    pub fn on_updates_page(&mut self) {
        if !self.gate.can_update() {
            return;
        }
        self.checker.refresh(true);
    }
}
