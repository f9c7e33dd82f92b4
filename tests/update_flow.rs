//! End-to-end update notification flow against a scripted remote,
//! exercising the full seed / stale / refresh / notify cycle the way a
//! sequence of host page loads would.

use packwatch::checker::Clock;
use packwatch::transport::TransportError;
use packwatch::{
    AlwaysAllowed, HostUpdateList, MemoryStore, PackageMetadata, RemoteTransport, UpdateChecker,
    UpdateNotifier, UpdaterConfig,
};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

/// Pops one scripted response per request; dry scripts answer 503.
struct ScriptedRemote {
    responses: Mutex<Vec<Result<Value, TransportError>>>,
    calls: Mutex<usize>,
}

impl ScriptedRemote {
    fn new(responses: Vec<Result<Value, TransportError>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses),
            calls: Mutex::new(0),
        })
    }

    fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

impl RemoteTransport for ScriptedRemote {
    fn post(&self, _action: &str, _params: &[(&str, &str)]) -> Result<Value, TransportError> {
        *self.calls.lock().unwrap() += 1;
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            Err(TransportError::Status(503))
        } else {
            responses.remove(0)
        }
    }
}

struct TestClock(Mutex<i64>);

impl TestClock {
    fn new() -> Arc<Self> {
        Arc::new(Self(Mutex::new(1_700_000_000)))
    }

    fn advance(&self, secs: i64) {
        *self.0.lock().unwrap() += secs;
    }
}

impl Clock for TestClock {
    fn now(&self) -> i64 {
        *self.0.lock().unwrap()
    }
}

fn checker(
    remote: Arc<ScriptedRemote>,
    clock: Arc<TestClock>,
) -> UpdateChecker {
    let mut config = UpdaterConfig::new("acme-plugin", "https://updates.example.com/api", "1.0.0");
    config.package_url = "https://acme.example".to_string();
    config.host_path = "acme-plugin/acme-plugin.php".to_string();
    UpdateChecker::with_clock(
        config,
        Arc::new(MemoryStore::new()),
        Arc::new(MemoryStore::new()),
        remote,
        clock,
    )
    .unwrap()
}

#[test]
fn fresh_install_to_visible_update() {
    // 1. First page load: no prior record. Seeds and runs the first real
    //    check, which reports nothing newer.
    let remote = ScriptedRemote::new(vec![
        Ok(json!({})),
        Ok(json!({ "version": "1.2.0", "download_url": "https://x/y.zip" })),
        Ok(json!({
            "name": "Acme Plugin",
            "slug": "acme-plugin",
            "version": "1.2.0",
            "changelog": "Fixes",
            "download_link": "https://x/y.zip"
        })),
    ]);
    let clock = TestClock::new();
    let mut notifier = UpdateNotifier::new(
        checker(remote.clone(), clock.clone()),
        Arc::new(AlwaysAllowed),
    );

    notifier.ensure_checked();
    assert_eq!(remote.calls(), 1);
    assert!(!notifier.has_update());
    let record = notifier.checker().record().unwrap();
    assert_eq!(record.latest_known_version, "1.0.0");

    // 2. More page loads within the window: no traffic.
    notifier.ensure_checked();
    notifier.ensure_checked();
    assert_eq!(remote.calls(), 1);

    // 3. The user opens the updates page: forced check finds 1.2.0.
    notifier.on_updates_page();
    assert_eq!(remote.calls(), 2);
    assert!(notifier.has_update());

    // 4. The host's update list picks up our entry.
    let list = notifier.amend_update_list(HostUpdateList::default());
    let entry = &list.response["acme-plugin/acme-plugin.php"];
    assert_eq!(entry.new_version, "1.2.0");
    assert_eq!(entry.package, "https://x/y.zip");

    // 5. The information dialog fetches metadata once, then serves from
    //    cache for the rest of the window.
    let metadata = notifier.plugin_information("acme-plugin", PackageMetadata::default());
    assert_eq!(metadata.name, "Acme Plugin");
    assert_eq!(metadata.changelog, "Fixes");
    assert_eq!(remote.calls(), 3);

    let cached = notifier.plugin_information("acme-plugin", PackageMetadata::default());
    assert_eq!(cached, metadata);
    assert_eq!(remote.calls(), 3);
}

#[test]
fn outage_degrades_and_recovers() {
    let remote = ScriptedRemote::new(vec![
        Ok(json!({})),
        Err(TransportError::Status(500)),
        Ok(json!({ "version": "1.1.0", "download_url": "https://x/z.zip" })),
    ]);
    let clock = TestClock::new();
    let mut checker = checker(remote.clone(), clock.clone());

    checker.ensure_checked();
    let checked_at = checker.record().unwrap().last_checked_at;

    // Next window: the remote is down. The check fails quietly and the
    // timestamp does not move, so the record is still due.
    clock.advance(43_201);
    checker.ensure_checked();
    assert_eq!(remote.calls(), 2);
    assert_eq!(checker.record().unwrap().last_checked_at, checked_at);
    assert!(!checker.has_update());

    // The very next page load retries and succeeds.
    checker.ensure_checked();
    assert_eq!(remote.calls(), 3);
    assert!(checker.has_update());
    assert_eq!(checker.record().unwrap().download_url, "https://x/z.zip");
}

#[test]
fn metadata_outage_never_breaks_the_dialog() {
    let remote = ScriptedRemote::new(vec![Err(TransportError::Status(502))]);
    let clock = TestClock::new();
    let checker = checker(remote.clone(), clock);

    let fallback = PackageMetadata {
        name: "What the host would have shown".to_string(),
        ..Default::default()
    };
    let shown = checker.get_metadata(fallback.clone());
    assert_eq!(shown, fallback);
}

#[test]
fn equal_remote_version_is_not_an_update() {
    let remote = ScriptedRemote::new(vec![Ok(
        json!({ "version": "1.0.0", "download_url": "https://x/y.zip" }),
    )]);
    let clock = TestClock::new();
    let mut checker = checker(remote, clock);

    checker.refresh(true);
    assert!(!checker.has_update());

    // The download URL was still recorded for when a newer version lands.
    assert_eq!(checker.record().unwrap().download_url, "https://x/y.zip");
}

#[test]
fn state_survives_process_restarts() {
    let records: Arc<MemoryStore> = Arc::new(MemoryStore::new());
    let clock = TestClock::new();
    let remote = ScriptedRemote::new(vec![Ok(
        json!({ "version": "2.0.0", "download_url": "https://x/2.zip" }),
    )]);

    let mut config = UpdaterConfig::new("acme-plugin", "https://updates.example.com/api", "1.0.0");
    config.package_url = "https://acme.example".to_string();

    // First request cycle merges an update.
    let mut first = UpdateChecker::with_clock(
        config.clone(),
        records.clone(),
        Arc::new(MemoryStore::new()),
        remote.clone(),
        clock.clone(),
    )
    .unwrap();
    first.ensure_checked();
    assert!(first.has_update());

    // A fresh checker over the same store sees the persisted result with
    // no further remote traffic.
    let mut second = UpdateChecker::with_clock(
        config,
        records,
        Arc::new(MemoryStore::new()),
        remote.clone(),
        clock,
    )
    .unwrap();
    second.ensure_checked();
    assert_eq!(remote.calls(), 1);
    assert!(second.has_update());
    assert_eq!(second.record().unwrap().latest_known_version, "2.0.0");
}
