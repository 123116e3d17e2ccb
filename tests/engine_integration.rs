// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! End-to-end tests for the zone engine
//!
//! These run the full chain against a temporary zone directory and the
//! YAML-backed data source.

mod common;

use common::{config, engine_from_inventory, soa_serial, temp_files, EXAMPLE_INVENTORY};
use std::time::Duration;
use tempfile::TempDir;
use zonekeeper::engine::SyncState;
use zonekeeper::errors::ZoneError;
use zonekeeper::model::{RecordInput, RecordType};
use zonekeeper::source::{MemoryZoneSource, ZoneDataSource};
use zonekeeper::store::registry::parse_zone_list;

const ZONE: &str = "example.test";

#[tokio::test]
async fn test_adding_a_record_regenerates_zone() {
    let tmp = TempDir::new().unwrap();
    let (engine, inventory) = engine_from_inventory(&tmp, config(&tmp), EXAMPLE_INVENTORY).await;

    let change = engine
        .create_record(ZONE, RecordInput::new(RecordType::A, "www", "203.0.113.6"))
        .await
        .unwrap();
    assert_eq!(change.sync.serial, 2);

    let text = engine.store().read_zone(ZONE).await.unwrap().unwrap();
    assert_eq!(soa_serial(&text), 2);
    assert!(text.contains("@ 3600 IN A 203.0.113.5"));
    assert!(text.contains("www 3600 IN A 203.0.113.6"));

    // Re-rendering without changes yields the same text and serial
    let again = engine.preview(ZONE).await.unwrap();
    assert_eq!(again, text);
    assert_eq!(soa_serial(&again), 2);

    // The serial survives a reload of the inventory
    engine.source().save(&inventory).await.unwrap();
    let reloaded = MemoryZoneSource::load(&inventory).await.unwrap();
    assert_eq!(reloaded.domain(ZONE).await.unwrap().unwrap().serial, 2);
}

#[tokio::test]
async fn test_commit_registers_zone_in_daemon_list() {
    let tmp = TempDir::new().unwrap();
    let (engine, _) = engine_from_inventory(&tmp, config(&tmp), EXAMPLE_INVENTORY).await;

    let report = engine.synchronize(ZONE).await.unwrap();
    assert_eq!(report.state, SyncState::Committed);

    let list = std::fs::read_to_string(tmp.path().join("zones.conf")).unwrap();
    let entries = parse_zone_list(&list);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].name, ZONE);
    assert_eq!(entries[0].zonefile, report.path);
}

#[tokio::test]
async fn test_overlapping_commits_keep_highest_serial() {
    let tmp = TempDir::new().unwrap();
    let (engine, _) = engine_from_inventory(&tmp, config(&tmp), EXAMPLE_INVENTORY).await;

    let (first, second) = tokio::join!(
        engine.create_record(ZONE, RecordInput::new(RecordType::A, "www", "203.0.113.6")),
        engine.create_record(ZONE, RecordInput::new(RecordType::A, "api", "203.0.113.7")),
    );
    let first = first.unwrap();
    let second = second.unwrap();

    let mut serials = [first.sync.serial, second.sync.serial];
    serials.sort_unstable();
    assert_eq!(serials, [2, 3]);

    let text = engine.store().read_zone(ZONE).await.unwrap().unwrap();
    assert_eq!(soa_serial(&text), 3);
    assert!(text.contains("www 3600 IN A 203.0.113.6"));
    assert!(text.contains("api 3600 IN A 203.0.113.7"));
    assert!(temp_files(&tmp.path().join("zones")).is_empty());
}

#[tokio::test]
async fn test_many_writers_serialize_per_domain() {
    let tmp = TempDir::new().unwrap();
    let (engine, _) = engine_from_inventory(&tmp, config(&tmp), EXAMPLE_INVENTORY).await;

    let writes = (0..16).map(|i| {
        engine.create_record(
            ZONE,
            RecordInput::new(RecordType::A, &format!("host{i}"), &format!("198.51.100.{i}")),
        )
    });
    let results = futures::future::join_all(writes).await;

    let mut serials: Vec<u32> = results.into_iter().map(|r| r.unwrap().sync.serial).collect();
    serials.sort_unstable();
    assert_eq!(serials, (2..=17).collect::<Vec<u32>>());

    let text = engine.store().read_zone(ZONE).await.unwrap().unwrap();
    assert_eq!(soa_serial(&text), 17);
    assert_eq!(text.matches(" IN A 198.51.100.").count(), 16);
}

#[tokio::test]
async fn test_different_domains_do_not_block_each_other() {
    let tmp = TempDir::new().unwrap();
    let inventory = format!(
        "{EXAMPLE_INVENTORY}  - name: other.test\n    records:\n      - {{ type: NS, name: '@', content: ns1.other.test. }}\n"
    );
    let mut cfg = config(&tmp);
    cfg.lock_timeout_secs = 1;
    let (engine, _) = engine_from_inventory(&tmp, cfg, &inventory).await;

    let held = engine.store().lock(ZONE).await.unwrap();

    let other = tokio::time::timeout(Duration::from_secs(5), engine.synchronize("other.test"))
        .await
        .expect("other domain is not blocked");
    assert_eq!(other.unwrap().serial, 2);

    // The held domain times out instead of waiting forever
    let blocked = engine.synchronize(ZONE).await.unwrap_err();
    assert!(matches!(blocked, ZoneError::Concurrency { .. }));
    drop(held);

    assert!(engine.synchronize(ZONE).await.is_ok());
}

#[tokio::test]
async fn test_domain_lifecycle_and_listing() {
    let tmp = TempDir::new().unwrap();
    let (engine, _) = engine_from_inventory(&tmp, config(&tmp), "").await;

    engine
        .create_domain(zonekeeper::model::NewDomain {
            name: "b.test".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();
    engine
        .create_domain(zonekeeper::model::NewDomain {
            name: "a.test".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();

    let files = engine.store().list_zone_files().await.unwrap();
    let names: Vec<&str> = files.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["a.test", "b.test"]);
    assert!(files.iter().all(|f| f.size > 0));

    engine.delete_domain("a.test").await.unwrap();
    let files = engine.store().list_zone_files().await.unwrap();
    assert_eq!(files.len(), 1);
    let list = std::fs::read_to_string(tmp.path().join("zones.conf")).unwrap();
    assert!(!list.contains("a.test"));
    assert!(list.contains("b.test"));
}

#[cfg(unix)]
#[tokio::test]
async fn test_reload_through_control_script() {
    let tmp = TempDir::new().unwrap();
    let log = tmp.path().join("calls.log");
    let script = common::control_script(
        tmp.path(),
        &format!("echo \"$@\" >> {}\necho ok", log.display()),
    );
    let mut cfg = config(&tmp);
    cfg.daemon.enabled = true;
    cfg.daemon.control_command = script;
    let (engine, _) = engine_from_inventory(&tmp, cfg, EXAMPLE_INVENTORY).await;

    let report = engine.synchronize(ZONE).await.unwrap();
    assert!(report.reloaded());
    assert_eq!(engine.zone_state(ZONE), SyncState::Synced);

    let calls = std::fs::read_to_string(&log).unwrap();
    assert_eq!(calls, "reconfig\nreload example.test\n");
}

#[cfg(unix)]
#[tokio::test]
async fn test_failed_reload_keeps_committed_zone() {
    let tmp = TempDir::new().unwrap();
    let script = common::control_script(tmp.path(), "echo 'error: could not connect' >&2\nexit 1");
    let mut cfg = config(&tmp);
    cfg.daemon.enabled = true;
    cfg.daemon.control_command = script;
    let (engine, _) = engine_from_inventory(&tmp, cfg, EXAMPLE_INVENTORY).await;

    let change = engine
        .create_record(ZONE, RecordInput::new(RecordType::A, "www", "203.0.113.6"))
        .await
        .unwrap();
    let warning = change.sync.reload_warning.expect("reload warning");
    assert!(warning.data_saved());
    assert_eq!(change.sync.state, SyncState::Committed);

    let text = engine.store().read_zone(ZONE).await.unwrap().unwrap();
    assert!(text.contains("www 3600 IN A 203.0.113.6"));
}
