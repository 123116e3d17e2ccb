// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Common test utilities for integration tests

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use zonekeeper::config::EngineConfig;
use zonekeeper::daemon::NsdControl;
use zonekeeper::engine::ZoneEngine;
use zonekeeper::source::MemoryZoneSource;

/// Inventory used by the end-to-end example
pub const EXAMPLE_INVENTORY: &str = "\
domains:
  - name: example.test
    serial: 1
    records:
      - { type: NS, name: '@', content: ns1.example.test. }
      - { type: A, name: '@', content: 203.0.113.5 }
";

/// Configuration rooted in `tmp`, with daemon control disabled.
pub fn config(tmp: &TempDir) -> EngineConfig {
    let mut config = EngineConfig::default();
    config.zone_dir = tmp.path().join("zones");
    config.zones_conf = tmp.path().join("zones.conf");
    config.lock_timeout_secs = 10;
    config.daemon.enabled = false;
    config
}

/// Write `yaml` as the inventory file and build an engine on top of it.
pub async fn engine_from_inventory(
    tmp: &TempDir,
    config: EngineConfig,
    yaml: &str,
) -> (ZoneEngine<MemoryZoneSource>, PathBuf) {
    let inventory = tmp.path().join("inventory.yaml");
    std::fs::write(&inventory, yaml).unwrap();
    let source = MemoryZoneSource::load(&inventory).await.unwrap();
    let daemon = Arc::new(NsdControl::new(&config));
    (ZoneEngine::new(config, Arc::new(source), daemon), inventory)
}

/// Executable shell script standing in for `nsd-control`.
#[cfg(unix)]
pub fn control_script(dir: &Path, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join("nsd-control");
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// Serial on the SOA line of a rendered zone.
pub fn soa_serial(zone_text: &str) -> u32 {
    let line = zone_text
        .lines()
        .find(|l| l.contains(" IN SOA "))
        .expect("zone has an SOA line");
    let open = line.find('(').expect("SOA timers are parenthesized");
    line[open + 1..]
        .split_whitespace()
        .next()
        .and_then(|s| s.parse().ok())
        .expect("serial is numeric")
}

/// Leftover temporary files in `dir`.
pub fn temp_files(dir: &Path) -> Vec<String> {
    std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(Result::ok)
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .filter(|n| n.ends_with(".tmp"))
                .collect()
        })
        .unwrap_or_default()
}
