// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! NSD zone-list include file.
//!
//! The daemon configuration includes one file listing every managed zone:
//!
//! ```text
//! # Managed by zonekeeper. Manual edits will be overwritten.
//!
//! zone:
//!     name: "example.test"
//!     zonefile: "/var/lib/nsd/zones/example.test.zone"
//! ```
//!
//! The file is rewritten atomically on every change, entries sorted by zone name.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tokio::sync::Mutex;
use tracing::{debug, info};

use super::atomic::write_atomic;
use crate::constants::ZONES_CONF_HEADER;
use crate::errors::ZoneError;

/// One `zone:` block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneEntry {
    /// Zone name without trailing dot
    pub name: String,
    /// Path of the zone file
    pub zonefile: PathBuf,
}

/// The managed zone-list include file.
#[derive(Debug)]
pub struct ZoneRegistry {
    path: PathBuf,
    // Serializes read-modify-write cycles of the include file
    write_lock: Mutex<()>,
}

impl ZoneRegistry {
    /// Registry backed by the include file at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Path of the include file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All registered zones, sorted by name. A missing file is an empty list.
    ///
    /// # Errors
    ///
    /// Returns [`ZoneError::Io`] if the file exists but cannot be read.
    pub async fn entries(&self) -> Result<Vec<ZoneEntry>, ZoneError> {
        Ok(self.read_map().await?.into_values().collect())
    }

    /// Add or update the entry for `name`. Returns whether the file changed.
    ///
    /// # Errors
    ///
    /// Returns [`ZoneError::Io`] if the file cannot be read or rewritten.
    pub async fn register(&self, name: &str, zonefile: &Path) -> Result<bool, ZoneError> {
        let _guard = self.write_lock.lock().await;
        let mut entries = self.read_map().await?;

        if entries.get(name).is_some_and(|e| e.zonefile == zonefile) {
            return Ok(false);
        }
        entries.insert(
            name.to_string(),
            ZoneEntry {
                name: name.to_string(),
                zonefile: zonefile.to_path_buf(),
            },
        );
        self.write_map(&entries).await?;
        info!(zone = %name, conf = %self.path.display(), "Registered zone in daemon zone list");
        Ok(true)
    }

    /// Remove the entry for `name`. Returns whether the file changed.
    ///
    /// # Errors
    ///
    /// Returns [`ZoneError::Io`] if the file cannot be read or rewritten.
    pub async fn unregister(&self, name: &str) -> Result<bool, ZoneError> {
        let _guard = self.write_lock.lock().await;
        let mut entries = self.read_map().await?;

        if entries.remove(name).is_none() {
            debug!(zone = %name, "Zone not present in daemon zone list");
            return Ok(false);
        }
        self.write_map(&entries).await?;
        info!(zone = %name, conf = %self.path.display(), "Removed zone from daemon zone list");
        Ok(true)
    }

    async fn read_map(&self) -> Result<BTreeMap<String, ZoneEntry>, ZoneError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => Ok(parse_zone_list(&text)
                .into_iter()
                .map(|e| (e.name.clone(), e))
                .collect()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(ZoneError::io("read zone list", &self.path, &e)),
        }
    }

    async fn write_map(&self, entries: &BTreeMap<String, ZoneEntry>) -> Result<(), ZoneError> {
        let text = render_zone_list(entries.values());
        write_atomic(self.path.clone(), text.into_bytes()).await
    }
}

/// Parse `zone:` blocks. Lines that are not `name:`/`zonefile:` are ignored,
/// as are blocks missing either key.
#[must_use]
pub fn parse_zone_list(text: &str) -> Vec<ZoneEntry> {
    let mut entries = Vec::new();
    let mut name: Option<String> = None;
    let mut zonefile: Option<PathBuf> = None;

    let mut flush = |name: &mut Option<String>, zonefile: &mut Option<PathBuf>| {
        if let (Some(n), Some(f)) = (name.take(), zonefile.take()) {
            entries.push(ZoneEntry {
                name: n,
                zonefile: f,
            });
        }
    };

    for line in text.lines() {
        let line = line.split('#').next().unwrap_or_default().trim();
        if line == "zone:" {
            flush(&mut name, &mut zonefile);
        } else if let Some(value) = line.strip_prefix("name:") {
            name = Some(unquote(value).trim_end_matches('.').to_ascii_lowercase());
        } else if let Some(value) = line.strip_prefix("zonefile:") {
            zonefile = Some(PathBuf::from(unquote(value)));
        }
    }
    flush(&mut name, &mut zonefile);
    entries
}

/// Render the include file for `entries`.
pub fn render_zone_list<'a>(entries: impl IntoIterator<Item = &'a ZoneEntry>) -> String {
    let mut out = format!("{ZONES_CONF_HEADER}\n");
    for entry in entries {
        out.push_str(&format!(
            "\nzone:\n    name: \"{}\"\n    zonefile: \"{}\"\n",
            entry.name,
            entry.zonefile.display()
        ));
    }
    out
}

fn unquote(value: &str) -> &str {
    let value = value.trim();
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod registry_tests;
