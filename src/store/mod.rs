// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Zone file storage.
//!
//! [`ZoneStore`] exclusively owns `<zone_dir>/<domain>.zone` files and the daemon
//! zone-list include file. Commits are atomic (see [`atomic`]) and serialized per
//! domain (see [`locks`]).
//!
//! ## Commit sequence
//!
//! 1. Acquire the domain's [`ZoneLease`] (bounded wait)
//! 2. Ensure the zone is listed in the include file
//! 3. Write the rendered text to a temporary file, flush, rename over the target
//! 4. Release the lease
//!
//! Callers that must bump the serial and render under the same lease use
//! [`ZoneStore::lock`] followed by [`ZoneStore::commit_locked`].

pub mod atomic;
pub mod locks;
pub mod registry;

pub use locks::{DomainLocks, ZoneLease};
pub use registry::{ZoneEntry, ZoneRegistry};

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, error, info, warn};

use crate::config::EngineConfig;
use crate::constants::ZONE_FILE_SUFFIX;
use crate::errors::ZoneError;

/// Result of a successful commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitReceipt {
    /// Zone name
    pub zone: String,
    /// Final zone file path
    pub path: PathBuf,
    /// Bytes written
    pub bytes: usize,
    /// Hex SHA-256 of the committed text
    pub digest: String,
    /// Whether this commit added the zone to the daemon zone list
    pub newly_registered: bool,
}

/// A zone file found in the zone directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneFileInfo {
    /// Zone name derived from the file name
    pub name: String,
    /// Full path
    pub path: PathBuf,
    /// Size in bytes
    pub size: u64,
    /// Last modification time, when the platform reports one
    pub modified: Option<DateTime<Utc>>,
}

/// Owner of the zone directory and the daemon zone list.
#[derive(Debug)]
pub struct ZoneStore {
    zone_dir: PathBuf,
    locks: DomainLocks,
    registry: ZoneRegistry,
}

impl ZoneStore {
    /// Build a store from the engine configuration.
    #[must_use]
    pub fn new(config: &EngineConfig) -> Self {
        Self::with_paths(&config.zone_dir, &config.zones_conf, config.lock_timeout())
    }

    /// Build a store from explicit paths.
    #[must_use]
    pub fn with_paths(zone_dir: &Path, zones_conf: &Path, lock_timeout: Duration) -> Self {
        Self {
            zone_dir: zone_dir.to_path_buf(),
            locks: DomainLocks::new(lock_timeout),
            registry: ZoneRegistry::new(zones_conf),
        }
    }

    /// Directory holding the zone files.
    #[must_use]
    pub fn zone_dir(&self) -> &Path {
        &self.zone_dir
    }

    /// The daemon zone-list include file.
    #[must_use]
    pub fn registry(&self) -> &ZoneRegistry {
        &self.registry
    }

    /// Path of the zone file for `domain`.
    ///
    /// # Errors
    ///
    /// Returns [`ZoneError::Validation`] for names that could escape the zone
    /// directory.
    pub fn zone_path(&self, domain: &str) -> Result<PathBuf, ZoneError> {
        if domain.is_empty()
            || domain.starts_with('.')
            || domain.contains(['/', '\\'])
            || domain.contains("..")
        {
            return Err(ZoneError::validation(
                "domain",
                domain,
                "not usable as a zone file name",
            ));
        }
        Ok(self.zone_dir.join(format!("{domain}{ZONE_FILE_SUFFIX}")))
    }

    /// Wait for exclusive access to `domain`.
    ///
    /// # Errors
    ///
    /// Returns [`ZoneError::Concurrency`] when the bounded wait expires.
    pub async fn lock(&self, domain: &str) -> Result<ZoneLease, ZoneError> {
        self.locks.acquire(domain).await
    }

    /// Lock `domain`, commit `zone_text`, and release.
    ///
    /// # Errors
    ///
    /// See [`ZoneStore::commit_locked`].
    pub async fn commit(&self, domain: &str, zone_text: &str) -> Result<CommitReceipt, ZoneError> {
        let lease = self.lock(domain).await?;
        self.commit_locked(&lease, zone_text).await
    }

    /// Commit `zone_text` for the zone held by `lease`.
    ///
    /// # Errors
    ///
    /// Returns [`ZoneError::Io`] if the zone-list update, write, flush or rename
    /// fails. Any failure leaves the previous zone file in place, and a zone-list
    /// entry added by this call is withdrawn again.
    pub async fn commit_locked(
        &self,
        lease: &ZoneLease,
        zone_text: &str,
    ) -> Result<CommitReceipt, ZoneError> {
        let zone = lease.zone();
        let path = self.zone_path(zone)?;

        debug!(zone = %zone, path = %path.display(), "Committing zone file");
        // The zone list is updated first so every error below leaves the live
        // zone file untouched.
        let newly_registered = self.registry.register(zone, &path).await.inspect_err(|e| {
            error!(zone = %zone, error = %e, "Zone list update failed, previous file kept");
        })?;

        if let Err(e) = atomic::write_atomic(path.clone(), zone_text.as_bytes().to_vec()).await {
            error!(zone = %zone, error = %e, "Zone commit failed, previous file kept");
            if newly_registered {
                if let Err(undo) = self.registry.unregister(zone).await {
                    warn!(zone = %zone, error = %undo, "Failed to withdraw zone list entry");
                }
            }
            return Err(e);
        }

        let receipt = CommitReceipt {
            zone: zone.to_string(),
            path,
            bytes: zone_text.len(),
            digest: zone_digest(zone_text),
            newly_registered,
        };
        info!(
            zone = %zone,
            bytes = receipt.bytes,
            digest = %receipt.digest,
            "Committed zone file"
        );
        Ok(receipt)
    }

    /// Lock `domain` and delete its file and zone-list entry.
    ///
    /// # Errors
    ///
    /// See [`ZoneStore::delete_locked`].
    pub async fn delete(&self, domain: &str) -> Result<bool, ZoneError> {
        let lease = self.lock(domain).await?;
        self.delete_locked(&lease).await
    }

    /// Delete the zone file and zone-list entry of the zone held by `lease`.
    ///
    /// Idempotent: returns `Ok(false)` when neither existed.
    ///
    /// # Errors
    ///
    /// Returns [`ZoneError::Io`] for failures other than "not found".
    pub async fn delete_locked(&self, lease: &ZoneLease) -> Result<bool, ZoneError> {
        let zone = lease.zone();
        let path = self.zone_path(zone)?;

        let removed_file = match tokio::fs::remove_file(&path).await {
            Ok(()) => true,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
            Err(e) => return Err(ZoneError::io("remove zone file", &path, &e)),
        };
        let removed_entry = self.registry.unregister(zone).await?;

        if removed_file || removed_entry {
            info!(zone = %zone, removed_file, removed_entry, "Deleted zone");
        } else {
            debug!(zone = %zone, "Zone already absent");
        }
        Ok(removed_file || removed_entry)
    }

    /// Current on-disk text of `domain`, `None` if never committed.
    ///
    /// # Errors
    ///
    /// Returns [`ZoneError::Io`] if the file exists but cannot be read.
    pub async fn read_zone(&self, domain: &str) -> Result<Option<String>, ZoneError> {
        let path = self.zone_path(domain)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ZoneError::io("read zone file", &path, &e)),
        }
    }

    /// Every `*.zone` file in the zone directory, sorted by name.
    ///
    /// A missing zone directory yields an empty list.
    ///
    /// # Errors
    ///
    /// Returns [`ZoneError::Io`] if the directory cannot be read.
    pub async fn list_zone_files(&self) -> Result<Vec<ZoneFileInfo>, ZoneError> {
        let mut dir = match tokio::fs::read_dir(&self.zone_dir).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(ZoneError::io("list zone directory", &self.zone_dir, &e)),
        };

        let mut files = Vec::new();
        while let Some(entry) = dir
            .next_entry()
            .await
            .map_err(|e| ZoneError::io("list zone directory", &self.zone_dir, &e))?
        {
            let file_name = entry.file_name().to_string_lossy().into_owned();
            let Some(name) = file_name.strip_suffix(ZONE_FILE_SUFFIX) else {
                continue;
            };
            if name.is_empty() || name.starts_with('.') {
                continue;
            }
            let Ok(metadata) = entry.metadata().await else {
                continue;
            };
            if !metadata.is_file() {
                continue;
            }
            files.push(ZoneFileInfo {
                name: name.to_string(),
                path: entry.path(),
                size: metadata.len(),
                modified: metadata.modified().ok().map(DateTime::<Utc>::from),
            });
        }
        files.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(files)
    }
}

/// Hex SHA-256 of a zone text.
#[must_use]
pub fn zone_digest(zone_text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(zone_text.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod mod_tests;
