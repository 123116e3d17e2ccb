// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Reports returned by engine operations.

use serde::{Serialize, Serializer};
use std::fmt;
use std::path::PathBuf;

use crate::errors::ZoneError;
use crate::model::Record;

/// Synchronization state of one zone.
///
/// ```text
/// Unsynced -> Rendering -> Committed -> ReloadRequested -> Synced
///                 |                            |
///                 v                            v
///               Failed                     Committed (reload failed)
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum SyncState {
    /// Data changed, zone file stale (or never written)
    #[default]
    Unsynced,
    /// Zone text is being rendered and written
    Rendering,
    /// Zone file matches the data
    Committed,
    /// Reload sent to the daemon, waiting for the answer
    ReloadRequested,
    /// The daemon accepted the reload
    Synced,
    /// Validation or I/O failure; the previous zone file is still in place
    Failed,
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unsynced => "Unsynced",
            Self::Rendering => "Rendering",
            Self::Committed => "Committed",
            Self::ReloadRequested => "ReloadRequested",
            Self::Synced => "Synced",
            Self::Failed => "Failed",
        };
        f.write_str(name)
    }
}

/// Outcome of a successful commit, plus the best-effort reload result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// Zone name
    pub zone: String,
    /// Serial written to the zone file
    pub serial: u32,
    /// Zone file path
    pub path: PathBuf,
    /// Hex SHA-256 of the committed text
    pub digest: String,
    /// `Committed`, or `Synced` when the daemon accepted the reload
    pub state: SyncState,
    /// Why the daemon was not reloaded, if it was not
    #[serde(serialize_with = "serialize_warning")]
    pub reload_warning: Option<ZoneError>,
}

impl SyncReport {
    /// Whether the daemon confirmed the reload.
    #[must_use]
    pub fn reloaded(&self) -> bool {
        self.state == SyncState::Synced
    }

    /// Operator-facing summary.
    #[must_use]
    pub fn message(&self) -> String {
        match &self.reload_warning {
            None if self.reloaded() => format!(
                "Zone {} saved (serial {}) and the nameserver was reloaded",
                self.zone, self.serial
            ),
            None => format!("Zone {} saved (serial {})", self.zone, self.serial),
            Some(warning) => format!(
                "Zone {} saved (serial {}). {}",
                self.zone,
                self.serial,
                warning.user_message()
            ),
        }
    }
}

/// Outcome of a record mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordChange {
    /// The record as persisted (canonical values), or as it was before deletion
    pub record: Record,
    /// The resulting zone commit
    pub sync: SyncReport,
}

/// Outcome of a domain deletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeleteReport {
    /// Zone name
    pub zone: String,
    /// Whether a zone file or zone-list entry was removed
    pub removed_files: bool,
    /// Why the daemon configuration was not reloaded, if it was not
    #[serde(serialize_with = "serialize_warning")]
    pub reconfig_warning: Option<ZoneError>,
}

fn serialize_warning<S: Serializer>(
    warning: &Option<ZoneError>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match warning {
        Some(err) => serializer.serialize_some(&err.to_string()),
        None => serializer.serialize_none(),
    }
}
