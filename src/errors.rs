// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Error types for zone synthesis and daemon synchronization.
//!
//! This module provides the single error type returned by the engine. Each
//! variant maps to one failure class the caller must handle differently:
//! - Validation failures (user must correct the input, nothing changed)
//! - Missing domains or records (caller retries or reports)
//! - Lock contention beyond the configured bound
//! - Filesystem failures while committing (previous zone file stays authoritative)
//! - Daemon reload failures (data committed, daemon not informed)
//!
//! The split between "data was not saved" and "data was saved but the daemon was
//! not reloaded" is carried by [`ZoneError::data_saved`] so front-ends never
//! conflate the two.

use thiserror::Error;

/// Errors returned by the zone engine and its components.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ZoneError {
    /// Invalid record name, record content or domain attribute
    ///
    /// Returned before any persistence or file I/O takes place.
    #[error("Invalid {field} '{value}': {reason}")]
    Validation {
        /// Which input was rejected (e.g. "name", "content", "domain")
        field: String,
        /// The rejected raw input
        value: String,
        /// The violated rule
        reason: String,
    },

    /// Domain or record vanished between check and use
    #[error("{kind} '{name}' not found")]
    NotFound {
        /// Entity kind ("domain", "record")
        kind: String,
        /// Name or id of the missing entity
        name: String,
    },

    /// Waiting for the per-domain lock exceeded the configured bound
    ///
    /// Should not surface under correct per-domain serialization; treat as a bug.
    #[error("Timed out after {waited_ms}ms waiting for the lock on zone '{zone}'")]
    Concurrency {
        /// The contended zone
        zone: String,
        /// How long the caller waited
        waited_ms: u64,
    },

    /// Temp-file write, flush or rename failure
    ///
    /// The previously committed zone file remains in place and valid.
    #[error("Failed to {operation} '{path}': {reason}")]
    Io {
        /// The failed step (e.g. "write temporary file", "rename")
        operation: String,
        /// Path involved in the failure
        path: String,
        /// Underlying OS error
        reason: String,
    },

    /// The daemon could not be told about a committed change
    ///
    /// Never fatal: the zone file is already committed.
    #[error("Nameserver daemon did not reload{}: {reason}", zone_suffix(.zone.as_deref()))]
    DaemonUnavailable {
        /// Zone whose reload was requested, `None` for a full reload/reconfig
        zone: Option<String>,
        /// Why the reload is considered failed (exit status, timeout, spawn error)
        reason: String,
    },

    /// The external CRUD layer failed
    #[error("Data source operation failed: {0}")]
    DataSource(String),
}

fn zone_suffix(zone: Option<&str>) -> String {
    zone.map(|z| format!(" zone '{z}'")).unwrap_or_default()
}

impl ZoneError {
    /// Shorthand for a validation failure.
    pub fn validation(
        field: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::Validation {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Shorthand for a missing entity.
    pub fn not_found(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self::NotFound {
            kind: kind.into(),
            name: name.into(),
        }
    }

    /// Shorthand for an I/O failure on `path`.
    pub fn io(
        operation: impl Into<String>,
        path: impl AsRef<std::path::Path>,
        err: &std::io::Error,
    ) -> Self {
        Self::Io {
            operation: operation.into(),
            path: path.as_ref().display().to_string(),
            reason: err.to_string(),
        }
    }

    /// Returns true if this error is transient and the operation may be retried.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::NotFound { .. }
            | Self::Concurrency { .. }
            | Self::Io { .. }
            | Self::DaemonUnavailable { .. }
            | Self::DataSource(_) => true,
            Self::Validation { .. } => false,
        }
    }

    /// Returns true when the zone data was committed despite this error.
    ///
    /// Only a failed reload leaves committed data behind; every other variant
    /// means the zone file on disk is unchanged.
    #[must_use]
    pub fn data_saved(&self) -> bool {
        matches!(self, Self::DaemonUnavailable { .. })
    }

    /// Returns a stable reason code for status reporting and metrics labels.
    #[must_use]
    pub fn status_reason(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "ValidationFailed",
            Self::NotFound { .. } => "NotFound",
            Self::Concurrency { .. } => "LockTimeout",
            Self::Io { .. } => "CommitFailed",
            Self::DaemonUnavailable { .. } => "DaemonUnavailable",
            Self::DataSource(_) => "DataSourceFailed",
        }
    }

    /// Returns the operator-facing message for this error.
    ///
    /// Validation and not-found errors are shown verbatim. Commit failures are
    /// reduced to a generic "not saved" message (details go to the log), and
    /// daemon failures state explicitly that the data was saved.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation { .. } | Self::NotFound { .. } => self.to_string(),
            Self::Concurrency { .. } | Self::Io { .. } | Self::DataSource(_) => {
                "Save failed, zone unchanged. Your data was not saved.".to_string()
            }
            Self::DaemonUnavailable { .. } => {
                "Your data was saved, but the nameserver was not reloaded. \
                 Secondaries may serve stale data until the next reload."
                    .to_string()
            }
        }
    }
}

// Conversion from anyhow::Error for errors raised by the external data layer
impl From<anyhow::Error> for ZoneError {
    fn from(err: anyhow::Error) -> Self {
        Self::DataSource(format!("{err:#}"))
    }
}

#[cfg(test)]
#[path = "errors_tests.rs"]
mod errors_tests;
