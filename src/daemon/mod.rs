// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Nameserver daemon bridge.
//!
//! The engine talks to the daemon only through [`DaemonControl`]. Reloads are
//! best effort: a failure is reported as [`ZoneError::DaemonUnavailable`] after
//! the zone file has already been committed. Status and permission checks are
//! read-only probes used for operator warnings, never to gate writes.
//!
//! [`NsdControl`] drives NSD through `nsd-control`.

pub mod nsd;
pub mod types;

pub use nsd::NsdControl;
pub use types::{ControlError, DaemonStatus, Permissions};

use crate::errors::ZoneError;

/// Operations the engine needs from a nameserver daemon.
#[async_trait::async_trait]
pub trait DaemonControl: Send + Sync {
    /// Ask the daemon to reload one zone, or every zone when `zone` is `None`.
    ///
    /// # Errors
    ///
    /// Returns [`ZoneError::DaemonUnavailable`] if the request failed or timed out.
    async fn reload(&self, zone: Option<&str>) -> Result<(), ZoneError>;

    /// Ask the daemon to re-read its configuration (zone list changes).
    ///
    /// # Errors
    ///
    /// Returns [`ZoneError::DaemonUnavailable`] if the request failed or timed out.
    async fn reconfigure(&self) -> Result<(), ZoneError>;

    /// Whether the daemon answers a status request.
    async fn status(&self) -> bool;

    /// Probe filesystem and process permissions without side effects.
    async fn check_permissions(&self) -> Permissions;

    /// Liveness, version and permissions in one report.
    async fn report(&self) -> DaemonStatus {
        DaemonStatus {
            running: self.status().await,
            version: None,
            permissions: self.check_permissions().await,
        }
    }
}
