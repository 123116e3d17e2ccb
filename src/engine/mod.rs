// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Zone synthesis and daemon synchronization.
//!
//! [`ZoneEngine`] runs the mutation chain for every change:
//!
//! 1. **Validate** the input (pure, no lock)
//! 2. **Lock** the domain
//! 3. **Persist** the canonical values through the data source
//! 4. **Bump** the serial and persist it
//! 5. **Render** the complete record set
//! 6. **Commit** the zone file atomically
//! 7. **Unlock**
//! 8. **Reload** the daemon, best effort
//!
//! Any failure up to step 6 aborts the chain and leaves the previous zone file in
//! place. A failed reload is returned inside the [`SyncReport`] as
//! [`ZoneError::DaemonUnavailable`], never as an error of the operation.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use zonekeeper::config::EngineConfig;
//! use zonekeeper::daemon::NsdControl;
//! use zonekeeper::engine::ZoneEngine;
//! use zonekeeper::model::{RecordInput, RecordType};
//! use zonekeeper::source::MemoryZoneSource;
//!
//! # async fn example() -> Result<(), zonekeeper::errors::ZoneError> {
//! let config = EngineConfig::default();
//! let daemon = Arc::new(NsdControl::new(&config));
//! let engine = ZoneEngine::new(config, Arc::new(MemoryZoneSource::new()), daemon);
//!
//! let change = engine
//!     .create_record("example.test", RecordInput::new(RecordType::A, "www", "203.0.113.6"))
//!     .await?;
//! println!("{}", change.sync.message());
//! # Ok(())
//! # }
//! ```

mod operations;
pub mod types;

pub use types::{DeleteReport, RecordChange, SyncReport, SyncState};

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::constants::{AUDIT_TARGET, MAX_CONCURRENT_SYNCS};
use crate::daemon::{DaemonControl, DaemonStatus};
use crate::errors::ZoneError;
use crate::metrics;
use crate::model::Domain;
use crate::source::ZoneDataSource;
use crate::store::{CommitReceipt, ZoneLease, ZoneStore};
use crate::validation::validate_domain_name;
use crate::zonefile;

/// The zone synthesis engine.
pub struct ZoneEngine<S: ZoneDataSource> {
    config: EngineConfig,
    source: Arc<S>,
    store: ZoneStore,
    daemon: Arc<dyn DaemonControl>,
    states: Mutex<HashMap<String, SyncState>>,
}

impl<S: ZoneDataSource> ZoneEngine<S> {
    /// Create an engine writing to the paths in `config`.
    pub fn new(config: EngineConfig, source: Arc<S>, daemon: Arc<dyn DaemonControl>) -> Self {
        let store = ZoneStore::new(&config);
        Self {
            config,
            source,
            store,
            daemon,
            states: Mutex::new(HashMap::new()),
        }
    }

    /// Engine configuration.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The data source.
    #[must_use]
    pub fn source(&self) -> &Arc<S> {
        &self.source
    }

    /// The zone store.
    #[must_use]
    pub fn store(&self) -> &ZoneStore {
        &self.store
    }

    /// Last observed synchronization state of `zone`.
    #[must_use]
    pub fn zone_state(&self, zone: &str) -> SyncState {
        self.states
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(zone)
            .copied()
            .unwrap_or_default()
    }

    /// Render the current state of `zone` without bumping or writing.
    ///
    /// # Errors
    ///
    /// Returns [`ZoneError::NotFound`] for unknown domains and
    /// [`ZoneError::DataSource`] if the data layer fails.
    pub async fn preview(&self, zone: &str) -> Result<String, ZoneError> {
        let name = validate_domain_name(zone).into_result("domain")?;
        let domain = self.require_domain(&name).await?;
        let records = self.source.records(domain.id).await?;
        Ok(zonefile::render(&domain, &records))
    }

    /// Bump, render, commit and reload one zone.
    ///
    /// # Errors
    ///
    /// Returns the first failure of the chain; the previous zone file stays in
    /// place.
    pub async fn synchronize(&self, zone: &str) -> Result<SyncReport, ZoneError> {
        let started = Instant::now();
        let result = self.synchronize_inner(zone).await;
        observe("synchronize", started, &result);
        result
    }

    async fn synchronize_inner(&self, zone: &str) -> Result<SyncReport, ZoneError> {
        let name = validate_domain_name(zone).into_result("domain")?;
        let (report, newly_registered) = {
            let lease = self.store.lock(&name).await?;
            let domain = self.require_domain(&name).await?;
            self.commit_zone(&lease, domain, true).await?
        };
        audit("synchronize", &name, &format!("serial {}", report.serial));
        Ok(self.notify_daemon(report, newly_registered).await)
    }

    /// Synchronize every domain; different domains run concurrently.
    ///
    /// Results are sorted by zone name. One failing zone does not stop the others.
    ///
    /// # Errors
    ///
    /// Returns [`ZoneError::DataSource`] if the domain list cannot be read.
    pub async fn synchronize_all(
        &self,
    ) -> Result<Vec<(String, Result<SyncReport, ZoneError>)>, ZoneError> {
        let names = self.source.domain_names().await?;
        info!(zones = names.len(), "Synchronizing all zones");

        let mut results: Vec<(String, Result<SyncReport, ZoneError>)> = stream::iter(names)
            .map(|name| async move {
                let result = self.synchronize(&name).await;
                (name, result)
            })
            .buffer_unordered(MAX_CONCURRENT_SYNCS)
            .collect()
            .await;
        results.sort_by(|a, b| a.0.cmp(&b.0));

        let failed = results.iter().filter(|(_, r)| r.is_err()).count();
        if failed > 0 {
            warn!(failed, total = results.len(), "Some zones failed to synchronize");
        }
        Ok(results)
    }

    /// Daemon liveness and permission probe.
    pub async fn daemon_status(&self) -> DaemonStatus {
        self.daemon.report().await
    }

    // ------------------------------------------------------------------------
    // Chain steps
    // ------------------------------------------------------------------------

    async fn require_domain(&self, name: &str) -> Result<Domain, ZoneError> {
        self.source
            .domain(name)
            .await?
            .ok_or_else(|| ZoneError::not_found("domain", name))
    }

    /// Bump (optionally), render and commit under `lease`.
    ///
    /// Returns the report and whether the zone was newly added to the zone list.
    async fn commit_zone(
        &self,
        lease: &ZoneLease,
        mut domain: Domain,
        bump: bool,
    ) -> Result<(SyncReport, bool), ZoneError> {
        let zone = domain.name.clone();
        let result: Result<CommitReceipt, ZoneError> = async {
            if bump {
                let next = self.config.serial_scheme.next_serial(domain.serial);
                // Persisted before the commit: a failed write skips a serial, never repeats one
                self.source.set_serial(domain.id, next).await?;
                debug!(zone = %zone, from = domain.serial, to = next, "Bumped serial");
                domain.serial = next;
            }

            self.set_state(&zone, SyncState::Rendering);
            let records = self.source.records(domain.id).await?;
            let render_started = Instant::now();
            let text = zonefile::render(&domain, &records);
            metrics::record_render(render_started.elapsed());

            self.store.commit_locked(lease, &text).await.inspect_err(|_| {
                metrics::record_commit_error();
            })
        }
        .await;

        match result {
            Ok(receipt) => {
                metrics::record_commit_success(&zone, domain.serial);
                self.set_state(&zone, SyncState::Committed);
                info!(zone = %zone, serial = domain.serial, "Zone committed");
                Ok((
                    SyncReport {
                        zone,
                        serial: domain.serial,
                        path: receipt.path,
                        digest: receipt.digest,
                        state: SyncState::Committed,
                        reload_warning: None,
                    },
                    receipt.newly_registered,
                ))
            }
            Err(e) => {
                self.set_state(&zone, SyncState::Failed);
                Err(e)
            }
        }
    }

    /// Ask the daemon to pick up a committed zone. Never fails.
    async fn notify_daemon(&self, mut report: SyncReport, newly_registered: bool) -> SyncReport {
        if !self.config.daemon.enabled {
            debug!(zone = %report.zone, "Daemon control disabled, skipping reload");
            return report;
        }

        self.set_state(&report.zone, SyncState::ReloadRequested);
        let mut result = Ok(());
        if newly_registered {
            result = self.daemon.reconfigure().await;
            metrics::record_daemon_request("reconfig", result.is_ok());
        }
        if result.is_ok() {
            result = self.daemon.reload(Some(&report.zone)).await;
            metrics::record_daemon_request("reload", result.is_ok());
        }

        match result {
            Ok(()) => {
                report.state = SyncState::Synced;
                self.set_state(&report.zone, SyncState::Synced);
            }
            Err(e) => {
                warn!(zone = %report.zone, error = %e, "Zone saved but the daemon was not reloaded");
                report.state = SyncState::Committed;
                report.reload_warning = Some(e);
                self.set_state(&report.zone, SyncState::Committed);
            }
        }
        report
    }

    fn set_state(&self, zone: &str, state: SyncState) {
        debug!(zone = %zone, %state, "Zone state");
        self.states
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(zone.to_string(), state);
    }

    fn forget_state(&self, zone: &str) {
        self.states
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(zone);
    }
}

/// Emit an audit event for a committed change.
fn audit(action: &str, zone: &str, detail: &str) {
    info!(target: AUDIT_TARGET, action, zone, detail, "Zone change");
}

/// Record operation metrics.
fn observe<T>(operation: &str, started: Instant, result: &Result<T, ZoneError>) {
    match result {
        Ok(_) => metrics::record_operation_success(operation, started.elapsed()),
        Err(e) => {
            metrics::record_operation_error(operation, e.status_reason(), started.elapsed());
        }
    }
}
