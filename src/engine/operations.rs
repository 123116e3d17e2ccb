// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Domain and record mutations.
//!
//! Each mutation validates its input before taking the domain lock, so invalid
//! requests never touch the data source or the zone directory. Policy rules that
//! depend on the current record set (last NS record, CNAME exclusivity, single
//! SOA) are checked under the lock, right before persisting. When the zone
//! commit fails, the data-source change is undone so the request can be retried.

use std::time::Instant;

use tracing::{debug, error, warn};

use super::{audit, observe, DeleteReport, RecordChange, SyncReport, ZoneEngine};
use crate::constants::{APEX_NAME, DEFAULT_NAME_SERVER_PREFIX, DEFAULT_SOA_MAILBOX_PREFIX};
use crate::errors::ZoneError;
use crate::metrics;
use crate::model::{Domain, NewDomain, Record, RecordInput, RecordType};
use crate::source::ZoneDataSource;
use crate::validation::{
    validate_content, validate_domain_name, validate_ip, validate_name, ValidationResult,
};

/// Largest TTL allowed by RFC 2181
const MAX_TTL_SECS: u32 = 2_147_483_647;

impl<S: ZoneDataSource> ZoneEngine<S> {
    // ------------------------------------------------------------------------
    // Domains
    // ------------------------------------------------------------------------

    /// Provision a new domain with SOA, NS and optional apex address records.
    ///
    /// The zone is written with the initial serial, added to the daemon zone list
    /// and the daemon is asked to re-read its configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ZoneError::Validation`] for invalid input or an existing domain,
    /// and the usual chain errors otherwise.
    pub async fn create_domain(&self, request: NewDomain) -> Result<SyncReport, ZoneError> {
        let started = Instant::now();
        let result = self.create_domain_inner(request).await;
        observe("create_domain", started, &result);
        result
    }

    async fn create_domain_inner(&self, request: NewDomain) -> Result<SyncReport, ZoneError> {
        let name = checked(validate_domain_name(&request.name), "domain", "domain")?;

        let soa_email = match non_empty(request.soa_email.as_deref()) {
            Some(email) => checked(
                validate_content(RecordType::Soa, email, &name),
                RecordType::Soa.as_str(),
                "soa_email",
            )?,
            None => format!("{DEFAULT_SOA_MAILBOX_PREFIX}.{name}."),
        };
        let name_servers = self.name_servers_for(&name)?;
        let apex_address = match non_empty(request.apex_ipv4.as_deref()) {
            Some(raw) => {
                let ip = checked(validate_ip(raw), RecordType::A.as_str(), "apex_ipv4")?;
                let record_type = if ip.contains(':') {
                    RecordType::Aaaa
                } else {
                    RecordType::A
                };
                Some((record_type, ip))
            }
            None => None,
        };

        let (report, newly_registered) = {
            let lease = self.store.lock(&name).await?;
            if self.source.domain(&name).await?.is_some() {
                metrics::record_validation_failure("domain", "domain");
                return Err(ZoneError::validation("domain", &name, "domain already exists"));
            }

            let mut domain = Domain::new(0, &name);
            domain.default_ttl = self.config.default_ttl;
            domain.soa = self.config.soa;
            domain.soa_email.clone_from(&soa_email);
            let domain = self.source.insert_domain(domain).await?;
            let domain_id = domain.id;

            let mut records = vec![new_record(domain.id, RecordType::Soa, APEX_NAME, &soa_email)];
            records.extend(
                name_servers
                    .iter()
                    .map(|ns| new_record(domain.id, RecordType::Ns, APEX_NAME, ns)),
            );
            if let Some((record_type, ip)) = &apex_address {
                records.push(new_record(domain.id, *record_type, APEX_NAME, ip));
            }
            let committed = async {
                for record in records {
                    self.source.insert_record(record).await?;
                }
                self.commit_zone(&lease, domain, false).await
            }
            .await;
            match committed {
                Ok(done) => done,
                Err(e) => {
                    let undo = self.source.remove_domain(domain_id).await;
                    rolled_back(&name, "create_domain", undo);
                    self.forget_state(&name);
                    return Err(e);
                }
            }
        };

        audit(
            "create_domain",
            &name,
            &format!("name servers {}", name_servers.join(", ")),
        );
        Ok(self.notify_daemon(report, newly_registered).await)
    }

    /// Remove a domain, its zone file and its zone-list entry.
    ///
    /// # Errors
    ///
    /// Returns [`ZoneError::NotFound`] for unknown domains. A failed daemon
    /// reconfiguration is reported in the [`DeleteReport`], not as an error.
    pub async fn delete_domain(&self, zone: &str) -> Result<DeleteReport, ZoneError> {
        let started = Instant::now();
        let result = self.delete_domain_inner(zone).await;
        observe("delete_domain", started, &result);
        result
    }

    async fn delete_domain_inner(&self, zone: &str) -> Result<DeleteReport, ZoneError> {
        let name = checked(validate_domain_name(zone), "domain", "domain")?;

        let removed_files = {
            let lease = self.store.lock(&name).await?;
            let domain = self.require_domain(&name).await?;
            let removed = self.store.delete_locked(&lease).await?;
            self.source.remove_domain(domain.id).await?;
            removed
        };
        self.forget_state(&name);
        metrics::record_zone_deleted(&name);
        audit("delete_domain", &name, "zone removed");

        let reconfig_warning = if self.config.daemon.enabled {
            let result = self.daemon.reconfigure().await;
            metrics::record_daemon_request("reconfig", result.is_ok());
            result
                .inspect_err(|e| {
                    warn!(zone = %name, error = %e, "Zone removed but the daemon was not reconfigured");
                })
                .err()
        } else {
            None
        };

        Ok(DeleteReport {
            zone: name,
            removed_files,
            reconfig_warning,
        })
    }

    // ------------------------------------------------------------------------
    // Records
    // ------------------------------------------------------------------------

    /// Add a record to `zone` and regenerate it.
    ///
    /// # Errors
    ///
    /// Returns [`ZoneError::Validation`] for invalid input or conflicts with
    /// existing records, [`ZoneError::NotFound`] for unknown domains, and the
    /// usual chain errors otherwise.
    pub async fn create_record(
        &self,
        zone: &str,
        input: RecordInput,
    ) -> Result<RecordChange, ZoneError> {
        let started = Instant::now();
        let result = self.create_record_inner(zone, input).await;
        observe("create_record", started, &result);
        result
    }

    async fn create_record_inner(
        &self,
        zone: &str,
        input: RecordInput,
    ) -> Result<RecordChange, ZoneError> {
        let name = checked(validate_domain_name(zone), "domain", "domain")?;
        let input = canonical_input(&input, &name)?;

        let (record, report, newly_registered) = {
            let lease = self.store.lock(&name).await?;
            let domain = self.require_domain(&name).await?;
            let existing = self.source.records(domain.id).await?;
            check_conflicts(&existing, &input, None)?;

            let record = self
                .source
                .insert_record(record_from_input(domain.id, 0, &input))
                .await?;
            let (report, newly_registered) = match self.commit_zone(&lease, domain, true).await {
                Ok(done) => done,
                Err(e) => {
                    let undo = self.source.remove_record(record.id).await;
                    rolled_back(&name, "create_record", undo);
                    return Err(e);
                }
            };
            (record, report, newly_registered)
        };

        audit("create_record", &name, &describe(&record));
        let sync = self.notify_daemon(report, newly_registered).await;
        Ok(RecordChange { record, sync })
    }

    /// Replace record `record_id` and regenerate its zone.
    ///
    /// Changing the type of the last NS record is rejected.
    ///
    /// # Errors
    ///
    /// Same as [`ZoneEngine::create_record`].
    pub async fn update_record(
        &self,
        record_id: i64,
        input: RecordInput,
    ) -> Result<RecordChange, ZoneError> {
        let started = Instant::now();
        let result = self.update_record_inner(record_id, input).await;
        observe("update_record", started, &result);
        result
    }

    async fn update_record_inner(
        &self,
        record_id: i64,
        input: RecordInput,
    ) -> Result<RecordChange, ZoneError> {
        let domain = self.domain_of_record(record_id).await?;
        let input = canonical_input(&input, &domain.name)?;

        let (record, report, newly_registered) = {
            let lease = self.store.lock(&domain.name).await?;
            let domain = self.require_domain(&domain.name).await?;
            let current = self.require_record(record_id).await?;
            let existing = self.source.records(domain.id).await?;

            if current.record_type == RecordType::Ns
                && input.record_type != RecordType::Ns
                && count_ns(&existing) <= 1
            {
                return Err(rejected(
                    "type",
                    input.record_type.as_str(),
                    "a domain must keep at least one NS record",
                ));
            }
            if current.record_type == RecordType::Soa && input.record_type != RecordType::Soa {
                return Err(rejected(
                    "type",
                    input.record_type.as_str(),
                    "the SOA record cannot change type",
                ));
            }
            check_conflicts(&existing, &input, Some(record_id))?;

            let record = record_from_input(domain.id, record_id, &input);
            self.source.update_record(record.clone()).await?;
            let (report, newly_registered) = match self.commit_zone(&lease, domain, true).await {
                Ok(done) => done,
                Err(e) => {
                    let undo = self.source.update_record(current).await;
                    rolled_back(lease.zone(), "update_record", undo);
                    return Err(e);
                }
            };
            (record, report, newly_registered)
        };

        audit("update_record", &domain.name, &describe(&record));
        let sync = self.notify_daemon(report, newly_registered).await;
        Ok(RecordChange { record, sync })
    }

    /// Remove record `record_id` and regenerate its zone.
    ///
    /// Deleting the SOA record or the last NS record is rejected.
    ///
    /// # Errors
    ///
    /// Returns [`ZoneError::Validation`] for rejected deletions,
    /// [`ZoneError::NotFound`] for unknown records, and the usual chain errors
    /// otherwise.
    pub async fn delete_record(&self, record_id: i64) -> Result<RecordChange, ZoneError> {
        let started = Instant::now();
        let result = self.delete_record_inner(record_id).await;
        observe("delete_record", started, &result);
        result
    }

    async fn delete_record_inner(&self, record_id: i64) -> Result<RecordChange, ZoneError> {
        let domain = self.domain_of_record(record_id).await?;

        let (record, report, newly_registered) = {
            let lease = self.store.lock(&domain.name).await?;
            let domain = self.require_domain(&domain.name).await?;
            let record = self.require_record(record_id).await?;
            let existing = self.source.records(domain.id).await?;

            match record.record_type {
                RecordType::Ns if count_ns(&existing) <= 1 => {
                    return Err(rejected(
                        "record",
                        &describe(&record),
                        "cannot delete the last NS record of a domain",
                    ));
                }
                RecordType::Soa => {
                    return Err(rejected(
                        "record",
                        &describe(&record),
                        "the SOA record cannot be deleted",
                    ));
                }
                _ => {}
            }

            self.source.remove_record(record_id).await?;
            let (report, newly_registered) = match self.commit_zone(&lease, domain, true).await {
                Ok(done) => done,
                Err(e) => {
                    let undo = self.source.restore_record(record.clone()).await;
                    rolled_back(lease.zone(), "delete_record", undo);
                    return Err(e);
                }
            };
            (record, report, newly_registered)
        };

        audit("delete_record", &domain.name, &describe(&record));
        let sync = self.notify_daemon(report, newly_registered).await;
        Ok(RecordChange { record, sync })
    }

    // ------------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------------

    async fn require_record(&self, record_id: i64) -> Result<Record, ZoneError> {
        self.source
            .record(record_id)
            .await?
            .ok_or_else(|| ZoneError::not_found("record", record_id.to_string()))
    }

    async fn domain_of_record(&self, record_id: i64) -> Result<Domain, ZoneError> {
        let record = self.require_record(record_id).await?;
        self.source
            .domain_by_id(record.domain_id)
            .await?
            .ok_or_else(|| ZoneError::not_found("domain", record.domain_id.to_string()))
    }

    /// Absolute NS hosts for a new domain.
    fn name_servers_for(&self, zone: &str) -> Result<Vec<String>, ZoneError> {
        if self.config.name_servers.is_empty() {
            return Ok(vec![format!("{DEFAULT_NAME_SERVER_PREFIX}.{zone}.")]);
        }
        self.config
            .name_servers
            .iter()
            .map(|ns| {
                // Configured hosts are always absolute
                let absolute = if ns.ends_with('.') {
                    ns.clone()
                } else {
                    format!("{ns}.")
                };
                checked(
                    validate_content(RecordType::Ns, &absolute, zone),
                    RecordType::Ns.as_str(),
                    "name_servers",
                )
            })
            .collect()
    }
}

/// Convert a validation result, counting failures.
fn checked(result: ValidationResult, record_type: &str, field: &str) -> Result<String, ZoneError> {
    if !result.valid {
        debug!(record_type, field, reason = %result.message, "Input rejected");
        metrics::record_validation_failure(record_type, field);
    }
    result.into_result(field)
}

/// Log the outcome of undoing a data change whose zone commit failed.
fn rolled_back(zone: &str, action: &str, undo: anyhow::Result<()>) {
    match undo {
        Ok(()) => debug!(zone = %zone, action, "Data change rolled back after failed commit"),
        Err(e) => error!(
            zone = %zone,
            action,
            error = %e,
            "Failed to roll back data change after failed commit"
        ),
    }
}

/// A policy rejection, counted like a validation failure.
fn rejected(field: &str, value: &str, reason: &str) -> ZoneError {
    metrics::record_validation_failure("policy", field);
    ZoneError::validation(field, value, reason)
}

/// Validate every field of a record input and return its canonical form.
fn canonical_input(input: &RecordInput, apex: &str) -> Result<RecordInput, ZoneError> {
    let rtype = input.record_type;
    let name = checked(validate_name(&input.name, apex), rtype.as_str(), "name")?;
    let content = checked(
        validate_content(rtype, &input.content, apex),
        rtype.as_str(),
        "content",
    )?;

    if rtype == RecordType::Soa && name != APEX_NAME {
        return Err(rejected("name", &name, "the SOA record belongs to the zone apex (@)"));
    }
    if rtype == RecordType::Cname && name == APEX_NAME {
        return Err(rejected("name", &name, "a CNAME record cannot be placed at the zone apex"));
    }

    let ttl = match input.ttl {
        Some(0) | None => None,
        Some(ttl) if ttl > MAX_TTL_SECS => {
            return Err(rejected(
                "ttl",
                &ttl.to_string(),
                "TTL must not exceed 2147483647 seconds",
            ));
        }
        Some(ttl) => Some(ttl),
    };

    Ok(RecordInput {
        record_type: rtype,
        name,
        content,
        priority: if rtype.has_priority() { input.priority } else { 0 },
        ttl,
    })
}

/// Checks that depend on the other records of the zone.
fn check_conflicts(
    existing: &[Record],
    candidate: &RecordInput,
    replacing: Option<i64>,
) -> Result<(), ZoneError> {
    let others = || existing.iter().filter(|r| Some(r.id) != replacing);

    if candidate.record_type == RecordType::Soa
        && others().any(|r| r.record_type == RecordType::Soa)
    {
        return Err(rejected("type", "SOA", "the domain already has an SOA record"));
    }
    if candidate.record_type == RecordType::Cname && others().any(|r| r.name == candidate.name) {
        return Err(rejected(
            "name",
            &candidate.name,
            "a CNAME record cannot coexist with other records of the same name",
        ));
    }
    if candidate.record_type != RecordType::Cname
        && others().any(|r| r.record_type == RecordType::Cname && r.name == candidate.name)
    {
        return Err(rejected(
            "name",
            &candidate.name,
            "the name already has a CNAME record",
        ));
    }
    if others().any(|r| {
        r.record_type == candidate.record_type
            && r.name == candidate.name
            && r.content == candidate.content
    }) {
        return Err(rejected(
            "record",
            &candidate.content,
            "an identical record already exists",
        ));
    }
    Ok(())
}

fn count_ns(records: &[Record]) -> usize {
    records
        .iter()
        .filter(|r| r.record_type == RecordType::Ns)
        .count()
}

fn new_record(domain_id: i64, record_type: RecordType, name: &str, content: &str) -> Record {
    Record {
        id: 0,
        domain_id,
        record_type,
        name: name.to_string(),
        content: content.to_string(),
        priority: 0,
        ttl: None,
    }
}

fn record_from_input(domain_id: i64, id: i64, input: &RecordInput) -> Record {
    Record {
        id,
        domain_id,
        record_type: input.record_type,
        name: input.name.clone(),
        content: input.content.clone(),
        priority: input.priority,
        ttl: input.ttl,
    }
}

fn describe(record: &Record) -> String {
    format!(
        "{} {} -> {}",
        record.record_type, record.name, record.content
    )
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
#[path = "operations_tests.rs"]
mod operations_tests;
