// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! In-memory data source.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::inventory::{Inventory, InventoryDomain};
use super::ZoneDataSource;
use crate::model::{Domain, Record, RecordInput};
use crate::store::atomic::write_atomic;

#[derive(Debug, Default)]
struct State {
    next_domain_id: i64,
    next_record_id: i64,
    domains: BTreeMap<i64, Domain>,
    records: BTreeMap<i64, Record>,
}

impl State {
    fn allocate_domain_id(&mut self) -> i64 {
        self.next_domain_id += 1;
        self.next_domain_id
    }

    fn allocate_record_id(&mut self) -> i64 {
        self.next_record_id += 1;
        self.next_record_id
    }
}

/// Domains and records held in memory.
#[derive(Debug, Default)]
pub struct MemoryZoneSource {
    state: RwLock<State>,
}

impl MemoryZoneSource {
    /// An empty source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a source from an inventory. Ids are assigned in file order.
    ///
    /// The inventory is used as given; call [`Inventory::canonicalize`] first for
    /// untrusted input.
    #[must_use]
    pub fn from_inventory(inventory: Inventory) -> Self {
        let mut state = State::default();
        for entry in inventory.domains {
            let domain_id = state.allocate_domain_id();
            let domain = Domain {
                id: domain_id,
                name: entry.name,
                serial: entry.serial,
                default_ttl: entry.default_ttl,
                soa: entry.soa,
                soa_email: entry.soa_email,
                created_at: entry.created_at.unwrap_or_else(Utc::now),
            };
            for input in entry.records {
                let id = state.allocate_record_id();
                state.records.insert(
                    id,
                    Record {
                        id,
                        domain_id,
                        record_type: input.record_type,
                        name: input.name,
                        content: input.content,
                        priority: input.priority,
                        ttl: input.ttl,
                    },
                );
            }
            state.domains.insert(domain_id, domain);
        }
        Self {
            state: RwLock::new(state),
        }
    }

    /// Snapshot the current state as an inventory, domains sorted by name.
    pub async fn to_inventory(&self) -> Inventory {
        let state = self.state.read().await;
        let mut domains: Vec<InventoryDomain> = state
            .domains
            .values()
            .map(|domain| InventoryDomain {
                name: domain.name.clone(),
                serial: domain.serial,
                default_ttl: domain.default_ttl,
                soa: domain.soa,
                soa_email: domain.soa_email.clone(),
                created_at: Some(domain.created_at),
                records: state
                    .records
                    .values()
                    .filter(|r| r.domain_id == domain.id)
                    .map(|r| RecordInput {
                        record_type: r.record_type,
                        name: r.name.clone(),
                        content: r.content.clone(),
                        priority: r.priority,
                        ttl: r.ttl,
                    })
                    .collect(),
            })
            .collect();
        domains.sort_by(|a, b| a.name.cmp(&b.name));
        Inventory { domains }
    }

    /// Load and canonicalize an inventory file. A missing file is an empty source.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub async fn load(path: &Path) -> Result<Self> {
        let raw = match tokio::fs::read_to_string(path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("Inventory {} not found, starting empty", path.display());
                String::new()
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read inventory {}", path.display()))
            }
        };
        let mut inventory = Inventory::from_yaml(&raw)
            .with_context(|| format!("Invalid inventory {}", path.display()))?;
        inventory
            .canonicalize()
            .with_context(|| format!("Invalid record in inventory {}", path.display()))?;
        debug!(
            domains = inventory.domains.len(),
            "Loaded inventory {}",
            path.display()
        );
        Ok(Self::from_inventory(inventory))
    }

    /// Atomically write the current state to an inventory file.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub async fn save(&self, path: &Path) -> Result<()> {
        let yaml = self.to_inventory().await.to_yaml()?;
        write_atomic(path.to_path_buf(), yaml.into_bytes())
            .await
            .with_context(|| format!("Failed to save inventory {}", path.display()))?;
        debug!("Saved inventory {}", path.display());
        Ok(())
    }
}

#[async_trait::async_trait]
impl ZoneDataSource for MemoryZoneSource {
    async fn domain(&self, name: &str) -> Result<Option<Domain>> {
        let state = self.state.read().await;
        Ok(state.domains.values().find(|d| d.name == name).cloned())
    }

    async fn domain_by_id(&self, id: i64) -> Result<Option<Domain>> {
        Ok(self.state.read().await.domains.get(&id).cloned())
    }

    async fn domain_names(&self) -> Result<Vec<String>> {
        let state = self.state.read().await;
        let mut names: Vec<String> = state.domains.values().map(|d| d.name.clone()).collect();
        names.sort();
        Ok(names)
    }

    async fn records(&self, domain_id: i64) -> Result<Vec<Record>> {
        let state = self.state.read().await;
        Ok(state
            .records
            .values()
            .filter(|r| r.domain_id == domain_id)
            .cloned()
            .collect())
    }

    async fn record(&self, id: i64) -> Result<Option<Record>> {
        Ok(self.state.read().await.records.get(&id).cloned())
    }

    async fn set_serial(&self, domain_id: i64, serial: u32) -> Result<()> {
        let mut state = self.state.write().await;
        let Some(domain) = state.domains.get_mut(&domain_id) else {
            bail!("domain {domain_id} does not exist");
        };
        domain.serial = serial;
        Ok(())
    }

    async fn insert_domain(&self, mut domain: Domain) -> Result<Domain> {
        let mut state = self.state.write().await;
        if state.domains.values().any(|d| d.name == domain.name) {
            bail!("domain {} already exists", domain.name);
        }
        domain.id = state.allocate_domain_id();
        state.domains.insert(domain.id, domain.clone());
        Ok(domain)
    }

    async fn remove_domain(&self, domain_id: i64) -> Result<()> {
        let mut state = self.state.write().await;
        if state.domains.remove(&domain_id).is_none() {
            bail!("domain {domain_id} does not exist");
        }
        state.records.retain(|_, r| r.domain_id != domain_id);
        Ok(())
    }

    async fn insert_record(&self, mut record: Record) -> Result<Record> {
        let mut state = self.state.write().await;
        if !state.domains.contains_key(&record.domain_id) {
            bail!("domain {} does not exist", record.domain_id);
        }
        record.id = state.allocate_record_id();
        state.records.insert(record.id, record.clone());
        Ok(record)
    }

    async fn update_record(&self, record: Record) -> Result<()> {
        let mut state = self.state.write().await;
        let Some(existing) = state.records.get_mut(&record.id) else {
            bail!("record {} does not exist", record.id);
        };
        *existing = record;
        Ok(())
    }

    async fn remove_record(&self, id: i64) -> Result<()> {
        let mut state = self.state.write().await;
        if state.records.remove(&id).is_none() {
            bail!("record {id} does not exist");
        }
        Ok(())
    }

    async fn restore_record(&self, record: Record) -> Result<()> {
        let mut state = self.state.write().await;
        if !state.domains.contains_key(&record.domain_id) {
            bail!("domain {} does not exist", record.domain_id);
        }
        if state.records.contains_key(&record.id) {
            bail!("record {} already exists", record.id);
        }
        state.next_record_id = state.next_record_id.max(record.id);
        state.records.insert(record.id, record);
        Ok(())
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod memory_tests;
