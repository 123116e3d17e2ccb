// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Domain and record storage consumed by the engine.
//!
//! The engine does not own the relational data; it reads and writes it through
//! [`ZoneDataSource`]. Implementations report failures as `anyhow::Error`, which
//! the engine surfaces as [`crate::errors::ZoneError::DataSource`].
//!
//! [`MemoryZoneSource`] keeps everything in memory and can be loaded from and
//! saved to a YAML inventory file.

pub mod inventory;
pub mod memory;

pub use inventory::{Inventory, InventoryDomain};
pub use memory::MemoryZoneSource;

use anyhow::Result;

use crate::model::{Domain, Record};

/// CRUD operations the engine requires from the data layer.
#[async_trait::async_trait]
pub trait ZoneDataSource: Send + Sync {
    /// Look up a domain by name.
    async fn domain(&self, name: &str) -> Result<Option<Domain>>;

    /// Look up a domain by id.
    async fn domain_by_id(&self, id: i64) -> Result<Option<Domain>>;

    /// Names of all domains, sorted.
    async fn domain_names(&self) -> Result<Vec<String>>;

    /// All records of a domain, in insertion order.
    async fn records(&self, domain_id: i64) -> Result<Vec<Record>>;

    /// Look up a record by id.
    async fn record(&self, id: i64) -> Result<Option<Record>>;

    /// Persist a new serial for a domain.
    async fn set_serial(&self, domain_id: i64, serial: u32) -> Result<()>;

    /// Insert a domain; the returned copy carries the assigned id.
    ///
    /// # Errors
    ///
    /// Fails if a domain with the same name exists.
    async fn insert_domain(&self, domain: Domain) -> Result<Domain>;

    /// Remove a domain and all of its records.
    async fn remove_domain(&self, domain_id: i64) -> Result<()>;

    /// Insert a record; the returned copy carries the assigned id.
    async fn insert_record(&self, record: Record) -> Result<Record>;

    /// Replace a record by id.
    async fn update_record(&self, record: Record) -> Result<()>;

    /// Remove a record by id.
    async fn remove_record(&self, id: i64) -> Result<()>;

    /// Put back a removed record under its original id.
    ///
    /// # Errors
    ///
    /// Fails if the id is taken or the record's domain does not exist.
    async fn restore_record(&self, record: Record) -> Result<()>;
}
