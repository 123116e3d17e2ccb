// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! YAML inventory of domains and records.
//!
//! ```yaml
//! domains:
//!   - name: example.test
//!     serial: 4
//!     soa_email: admin.example.test.
//!     records:
//!       - { type: NS, name: "@", content: ns1.example.test. }
//!       - { type: A, name: "@", content: 203.0.113.5 }
//!       - { type: MX, name: "@", content: mail, priority: 10 }
//! ```
//!
//! Hand-edited inventories pass through the same validation as engine
//! mutations before use, so relative or mixed-case input is canonicalized.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_ZONE_TTL_SECS, INITIAL_SERIAL};
use crate::errors::ZoneError;
use crate::model::{RecordInput, RecordType, SoaTimers};
use crate::validation::{validate_content, validate_domain_name, validate_name};

/// Root of an inventory file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Inventory {
    /// Managed domains
    #[serde(default)]
    pub domains: Vec<InventoryDomain>,
}

/// One domain with its records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InventoryDomain {
    /// Zone name
    pub name: String,
    /// Last published serial
    #[serde(default = "initial_serial")]
    pub serial: u32,
    /// Zone `$TTL`
    #[serde(default = "default_ttl")]
    pub default_ttl: u32,
    /// SOA timers
    #[serde(default)]
    pub soa: SoaTimers,
    /// Administrator mailbox
    #[serde(default)]
    pub soa_email: String,
    /// Creation time; set on load when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Resource records
    #[serde(default)]
    pub records: Vec<RecordInput>,
}

fn initial_serial() -> u32 {
    INITIAL_SERIAL
}

fn default_ttl() -> u32 {
    DEFAULT_ZONE_TTL_SECS
}

impl Inventory {
    /// Parse an inventory from YAML text. Empty text is an empty inventory.
    ///
    /// # Errors
    ///
    /// Returns an error for malformed YAML or unknown keys.
    pub fn from_yaml(raw: &str) -> anyhow::Result<Self> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(raw)?)
    }

    /// Serialize to YAML.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_yaml(&self) -> anyhow::Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Validate and canonicalize every domain and record in place.
    ///
    /// # Errors
    ///
    /// Returns the first [`ZoneError::Validation`] found, or a validation error
    /// for duplicate domain names.
    pub fn canonicalize(&mut self) -> Result<(), ZoneError> {
        let mut seen = std::collections::HashSet::new();
        for domain in &mut self.domains {
            domain.name = validate_domain_name(&domain.name).into_result("domain")?;
            if !seen.insert(domain.name.clone()) {
                return Err(ZoneError::validation(
                    "domain",
                    &domain.name,
                    "listed more than once in the inventory",
                ));
            }
            if !domain.soa_email.trim().is_empty() {
                domain.soa_email =
                    validate_content(RecordType::Soa, &domain.soa_email, &domain.name)
                        .into_result("soa_email")?;
            }
            for record in &mut domain.records {
                record.name = validate_name(&record.name, &domain.name).into_result("name")?;
                record.content = validate_content(record.record_type, &record.content, &domain.name)
                    .into_result("content")?;
                if !record.record_type.has_priority() {
                    record.priority = 0;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "inventory_tests.rs"]
mod inventory_tests;
