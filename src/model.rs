// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Domain and record types consumed by the engine.
//!
//! These types mirror the relational rows owned by the CRUD layer. The engine never
//! treats them as authoritative for anything but rendering: the zone file is always
//! derived from a [`Domain`] plus its [`Record`] set.
//!
//! # Example
//!
//! ```rust
//! use zonekeeper::model::{Domain, RecordType};
//!
//! let domain = Domain::new(1, "example.test");
//! assert_eq!(domain.serial, 1);
//! assert_eq!(domain.soa.refresh, 7200);
//! assert!(RecordType::Mx.has_priority());
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::constants::{
    DEFAULT_SOA_EXPIRE_SECS, DEFAULT_SOA_MINIMUM_SECS, DEFAULT_SOA_REFRESH_SECS,
    DEFAULT_SOA_RETRY_SECS, DEFAULT_ZONE_TTL_SECS, INITIAL_SERIAL,
};
use crate::errors::ZoneError;

/// Supported resource record types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RecordType {
    /// Start of authority; its content is the administrator mailbox
    Soa,
    /// Name server delegation
    Ns,
    /// IPv4 address
    A,
    /// IPv6 address
    Aaaa,
    /// Canonical name alias
    Cname,
    /// Mail exchanger
    Mx,
    /// Free text
    Txt,
    /// Reverse pointer
    Ptr,
    /// Service locator
    Srv,
}

impl RecordType {
    /// All supported types in their canonical zone-file ordering.
    pub const ALL: [RecordType; 9] = [
        RecordType::Soa,
        RecordType::Ns,
        RecordType::A,
        RecordType::Aaaa,
        RecordType::Cname,
        RecordType::Mx,
        RecordType::Txt,
        RecordType::Srv,
        RecordType::Ptr,
    ];

    /// Presentation mnemonic as written in zone files.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Soa => "SOA",
            Self::Ns => "NS",
            Self::A => "A",
            Self::Aaaa => "AAAA",
            Self::Cname => "CNAME",
            Self::Mx => "MX",
            Self::Txt => "TXT",
            Self::Ptr => "PTR",
            Self::Srv => "SRV",
        }
    }

    /// Whether the `priority` column is meaningful (MX-class types).
    #[must_use]
    pub fn has_priority(self) -> bool {
        matches!(self, Self::Mx | Self::Srv)
    }

    /// Whether the content is a host name that must be rendered absolute.
    #[must_use]
    pub fn has_hostname_content(self) -> bool {
        matches!(self, Self::Ns | Self::Cname | Self::Mx | Self::Ptr)
    }

    /// Position in the rendered zone: SOA, then NS, then everything else.
    #[must_use]
    pub fn render_rank(self) -> usize {
        Self::ALL.iter().position(|t| *t == self).unwrap_or(Self::ALL.len())
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordType {
    type Err = ZoneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == upper)
            .ok_or_else(|| {
                ZoneError::validation(
                    "type",
                    s,
                    "unsupported record type (expected one of SOA, NS, A, AAAA, CNAME, MX, TXT, SRV, PTR)",
                )
            })
    }
}

/// SOA timer values of a domain, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SoaTimers {
    /// How often secondaries poll for a new serial
    pub refresh: u32,
    /// Retry interval after a failed refresh
    pub retry: u32,
    /// When secondaries stop answering without a successful refresh
    pub expire: u32,
    /// Negative-caching TTL
    pub minimum: u32,
}

impl Default for SoaTimers {
    fn default() -> Self {
        Self {
            refresh: DEFAULT_SOA_REFRESH_SECS,
            retry: DEFAULT_SOA_RETRY_SECS,
            expire: DEFAULT_SOA_EXPIRE_SECS,
            minimum: DEFAULT_SOA_MINIMUM_SECS,
        }
    }
}

/// An authoritative zone as stored by the CRUD layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Domain {
    /// Row id
    pub id: i64,
    /// Lower-cased zone name without trailing dot
    pub name: String,
    /// Current zone serial
    pub serial: u32,
    /// Zone `$TTL`, also the TTL of records without their own
    #[serde(default = "default_ttl")]
    pub default_ttl: u32,
    /// SOA timers
    #[serde(default)]
    pub soa: SoaTimers,
    /// Administrator mailbox in domain form (`hostmaster.example.com.`)
    #[serde(default)]
    pub soa_email: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

fn default_ttl() -> u32 {
    DEFAULT_ZONE_TTL_SECS
}

impl Domain {
    /// Create a domain with default timers and the initial serial.
    #[must_use]
    pub fn new(id: i64, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            serial: INITIAL_SERIAL,
            default_ttl: DEFAULT_ZONE_TTL_SECS,
            soa: SoaTimers::default(),
            soa_email: String::new(),
            created_at: Utc::now(),
        }
    }

    /// Absolute form of the zone name (`example.com.`).
    #[must_use]
    pub fn fqdn(&self) -> String {
        format!("{}.", self.name)
    }
}

/// A resource record row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Row id
    pub id: i64,
    /// Owning domain
    pub domain_id: i64,
    /// Record type
    #[serde(rename = "type")]
    pub record_type: RecordType,
    /// `@` or a name relative to the apex, never with a trailing dot
    pub name: String,
    /// Canonical type-dependent payload
    pub content: String,
    /// Preference for MX-class types, 0 otherwise
    #[serde(default)]
    pub priority: u16,
    /// Record TTL; `None` inherits the domain default
    #[serde(default)]
    pub ttl: Option<u32>,
}

impl Record {
    /// TTL used when rendering, falling back to the domain default.
    #[must_use]
    pub fn effective_ttl(&self, domain: &Domain) -> u32 {
        match self.ttl {
            Some(ttl) if ttl > 0 => ttl,
            _ => domain.default_ttl,
        }
    }
}

/// Caller-supplied values for creating or replacing a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordInput {
    /// Record type
    #[serde(rename = "type")]
    pub record_type: RecordType,
    /// Raw record name
    pub name: String,
    /// Raw record content
    pub content: String,
    /// Preference (MX/SRV)
    #[serde(default)]
    pub priority: u16,
    /// Optional TTL
    #[serde(default)]
    pub ttl: Option<u32>,
}

impl RecordInput {
    /// Convenience constructor for types without a priority.
    #[must_use]
    pub fn new(record_type: RecordType, name: &str, content: &str) -> Self {
        Self {
            record_type,
            name: name.to_string(),
            content: content.to_string(),
            priority: 0,
            ttl: None,
        }
    }

    /// Set the priority.
    #[must_use]
    pub fn with_priority(mut self, priority: u16) -> Self {
        self.priority = priority;
        self
    }

    /// Set the TTL.
    #[must_use]
    pub fn with_ttl(mut self, ttl: u32) -> Self {
        self.ttl = Some(ttl);
        self
    }
}

/// Options for provisioning a new domain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDomain {
    /// Zone name
    pub name: String,
    /// Administrator email; defaults to `admin.<domain>`
    #[serde(default)]
    pub soa_email: Option<String>,
    /// Optional IPv4 address for an apex A record
    #[serde(default)]
    pub apex_ipv4: Option<String>,
}

#[cfg(test)]
#[path = "model_tests.rs"]
mod model_tests;
