// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! # zonekeeper - Zone synthesis and NSD synchronization
//!
//! zonekeeper turns the domains and records held by an administration data
//! layer into RFC 1035 zone files, commits them atomically, keeps the NSD zone
//! list in step and asks the daemon to reload.
//!
//! ## Overview
//!
//! Every mutation runs the same chain: validate, persist, bump the serial,
//! render, commit, reload. The first five steps are all-or-nothing for the zone
//! file; the reload is best effort and reported separately, so a caller can tell
//! "save failed, zone unchanged" apart from "saved, but the nameserver was not
//! reloaded".
//!
//! ## Modules
//!
//! - [`validation`] - Record name and content validation with canonicalization
//! - [`zonefile`] - Deterministic zone file rendering
//! - [`serial`] - SOA serial policies and RFC 1982 comparison
//! - [`store`] - Atomic zone file commits, per-domain locks, NSD zone list
//! - [`daemon`] - `nsd-control` bridge
//! - [`source`] - Data source contract and the YAML-backed in-memory source
//! - [`engine`] - The mutation chain and synchronization state
//! - [`metrics`] - Prometheus metrics
//!
//! ## Example
//!
//! ```rust
//! use zonekeeper::model::{Domain, Record, RecordType};
//! use zonekeeper::zonefile;
//!
//! let domain = Domain::new(1, "example.test");
//! let records = vec![Record {
//!     id: 1,
//!     domain_id: 1,
//!     record_type: RecordType::A,
//!     name: "www".to_string(),
//!     content: "203.0.113.6".to_string(),
//!     priority: 0,
//!     ttl: None,
//! }];
//!
//! let text = zonefile::render(&domain, &records);
//! assert!(text.contains("www 3600 IN A 203.0.113.6"));
//! ```

pub mod config;
pub mod constants;
pub mod daemon;
pub mod engine;
pub mod errors;
pub mod metrics;
pub mod model;
pub mod serial;
pub mod source;
pub mod store;
pub mod validation;
pub mod zonefile;
