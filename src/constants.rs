// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Global constants for zonekeeper.
//!
//! This module contains all numeric and string constants used throughout the codebase.
//! Constants are organized by category for easy maintenance.

// ============================================================================
// DNS Protocol Limits
// ============================================================================

/// Maximum length of a single DNS label (RFC 1035 §2.3.4)
pub const MAX_LABEL_LENGTH: usize = 63;

/// Maximum length of a domain name in presentation form, without the trailing dot
pub const MAX_DOMAIN_NAME_LENGTH: usize = 253;

/// Maximum length of one character-string inside TXT RDATA
pub const TXT_CHUNK_MAX_BYTES: usize = 255;

/// Maximum accepted TXT payload (unescaped bytes) before chunking
pub const MAX_TXT_LENGTH: usize = 4096;

/// Name used for the zone apex in zone files and record names
pub const APEX_NAME: &str = "@";

/// Wildcard label, only valid as the leftmost label
pub const WILDCARD_LABEL: &str = "*";

// ============================================================================
// Zone Defaults
// ============================================================================

/// Default zone TTL when no domain-level value is configured (1 hour)
pub const DEFAULT_ZONE_TTL_SECS: u32 = 3600;

/// Default SOA refresh interval (2 hours)
pub const DEFAULT_SOA_REFRESH_SECS: u32 = 7200;

/// Default SOA retry interval (1 hour)
pub const DEFAULT_SOA_RETRY_SECS: u32 = 3600;

/// Default SOA expire time (14 days)
pub const DEFAULT_SOA_EXPIRE_SECS: u32 = 1_209_600;

/// Default SOA minimum / negative-caching TTL (1 hour)
pub const DEFAULT_SOA_MINIMUM_SECS: u32 = 3600;

/// Serial assigned to a freshly created domain
pub const INITIAL_SERIAL: u32 = 1;

/// Mailbox prefix used when a domain is created without an SOA email
pub const DEFAULT_SOA_MAILBOX_PREFIX: &str = "admin";

/// Name server prefix used when no name servers are configured
pub const DEFAULT_NAME_SERVER_PREFIX: &str = "ns1";

// ============================================================================
// Zone Store
// ============================================================================

/// File suffix for rendered zone files
pub const ZONE_FILE_SUFFIX: &str = ".zone";

/// Prefix for temporary files created next to the final zone file
pub const TEMP_FILE_PREFIX: &str = ".zonekeeper-";

/// Permissions applied to committed files so the daemon can read them
pub const ZONE_FILE_MODE: u32 = 0o644;

/// Default directory for zone files
pub const DEFAULT_ZONE_DIR: &str = "./zones";

/// Default NSD include file listing the managed zones
pub const DEFAULT_ZONES_CONF: &str = "./zones.conf";

/// Default upper bound for waiting on a per-domain lock (30 seconds)
pub const DEFAULT_LOCK_TIMEOUT_SECS: u64 = 30;

/// Header written at the top of the managed zone-list include file
pub const ZONES_CONF_HEADER: &str = "# Managed by zonekeeper. Manual edits will be overwritten.";

// ============================================================================
// Daemon Control
// ============================================================================

/// Default NSD control utility
pub const DEFAULT_CONTROL_COMMAND: &str = "nsd-control";

/// Default bound for a reload/status invocation (10 seconds)
pub const DEFAULT_RELOAD_TIMEOUT_SECS: u64 = 10;

/// Maximum number of zones regenerated concurrently by a full sync
pub const MAX_CONCURRENT_SYNCS: usize = 8;

// ============================================================================
// Configuration
// ============================================================================

/// Default configuration file path
pub const DEFAULT_CONFIG_PATH: &str = "zonekeeper.yaml";

/// Tracing target for the audit trail of engine mutations
pub const AUDIT_TARGET: &str = "zonekeeper::audit";
