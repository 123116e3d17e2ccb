// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Engine configuration.
//!
//! All paths and policies the engine needs are carried explicitly by
//! [`EngineConfig`]; nothing is read from process-wide state after startup.
//!
//! ```yaml
//! zone_dir: /var/lib/nsd/zones
//! zones_conf: /etc/nsd/zonekeeper.conf
//! default_ttl: 3600
//! soa:
//!   refresh: 7200
//!   retry: 3600
//!   expire: 1209600
//!   minimum: 3600
//! name_servers:
//!   - ns1.example.net
//!   - ns2.example.net
//! serial_scheme: date
//! daemon:
//!   enabled: true
//!   control_command: nsd-control
//!   use_sudo: true
//!   reload_timeout_secs: 10
//! ```

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

use crate::constants::{
    DEFAULT_CONTROL_COMMAND, DEFAULT_LOCK_TIMEOUT_SECS, DEFAULT_RELOAD_TIMEOUT_SECS,
    DEFAULT_ZONES_CONF, DEFAULT_ZONE_DIR, DEFAULT_ZONE_TTL_SECS,
};
use crate::model::SoaTimers;
use crate::serial::SerialScheme;

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Directory holding `<domain>.zone` files
    pub zone_dir: PathBuf,
    /// NSD include file with one `zone:` block per managed domain
    pub zones_conf: PathBuf,
    /// `$TTL` for newly provisioned domains
    pub default_ttl: u32,
    /// SOA timers for newly provisioned domains
    pub soa: SoaTimers,
    /// NS hosts created for new domains (`ns1.<domain>` when empty)
    pub name_servers: Vec<String>,
    /// How serials are bumped
    pub serial_scheme: SerialScheme,
    /// Upper bound for waiting on a per-domain lock
    pub lock_timeout_secs: u64,
    /// Daemon control settings
    pub daemon: DaemonConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            zone_dir: PathBuf::from(DEFAULT_ZONE_DIR),
            zones_conf: PathBuf::from(DEFAULT_ZONES_CONF),
            default_ttl: DEFAULT_ZONE_TTL_SECS,
            soa: SoaTimers::default(),
            name_servers: Vec::new(),
            serial_scheme: SerialScheme::default(),
            lock_timeout_secs: DEFAULT_LOCK_TIMEOUT_SECS,
            daemon: DaemonConfig::default(),
        }
    }
}

/// How the nameserver daemon is driven.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DaemonConfig {
    /// Request a reload after every commit
    pub enabled: bool,
    /// Control utility (`nsd-control`)
    pub control_command: PathBuf,
    /// Prefix control invocations with `sudo -n`
    pub use_sudo: bool,
    /// Bound for a single control invocation
    pub reload_timeout_secs: u64,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            control_command: PathBuf::from(DEFAULT_CONTROL_COMMAND),
            use_sudo: false,
            reload_timeout_secs: DEFAULT_RELOAD_TIMEOUT_SECS,
        }
    }
}

impl DaemonConfig {
    /// Reload timeout as a `Duration`.
    #[must_use]
    pub fn reload_timeout(&self) -> Duration {
        Duration::from_secs(self.reload_timeout_secs)
    }
}

impl EngineConfig {
    /// Load configuration from a YAML file.
    ///
    /// A missing file yields the defaults; a present but malformed file is an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid YAML, contains
    /// unknown keys or fails [`EngineConfig::validate`].
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            warn!(
                "Config file {} not found, using built-in defaults",
                path.display()
            );
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = Self::from_yaml(&raw)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Parse and validate configuration from YAML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is malformed or the values are invalid.
    pub fn from_yaml(raw: &str) -> Result<Self> {
        // An empty document deserializes to `null`, which means "all defaults".
        let config: Self = if raw.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str(raw).context("Failed to parse YAML")?
        };
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first offending key.
    pub fn validate(&self) -> Result<()> {
        if self.default_ttl == 0 {
            bail!("default_ttl must be a positive number of seconds");
        }
        for (key, value) in [
            ("soa.refresh", self.soa.refresh),
            ("soa.retry", self.soa.retry),
            ("soa.expire", self.soa.expire),
            ("soa.minimum", self.soa.minimum),
        ] {
            if value == 0 {
                bail!("{key} must be a positive number of seconds");
            }
        }
        if self.lock_timeout_secs == 0 {
            bail!("lock_timeout_secs must be positive");
        }
        if self.daemon.reload_timeout_secs == 0 {
            bail!("daemon.reload_timeout_secs must be positive");
        }
        if self.zone_dir.as_os_str().is_empty() {
            bail!("zone_dir must not be empty");
        }
        if self.zones_conf.as_os_str().is_empty() {
            bail!("zones_conf must not be empty");
        }
        Ok(())
    }

    /// Lock timeout as a `Duration`.
    #[must_use]
    pub fn lock_timeout(&self) -> Duration {
        Duration::from_secs(self.lock_timeout_secs)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod config_tests;
