// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Data types for daemon control.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Structured `nsd-control` error response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlError {
    /// The control command that failed (e.g., "reload", "reconfig")
    pub command: String,
    /// The error text reported by the daemon
    pub error: String,
    /// Additional lines of output
    pub details: Option<String>,
}

/// `error` must stand alone, so words like `errors` do not match.
fn ends_error_token(rest: &str) -> bool {
    rest.is_empty() || rest.starts_with(':') || rest.starts_with(char::is_whitespace)
}

impl ControlError {
    /// Parse `nsd-control` output for an error line.
    ///
    /// Recognized forms:
    /// ```text
    /// error zone example.test not present
    /// [2025-01-01 10:00:00.000] nsd-control[812]: error: could not SSL_connect
    /// ```
    #[must_use]
    pub fn parse(command: &str, output: &str) -> Option<Self> {
        let lines: Vec<&str> = output.lines().collect();
        let (index, error) = lines.iter().enumerate().find_map(|(i, line)| {
            let line = line.trim();
            let rest = match line.strip_prefix("error") {
                Some(rest) if ends_error_token(rest) => rest,
                _ => {
                    let pos = line.find(": error")?;
                    let rest = &line[pos + ": error".len()..];
                    if !ends_error_token(rest) {
                        return None;
                    }
                    rest
                }
            };
            Some((i, rest.trim_start_matches(':').trim().to_string()))
        })?;

        let details = lines
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != index)
            .map(|(_, l)| l.trim())
            .filter(|l| !l.is_empty())
            .collect::<Vec<_>>()
            .join("\n");

        Some(Self {
            command: command.to_string(),
            error,
            details: if details.is_empty() { None } else { Some(details) },
        })
    }
}

impl fmt::Display for ControlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' failed: {}", self.command, self.error)?;
        if let Some(details) = &self.details {
            write!(f, " ({details})")?;
        }
        Ok(())
    }
}

/// Result of the read-only permission probe.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permissions {
    /// Zone files can be created in the zone directory
    pub zone_dir_writable: bool,
    /// The zone-list include file can be rewritten
    pub config_writable: bool,
    /// The control utility (and `sudo`, if configured) is executable
    pub can_reload: bool,
}

impl Permissions {
    /// Operator warnings for every failed probe.
    #[must_use]
    pub fn warnings(&self) -> Vec<&'static str> {
        let mut warnings = Vec::new();
        if !self.zone_dir_writable {
            warnings.push("zone directory is not writable");
        }
        if !self.config_writable {
            warnings.push("zone list include file is not writable");
        }
        if !self.can_reload {
            warnings.push("daemon control utility is not executable (maybe sudo is needed)");
        }
        warnings
    }
}

/// Combined liveness and permission report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaemonStatus {
    /// The daemon answered a status request
    pub running: bool,
    /// Version reported by the daemon, when running
    pub version: Option<String>,
    /// Permission probe
    pub permissions: Permissions,
}

/// Extract the `version:` line from `nsd-control status` output.
#[must_use]
pub fn parse_status_version(output: &str) -> Option<String> {
    output
        .lines()
        .find_map(|line| line.trim().strip_prefix("version:"))
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
#[path = "types_tests.rs"]
mod types_tests;
