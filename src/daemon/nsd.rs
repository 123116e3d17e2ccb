// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! NSD control through `nsd-control`.
//!
//! | Operation       | Invocation                    |
//! |-----------------|-------------------------------|
//! | reload one zone | `nsd-control reload <zone>`   |
//! | reload all      | `nsd-control reload`          |
//! | zone list change| `nsd-control reconfig`        |
//! | liveness        | `nsd-control status`          |
//!
//! With `use_sudo` every invocation is prefixed with `sudo -n`, which fails
//! immediately instead of prompting when no sudoers rule allows it.

use std::ffi::OsString;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::{debug, info, warn};

use super::types::{parse_status_version, ControlError, DaemonStatus, Permissions};
use super::DaemonControl;
use crate::config::EngineConfig;
use crate::errors::ZoneError;

const SUDO: &str = "sudo";

/// `nsd-control` driver.
#[derive(Debug, Clone)]
pub struct NsdControl {
    control_command: PathBuf,
    use_sudo: bool,
    timeout: Duration,
    zone_dir: PathBuf,
    zones_conf: PathBuf,
}

impl NsdControl {
    /// Build a driver from the engine configuration.
    #[must_use]
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            control_command: config.daemon.control_command.clone(),
            use_sudo: config.daemon.use_sudo,
            timeout: config.daemon.reload_timeout(),
            zone_dir: config.zone_dir.clone(),
            zones_conf: config.zones_conf.clone(),
        }
    }

    /// Override the per-invocation timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Program and arguments for a control invocation.
    #[must_use]
    pub fn command_line(&self, args: &[&str]) -> (PathBuf, Vec<OsString>) {
        let mut argv: Vec<OsString> = Vec::with_capacity(args.len() + 2);
        let program = if self.use_sudo {
            argv.push(OsString::from("-n"));
            argv.push(self.control_command.clone().into_os_string());
            PathBuf::from(SUDO)
        } else {
            self.control_command.clone()
        };
        argv.extend(args.iter().map(OsString::from));
        (program, argv)
    }

    /// Run one control command; returns its combined output on success.
    async fn run(&self, args: &[&str]) -> Result<String, String> {
        let command_name = args.first().copied().unwrap_or_default();
        let (program, argv) = self.command_line(args);
        debug!(program = %program.display(), ?argv, "Invoking daemon control");

        let mut command = Command::new(&program);
        command
            .args(&argv)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = match tokio::time::timeout(self.timeout, command.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => return Err(format!("failed to run {}: {e}", program.display())),
            Err(_) => {
                return Err(format!(
                    "'{command_name}' timed out after {}s",
                    self.timeout.as_secs_f64()
                ))
            }
        };

        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&output.stderr));

        if let Some(error) = ControlError::parse(command_name, &text) {
            return Err(error.to_string());
        }
        if !output.status.success() {
            return Err(format!(
                "'{command_name}' exited with {}: {}",
                output.status,
                text.trim()
            ));
        }
        Ok(text)
    }

    async fn request(&self, zone: Option<&str>, args: &[&str]) -> Result<(), ZoneError> {
        match self.run(args).await {
            Ok(_) => {
                info!(zone = zone.unwrap_or("*"), command = args[0], "Daemon accepted request");
                Ok(())
            }
            Err(reason) => {
                let hint = if self.use_sudo {
                    ""
                } else {
                    " (maybe sudo is needed)"
                };
                warn!(zone = zone.unwrap_or("*"), command = args[0], %reason, "Daemon request failed{hint}");
                Err(ZoneError::DaemonUnavailable {
                    zone: zone.map(str::to_string),
                    reason,
                })
            }
        }
    }

    fn can_execute(&self) -> bool {
        let control = find_executable(&self.control_command).is_some();
        if self.use_sudo {
            control && find_executable(Path::new(SUDO)).is_some()
        } else {
            control
        }
    }
}

#[async_trait::async_trait]
impl DaemonControl for NsdControl {
    async fn reload(&self, zone: Option<&str>) -> Result<(), ZoneError> {
        match zone {
            Some(name) => self.request(zone, &["reload", name]).await,
            None => self.request(None, &["reload"]).await,
        }
    }

    async fn reconfigure(&self) -> Result<(), ZoneError> {
        self.request(None, &["reconfig"]).await
    }

    async fn status(&self) -> bool {
        self.run(&["status"]).await.is_ok()
    }

    async fn check_permissions(&self) -> Permissions {
        Permissions {
            zone_dir_writable: dir_writable(&self.zone_dir),
            config_writable: file_writable(&self.zones_conf),
            can_reload: self.can_execute(),
        }
    }

    async fn report(&self) -> DaemonStatus {
        let status = self.run(&["status"]).await;
        DaemonStatus {
            running: status.is_ok(),
            version: status.ok().as_deref().and_then(parse_status_version),
            permissions: self.check_permissions().await,
        }
    }
}

/// Whether a file can be created in `dir`. The probe file is anonymous and
/// vanishes on close.
fn dir_writable(dir: &Path) -> bool {
    dir.is_dir() && tempfile::tempfile_in(dir).is_ok()
}

/// Whether `path` can be rewritten: opened for writing if it exists, otherwise
/// created in its parent directory.
fn file_writable(path: &Path) -> bool {
    if path.exists() {
        return OpenOptions::new().append(true).open(path).is_ok();
    }
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => dir_writable(parent),
        _ => dir_writable(Path::new(".")),
    }
}

/// Resolve `program` like the shell does: paths are checked directly, bare
/// names are searched in `PATH`.
#[must_use]
pub fn find_executable(program: &Path) -> Option<PathBuf> {
    if program.components().count() > 1 {
        return is_executable(program).then(|| program.to_path_buf());
    }
    let path_var = std::env::var_os("PATH")?;
    std::env::split_paths(&path_var)
        .map(|dir| dir.join(program))
        .find(|candidate| is_executable(candidate))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path).is_ok_and(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

#[cfg(test)]
#[path = "nsd_tests.rs"]
mod nsd_tests;
