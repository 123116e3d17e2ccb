// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Write-then-rename file replacement.
//!
//! The new contents go to a temporary file in the target's directory, are flushed
//! to disk, and the temporary file is renamed over the target. Readers see either
//! the old file or the new one, never a partial write. If anything fails before
//! the rename, the temporary file is removed and the target is untouched.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::constants::{TEMP_FILE_PREFIX, ZONE_FILE_MODE};
use crate::errors::ZoneError;

/// Replace `path` with `contents` atomically (blocking).
///
/// # Errors
///
/// Returns [`ZoneError::Io`] naming the failed step. The target is unchanged
/// unless the final rename succeeded.
pub fn write_atomic_blocking(path: &Path, contents: &[u8]) -> Result<(), ZoneError> {
    let dir = parent_dir(path);
    std::fs::create_dir_all(&dir).map_err(|e| ZoneError::io("create directory", &dir, &e))?;

    let mut temp = tempfile::Builder::new()
        .prefix(TEMP_FILE_PREFIX)
        .suffix(".tmp")
        .tempfile_in(&dir)
        .map_err(|e| ZoneError::io("create temporary file in", &dir, &e))?;

    temp.write_all(contents)
        .map_err(|e| ZoneError::io("write temporary file", temp.path(), &e))?;
    temp.as_file()
        .sync_all()
        .map_err(|e| ZoneError::io("flush temporary file", temp.path(), &e))?;

    // Temporary files are created 0600; the daemon usually runs as another user
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        temp.as_file()
            .set_permissions(std::fs::Permissions::from_mode(ZONE_FILE_MODE))
            .map_err(|e| ZoneError::io("set permissions on", temp.path(), &e))?;
    }

    temp.persist(path)
        .map_err(|e| ZoneError::io("rename temporary file over", path, &e.error))?;

    // Make the rename itself durable
    if let Ok(handle) = File::open(&dir) {
        let _ = handle.sync_all();
    }

    debug!(path = %path.display(), bytes = contents.len(), "Atomically replaced file");
    Ok(())
}

/// Replace `path` with `contents` atomically on the blocking thread pool.
///
/// # Errors
///
/// Same as [`write_atomic_blocking`].
pub async fn write_atomic(path: PathBuf, contents: Vec<u8>) -> Result<(), ZoneError> {
    let display = path.display().to_string();
    tokio::task::spawn_blocking(move || write_atomic_blocking(&path, &contents))
        .await
        .map_err(|e| ZoneError::Io {
            operation: "complete write of".to_string(),
            path: display,
            reason: e.to_string(),
        })?
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

#[cfg(test)]
#[path = "atomic_tests.rs"]
mod atomic_tests;
