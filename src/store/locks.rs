// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Per-domain mutual exclusion.
//!
//! Each zone name maps to its own async mutex. Holding a [`ZoneLease`] is the
//! only way to commit or delete a zone file, so two edits of the same domain run
//! strictly one after the other while different domains proceed in parallel.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::{debug, warn};

use crate::errors::ZoneError;

/// Registry of per-zone locks.
#[derive(Debug)]
pub struct DomainLocks {
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
    timeout: Duration,
}

/// Exclusive right to mutate one zone; released on drop.
#[derive(Debug)]
pub struct ZoneLease {
    zone: String,
    _guard: OwnedMutexGuard<()>,
}

impl ZoneLease {
    /// The locked zone name.
    #[must_use]
    pub fn zone(&self) -> &str {
        &self.zone
    }
}

impl DomainLocks {
    /// Create an empty registry whose waits are bounded by `timeout`.
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self {
            locks: Mutex::new(HashMap::new()),
            timeout,
        }
    }

    /// Wait for exclusive access to `zone`.
    ///
    /// # Errors
    ///
    /// Returns [`ZoneError::Concurrency`] when the lock is not obtained within
    /// the configured bound.
    pub async fn acquire(&self, zone: &str) -> Result<ZoneLease, ZoneError> {
        let lock = self.lock_for(zone);
        let started = Instant::now();

        match tokio::time::timeout(self.timeout, lock.lock_owned()).await {
            Ok(guard) => {
                debug!(zone = %zone, waited_ms = started.elapsed().as_millis(), "Acquired zone lock");
                Ok(ZoneLease {
                    zone: zone.to_string(),
                    _guard: guard,
                })
            }
            Err(_) => {
                let waited_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
                warn!(zone = %zone, waited_ms, "Timed out waiting for zone lock");
                Err(ZoneError::Concurrency {
                    zone: zone.to_string(),
                    waited_ms,
                })
            }
        }
    }

    /// Number of zones with a live lock entry.
    #[must_use]
    pub fn tracked(&self) -> usize {
        self.locks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    fn lock_for(&self, zone: &str) -> Arc<AsyncMutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        // Entries nobody holds or waits on only carry the map reference
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        Arc::clone(locks.entry(zone.to_string()).or_default())
    }
}

#[cfg(test)]
#[path = "locks_tests.rs"]
mod locks_tests;
