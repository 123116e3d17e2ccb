// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Zone serial bump policy.
//!
//! Serials are 32-bit values compared with RFC 1982 sequence-space arithmetic, so
//! "greater" survives the wrap at `u32::MAX`. Two schemes are supported:
//!
//! - [`SerialScheme::Increment`]: `current + 1` (wrapping). The default.
//! - [`SerialScheme::Date`]: `YYYYMMDDnn`. Uses today's `YYYYMMDD00` when that is
//!   ahead of the current serial, otherwise falls back to `current + 1`.
//!
//! Either scheme always yields a value strictly greater than its input, so a
//! deployment may move from `Increment` to `Date` without publishing a lower
//! serial. It must not move back once date-based serials are live: plain
//! increments would still be monotonic, but operators reading serials as dates
//! would be misled.
//!
//! # Example
//!
//! ```rust
//! use zonekeeper::serial::{serial_gt, SerialScheme};
//!
//! let next = SerialScheme::Increment.next_serial(u32::MAX);
//! assert_eq!(next, 0);
//! assert!(serial_gt(next, u32::MAX));
//! ```

use chrono::{Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Half of the serial space; differences at or above this are not comparable.
const SERIAL_HALF_RANGE: u32 = 1 << 31;

/// Serial bump strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SerialScheme {
    /// Add one to the current serial
    #[default]
    Increment,
    /// Date-encoded `YYYYMMDDnn`
    Date,
}

impl SerialScheme {
    /// Return the serial that follows `current`.
    ///
    /// The result is always strictly greater than `current` in RFC 1982 terms.
    #[must_use]
    pub fn next_serial(self, current: u32) -> u32 {
        self.next_serial_on(current, Utc::now().date_naive())
    }

    /// Same as [`SerialScheme::next_serial`] with an explicit calendar date.
    #[must_use]
    pub fn next_serial_on(self, current: u32, today: NaiveDate) -> u32 {
        match self {
            Self::Increment => current.wrapping_add(1),
            Self::Date => {
                let candidate = date_serial(today);
                if serial_gt(candidate, current) {
                    candidate
                } else {
                    current.wrapping_add(1)
                }
            }
        }
    }
}

/// `YYYYMMDD00` for the given date.
#[must_use]
pub fn date_serial(date: NaiveDate) -> u32 {
    // Years past 4294 overflow u32; saturate rather than wrap to a small serial.
    let year = u32::try_from(date.year()).unwrap_or(0);
    year.saturating_mul(1_000_000)
        .saturating_add(date.month() * 10_000)
        .saturating_add(date.day() * 100)
}

/// RFC 1982 "greater than" for 32-bit serials.
///
/// Returns `false` for equal values and for the undefined case where the two
/// serials are exactly half the sequence space apart.
#[must_use]
pub fn serial_gt(a: u32, b: u32) -> bool {
    a != b && a.wrapping_sub(b) < SERIAL_HALF_RANGE
}

#[cfg(test)]
#[path = "serial_tests.rs"]
mod serial_tests;
