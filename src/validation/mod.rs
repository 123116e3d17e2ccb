// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Record validation and canonicalization.
//!
//! Every record name and content passes through this module before it is persisted.
//! The functions are pure: no I/O and no shared state beyond the label patterns
//! compiled once on first use.
//!
//! Each check returns a [`ValidationResult`]. When `valid` is true, `corrected`
//! holds the canonical form the caller must persist instead of the raw input.
//!
//! # Example
//!
//! ```rust
//! use zonekeeper::model::RecordType;
//! use zonekeeper::validation::{validate_content, validate_name};
//!
//! let name = validate_name("WWW.", "example.test");
//! assert!(name.valid);
//! assert_eq!(name.corrected, "www");
//!
//! let target = validate_content(RecordType::Cname, "web", "example.test");
//! assert_eq!(target.corrected, "web.example.test.");
//! ```

pub mod content;
pub mod name;

pub use content::{validate_content, validate_email, validate_ip};
pub use name::{validate_domain_name, validate_name};

use serde::{Deserialize, Serialize};

use crate::errors::ZoneError;

/// Outcome of validating one input value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// Whether the input is acceptable
    pub valid: bool,
    /// Violated rule when invalid, empty otherwise
    pub message: String,
    /// Canonical form to persist; the raw input when invalid
    pub corrected: String,
}

impl ValidationResult {
    /// A passing result carrying the canonical value.
    #[must_use]
    pub fn ok(corrected: impl Into<String>) -> Self {
        Self {
            valid: true,
            message: String::new(),
            corrected: corrected.into(),
        }
    }

    /// A failing result; `corrected` echoes the raw input.
    #[must_use]
    pub fn invalid(raw: &str, message: impl Into<String>) -> Self {
        Self {
            valid: false,
            message: message.into(),
            corrected: raw.to_string(),
        }
    }

    /// Convert into a `Result`, yielding the canonical value on success.
    ///
    /// # Errors
    ///
    /// Returns [`ZoneError::Validation`] naming `field` when the result is invalid.
    pub fn into_result(self, field: &str) -> Result<String, ZoneError> {
        if self.valid {
            Ok(self.corrected)
        } else {
            Err(ZoneError::validation(field, self.corrected, self.message))
        }
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod mod_tests;
