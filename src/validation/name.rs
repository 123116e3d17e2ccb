// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Record-name and domain-name validation.

use regex::Regex;
use std::sync::LazyLock;

use super::ValidationResult;
use crate::constants::{APEX_NAME, MAX_DOMAIN_NAME_LENGTH, MAX_LABEL_LENGTH, WILDCARD_LABEL};

/// Host label: letters, digits, inner hyphens (input is lower-cased first)
static HOST_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9](?:[a-z0-9-]*[a-z0-9])?$").expect("static host label pattern")
});

/// Service label used by SRV/TXT owners (`_sip`, `_tcp`, `_dmarc`)
static SERVICE_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^_[a-z0-9](?:[a-z0-9-]*[a-z0-9])?$").expect("static service label pattern")
});

/// Which labels a name may contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LabelPolicy {
    /// Owner names: host labels, `_service` labels and a leftmost `*`
    Owner,
    /// Host names in content fields: host labels only
    Host,
}

/// Check one label against the policy.
fn check_label(label: &str, leftmost: bool, policy: LabelPolicy) -> Result<(), String> {
    if label.is_empty() {
        return Err("empty label (consecutive or leading dots)".to_string());
    }
    if label.len() > MAX_LABEL_LENGTH {
        return Err(format!(
            "label '{label}' is longer than {MAX_LABEL_LENGTH} characters"
        ));
    }
    if policy == LabelPolicy::Owner && label == WILDCARD_LABEL {
        return if leftmost {
            Ok(())
        } else {
            Err("wildcard '*' is only allowed as the leftmost label".to_string())
        };
    }
    if HOST_LABEL.is_match(label) {
        return Ok(());
    }
    if policy == LabelPolicy::Owner && SERVICE_LABEL.is_match(label) {
        return Ok(());
    }
    if label.starts_with('-') || label.ends_with('-') {
        return Err(format!(
            "label '{label}' must not start or end with a hyphen"
        ));
    }
    Err(format!(
        "label '{label}' may only contain letters, digits and hyphens"
    ))
}

/// Check every label of a dotted name (no trailing dot).
pub(crate) fn check_labels(name: &str, policy: LabelPolicy) -> Result<(), String> {
    for (index, label) in name.split('.').enumerate() {
        check_label(label, index == 0, policy)?;
    }
    Ok(())
}

/// Normalize a zone apex for comparisons: lower-case, no trailing dot.
pub(crate) fn normalize_apex(apex: &str) -> String {
    apex.trim().trim_end_matches('.').to_ascii_lowercase()
}

/// Validate a record name relative to `apex_domain`.
///
/// Rules:
/// - `@` passes unchanged
/// - a trailing dot is stripped; if the remaining name is the apex itself it becomes
///   `@`, and if it ends in the apex the apex suffix is removed
/// - every label must be a host label, a `_service` label, or a leftmost `*`
/// - the name joined with the apex must not exceed 253 characters
///
/// `corrected` is the canonical relative form (lower-cased, no trailing dot).
#[must_use]
pub fn validate_name(raw_name: &str, apex_domain: &str) -> ValidationResult {
    let trimmed = raw_name.trim();
    if trimmed.is_empty() {
        return ValidationResult::invalid(
            raw_name,
            "record name must not be empty (use @ for the zone apex)",
        );
    }
    if trimmed == APEX_NAME {
        return ValidationResult::ok(APEX_NAME);
    }

    let apex = normalize_apex(apex_domain);
    let lowered = trimmed.to_ascii_lowercase();

    let name = match lowered.strip_suffix('.') {
        Some(stripped) => {
            if stripped == apex {
                return ValidationResult::ok(APEX_NAME);
            }
            match stripped.strip_suffix(apex.as_str()) {
                Some(relative) if relative.len() > 1 => match relative.strip_suffix('.') {
                    Some(inner) => inner.to_string(),
                    None => stripped.to_string(),
                },
                _ => stripped.to_string(),
            }
        }
        None => lowered,
    };

    if let Err(message) = check_labels(&name, LabelPolicy::Owner) {
        return ValidationResult::invalid(raw_name, message);
    }

    let full_length = name.len() + 1 + apex.len();
    if full_length > MAX_DOMAIN_NAME_LENGTH {
        return ValidationResult::invalid(
            raw_name,
            format!(
                "name is {full_length} characters long once joined with the zone; maximum is {MAX_DOMAIN_NAME_LENGTH}"
            ),
        );
    }

    ValidationResult::ok(name)
}

/// Validate a zone name.
///
/// The name must have at least two host labels. `corrected` is lower-cased with
/// the trailing dot removed.
#[must_use]
pub fn validate_domain_name(raw_name: &str) -> ValidationResult {
    let name = normalize_apex(raw_name);
    if name.is_empty() {
        return ValidationResult::invalid(raw_name, "domain name must not be empty");
    }
    if name.len() > MAX_DOMAIN_NAME_LENGTH {
        return ValidationResult::invalid(
            raw_name,
            format!("domain name exceeds {MAX_DOMAIN_NAME_LENGTH} characters"),
        );
    }
    if !name.contains('.') {
        return ValidationResult::invalid(
            raw_name,
            "domain name must contain at least two labels (e.g. example.com)",
        );
    }
    if let Err(message) = check_labels(&name, LabelPolicy::Host) {
        return ValidationResult::invalid(raw_name, message);
    }
    ValidationResult::ok(name)
}

#[cfg(test)]
#[path = "name_tests.rs"]
mod name_tests;
