// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Type-dependent record content validation.

use regex::Regex;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::sync::LazyLock;

use super::name::{check_labels, normalize_apex, LabelPolicy};
use super::ValidationResult;
use crate::constants::{APEX_NAME, MAX_DOMAIN_NAME_LENGTH, MAX_TXT_LENGTH};
use crate::model::RecordType;
use crate::zonefile::txt::{quote_txt, unquote_txt};

/// Local part of a mailbox (lower-cased input)
static MAILBOX_LOCAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9!#$%&'*+/=?^_`{|}~-]+(?:\.[a-z0-9!#$%&'*+/=?^_`{|}~-]+)*$")
        .expect("static mailbox pattern")
});

/// Validate record content for `record_type` within the zone `apex_domain`.
///
/// - `A`: dotted-quad IPv4; canonical dotted form
/// - `AAAA`: IPv6; canonical compressed form
/// - `NS`, `CNAME`, `MX`, `PTR`: host name; relative input is qualified with the apex,
///   the result always ends with a dot
/// - `TXT`: quoted and escaped if not already quoted
/// - `SOA`: administrator mailbox rewritten to domain form with a trailing dot
/// - `SRV`: `weight port target`, target qualified like a host name
#[must_use]
pub fn validate_content(
    record_type: RecordType,
    raw_content: &str,
    apex_domain: &str,
) -> ValidationResult {
    if raw_content.trim().is_empty() {
        return ValidationResult::invalid(raw_content, "content must not be empty");
    }

    match record_type {
        RecordType::A => validate_ipv4(raw_content),
        RecordType::Aaaa => validate_ipv6(raw_content),
        RecordType::Ns | RecordType::Cname | RecordType::Mx | RecordType::Ptr => {
            validate_hostname(raw_content, apex_domain)
        }
        RecordType::Txt => validate_txt(raw_content),
        RecordType::Soa => validate_mailbox(raw_content),
        RecordType::Srv => validate_srv(raw_content, apex_domain),
    }
}

fn validate_ipv4(raw: &str) -> ValidationResult {
    match raw.trim().parse::<Ipv4Addr>() {
        Ok(addr) => ValidationResult::ok(addr.to_string()),
        Err(_) => ValidationResult::invalid(
            raw,
            "A record content must be a dotted-quad IPv4 address (e.g. 203.0.113.5)",
        ),
    }
}

fn validate_ipv6(raw: &str) -> ValidationResult {
    match raw.trim().parse::<Ipv6Addr>() {
        Ok(addr) => ValidationResult::ok(addr.to_string()),
        Err(_) => ValidationResult::invalid(
            raw,
            "AAAA record content must be an IPv6 address (e.g. 2001:db8::1)",
        ),
    }
}

/// Qualify and check a host name. Relative names are joined with the apex.
pub(crate) fn qualify_hostname(raw: &str, apex_domain: &str) -> Result<String, String> {
    let lowered = raw.trim().to_ascii_lowercase();
    let apex = normalize_apex(apex_domain);

    if lowered == APEX_NAME {
        return Ok(format!("{apex}."));
    }

    let absolute = match lowered.strip_suffix('.') {
        Some(name) => name.to_string(),
        None if apex.is_empty() => lowered,
        None => format!("{lowered}.{apex}"),
    };

    if absolute.is_empty() {
        return Err("host name must not be the root".to_string());
    }
    check_labels(&absolute, LabelPolicy::Host)?;
    if absolute.len() > MAX_DOMAIN_NAME_LENGTH {
        return Err(format!(
            "host name '{absolute}' exceeds {MAX_DOMAIN_NAME_LENGTH} characters"
        ));
    }
    Ok(format!("{absolute}."))
}

fn validate_hostname(raw: &str, apex_domain: &str) -> ValidationResult {
    match qualify_hostname(raw, apex_domain) {
        Ok(host) => ValidationResult::ok(host),
        Err(message) => ValidationResult::invalid(raw, format!("invalid host name: {message}")),
    }
}

fn validate_txt(raw: &str) -> ValidationResult {
    let quoted = match quote_txt(raw) {
        Ok(quoted) => quoted,
        Err(message) => return ValidationResult::invalid(raw, message),
    };
    match unquote_txt(&quoted) {
        Ok(bytes) if bytes.len() > MAX_TXT_LENGTH => ValidationResult::invalid(
            raw,
            format!(
                "TXT content is {} bytes; maximum is {MAX_TXT_LENGTH}",
                bytes.len()
            ),
        ),
        Ok(_) => ValidationResult::ok(quoted),
        Err(message) => ValidationResult::invalid(raw, message),
    }
}

/// Mailbox in domain form: local-part dots escaped, `@` replaced with `.`.
fn validate_mailbox(raw: &str) -> ValidationResult {
    let lowered = raw.trim().to_ascii_lowercase();

    let Some((local, domain)) = lowered.split_once('@') else {
        // Already in domain form (e.g. "hostmaster.example.com.")
        return match absolute_mailbox_domain(&lowered) {
            Ok(mailbox) => ValidationResult::ok(mailbox),
            Err(message) => ValidationResult::invalid(raw, message),
        };
    };

    if !MAILBOX_LOCAL.is_match(local) {
        return ValidationResult::invalid(raw, "invalid mailbox: malformed local part");
    }
    let domain = match absolute_mailbox_domain(domain) {
        Ok(domain) => domain,
        Err(message) => return ValidationResult::invalid(raw, message),
    };

    ValidationResult::ok(format!("{}.{domain}", local.replace('.', "\\.")))
}

fn absolute_mailbox_domain(domain: &str) -> Result<String, String> {
    let name = domain.strip_suffix('.').unwrap_or(domain);
    if !name.contains('.') {
        return Err("invalid mailbox: domain must contain at least two labels".to_string());
    }
    check_labels(name, LabelPolicy::Host).map_err(|m| format!("invalid mailbox: {m}"))?;
    if name.len() > MAX_DOMAIN_NAME_LENGTH {
        return Err(format!(
            "invalid mailbox: exceeds {MAX_DOMAIN_NAME_LENGTH} characters"
        ));
    }
    Ok(format!("{name}."))
}

fn validate_srv(raw: &str, apex_domain: &str) -> ValidationResult {
    let parts: Vec<&str> = raw.split_whitespace().collect();
    let [weight, port, target] = parts.as_slice() else {
        return ValidationResult::invalid(
            raw,
            "SRV content must be 'weight port target' (priority is a separate field)",
        );
    };

    let Ok(weight) = weight.parse::<u16>() else {
        return ValidationResult::invalid(raw, "SRV weight must be an integer 0-65535");
    };
    let Ok(port) = port.parse::<u16>() else {
        return ValidationResult::invalid(raw, "SRV port must be an integer 0-65535");
    };

    // "." means the service is explicitly unavailable
    let target = if *target == "." {
        ".".to_string()
    } else {
        match qualify_hostname(target, apex_domain) {
            Ok(host) => host,
            Err(message) => {
                return ValidationResult::invalid(raw, format!("invalid SRV target: {message}"))
            }
        }
    };

    ValidationResult::ok(format!("{weight} {port} {target}"))
}

/// Validate an email address.
///
/// `corrected` is the lower-cased address.
#[must_use]
pub fn validate_email(raw: &str) -> ValidationResult {
    let lowered = raw.trim().to_ascii_lowercase();
    let Some((local, domain)) = lowered.split_once('@') else {
        return ValidationResult::invalid(raw, "email address must contain '@'");
    };
    if !MAILBOX_LOCAL.is_match(local) {
        return ValidationResult::invalid(raw, "email address has a malformed local part");
    }
    if let Err(message) = absolute_mailbox_domain(domain) {
        return ValidationResult::invalid(raw, message.replace("invalid mailbox", "email domain"));
    }
    ValidationResult::ok(lowered)
}

/// Validate an IPv4 or IPv6 address.
#[must_use]
pub fn validate_ip(raw: &str) -> ValidationResult {
    match raw.trim().parse::<IpAddr>() {
        Ok(addr) => ValidationResult::ok(addr.to_string()),
        Err(_) => ValidationResult::invalid(raw, "not a valid IPv4 or IPv6 address"),
    }
}

#[cfg(test)]
#[path = "content_tests.rs"]
mod content_tests;
