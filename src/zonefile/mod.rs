// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Master zone file rendering.
//!
//! [`render`] turns a [`Domain`] and its record set into RFC 1035 master-file
//! text. Output is a pure function of the input: no timestamps, no host names,
//! and a fixed record order, so rendering the same state twice is byte-identical.
//!
//! ## Layout
//!
//! ```text
//! ; Managed by zonekeeper. Manual edits will be overwritten.
//! $ORIGIN example.test.
//! $TTL 3600
//! @ IN SOA ns1.example.test. admin.example.test. (2 7200 3600 1209600 3600)
//! @ 3600 IN NS ns1.example.test.
//! @ 3600 IN A 203.0.113.5
//! www 3600 IN A 203.0.113.6
//! ```
//!
//! ## Ordering
//!
//! 1. The SOA line, built from the domain (SOA records only supply the mailbox)
//! 2. NS records
//! 3. Everything else
//!
//! Within groups 2 and 3 records sort by owner (`@` first, then byte order),
//! then type, priority and content.

pub mod txt;

use std::cmp::Ordering;
use std::fmt::Write as _;

use crate::constants::APEX_NAME;
use crate::model::{Domain, Record, RecordType};

/// First line of every rendered zone file
pub const ZONE_FILE_HEADER: &str = "; Managed by zonekeeper. Manual edits will be overwritten.";

/// Mailbox used when neither an SOA record nor the domain carries one
const FALLBACK_MAILBOX_LOCAL: &str = "hostmaster";

/// Render the complete zone file for `domain`.
///
/// Never fails: records that bypassed validation are rendered as faithfully as
/// possible. A record set without NS records still yields a loadable SOA, using
/// the zone apex as primary name server.
#[must_use]
pub fn render(domain: &Domain, records: &[Record]) -> String {
    let origin = domain.fqdn();

    let mut name_servers: Vec<&Record> = records
        .iter()
        .filter(|r| r.record_type == RecordType::Ns)
        .collect();
    name_servers.sort_by(|a, b| compare_records(a, b));

    let mut others: Vec<&Record> = records
        .iter()
        .filter(|r| !matches!(r.record_type, RecordType::Soa | RecordType::Ns))
        .collect();
    others.sort_by(|a, b| compare_records(a, b));

    let primary_ns = name_servers
        .first()
        .map_or_else(|| origin.clone(), |ns| absolute_host(&ns.content, &origin));

    let mut out = String::new();
    let _ = writeln!(out, "{ZONE_FILE_HEADER}");
    let _ = writeln!(out, "$ORIGIN {origin}");
    let _ = writeln!(out, "$TTL {}", domain.default_ttl);
    let _ = writeln!(
        out,
        "{APEX_NAME} IN SOA {primary_ns} {} ({} {} {} {} {})",
        admin_mailbox(domain, records),
        domain.serial,
        domain.soa.refresh,
        domain.soa.retry,
        domain.soa.expire,
        domain.soa.minimum,
    );

    for record in name_servers.into_iter().chain(others) {
        out.push_str(&render_record(domain, record));
        out.push('\n');
    }
    out
}

/// Render a single resource record line (without newline).
///
/// SOA records are rendered by [`render`] as the zone's SOA line; passing one
/// here yields a comment so the output stays loadable.
#[must_use]
pub fn render_record(domain: &Domain, record: &Record) -> String {
    let origin = domain.fqdn();
    let name = owner_name(&record.name);
    let ttl = record.effective_ttl(domain);
    let rtype = record.record_type;

    let content = match rtype {
        RecordType::Soa => return format!("; SOA mailbox {}", record.content),
        RecordType::Ns | RecordType::Cname | RecordType::Mx | RecordType::Ptr => {
            absolute_host(&record.content, &origin)
        }
        RecordType::Txt => txt::render_txt(&record.content),
        RecordType::Srv => srv_content(&record.content, &origin),
        RecordType::A | RecordType::Aaaa => record.content.trim().to_string(),
    };

    if rtype.has_priority() {
        format!("{name} {ttl} IN {rtype} {} {content}", record.priority)
    } else {
        format!("{name} {ttl} IN {rtype} {content}")
    }
}

/// Deterministic record order: owner, type, priority, content.
fn compare_records(a: &Record, b: &Record) -> Ordering {
    owner_key(&a.name)
        .cmp(&owner_key(&b.name))
        .then_with(|| a.record_type.render_rank().cmp(&b.record_type.render_rank()))
        .then_with(|| a.priority.cmp(&b.priority))
        .then_with(|| a.content.cmp(&b.content))
}

/// Sort key putting the apex before every other owner.
fn owner_key(name: &str) -> (bool, &str) {
    let name = owner_name(name);
    (name != APEX_NAME, name)
}

fn owner_name(name: &str) -> &str {
    let name = name.trim();
    if name.is_empty() {
        APEX_NAME
    } else {
        name
    }
}

/// Absolute form of a host name found in content.
fn absolute_host(host: &str, origin: &str) -> String {
    let host = host.trim();
    if host.is_empty() || host == APEX_NAME {
        origin.to_string()
    } else if host.ends_with('.') {
        host.to_string()
    } else {
        format!("{host}.{origin}")
    }
}

/// `weight port target` with the target made absolute.
fn srv_content(content: &str, origin: &str) -> String {
    let parts: Vec<&str> = content.split_whitespace().collect();
    match parts.as_slice() {
        [weight, port, "."] => format!("{weight} {port} ."),
        [weight, port, target] => format!("{weight} {port} {}", absolute_host(target, origin)),
        _ => content.trim().to_string(),
    }
}

/// SOA RNAME: the first SOA record's mailbox, then the domain's, then `hostmaster`.
fn admin_mailbox(domain: &Domain, records: &[Record]) -> String {
    let from_record = records
        .iter()
        .find(|r| r.record_type == RecordType::Soa)
        .map(|r| r.content.trim())
        .filter(|c| !c.is_empty());

    let mailbox = match from_record {
        Some(content) => content.replace('@', "."),
        None if !domain.soa_email.trim().is_empty() => domain.soa_email.trim().replace('@', "."),
        None => format!("{FALLBACK_MAILBOX_LOCAL}.{}", domain.name),
    };

    if mailbox.ends_with('.') {
        mailbox
    } else {
        format!("{mailbox}.")
    }
}
