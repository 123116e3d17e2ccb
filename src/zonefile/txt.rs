// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! TXT character-string quoting, parsing and chunking.
//!
//! A TXT record is stored as one or more quoted strings (`"v=spf1 -all"`). On
//! the wire each character-string holds at most 255 bytes, so longer payloads are
//! rendered as consecutive quoted chunks which the daemon concatenates at load time.

use std::fmt::Write as _;

use crate::constants::TXT_CHUNK_MAX_BYTES;

/// Quote free text for storage, or verify text that is already quoted.
///
/// Unquoted input is trimmed, `"` and `\` are escaped and control characters are
/// written as `\DDD`. Input starting with `"` must be a well-formed sequence of
/// quoted strings and is returned unchanged.
///
/// # Errors
///
/// Returns a message describing the syntax problem for malformed quoted input.
pub fn quote_txt(raw: &str) -> Result<String, String> {
    let trimmed = raw.trim();
    if trimmed.starts_with('"') {
        unquote_txt(trimmed)?;
        return Ok(trimmed.to_string());
    }
    Ok(format!("\"{}\"", escape_text(trimmed)))
}

fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    for c in text.chars() {
        push_escaped_char(&mut out, c);
    }
    out
}

fn push_escaped_char(out: &mut String, c: char) {
    match c {
        '"' => out.push_str("\\\""),
        '\\' => out.push_str("\\\\"),
        c if c.is_control() => {
            let mut buf = [0u8; 4];
            for b in c.encode_utf8(&mut buf).bytes() {
                let _ = write!(out, "\\{b:03}");
            }
        }
        c => out.push(c),
    }
}

/// Parse a sequence of quoted strings and return the concatenated payload bytes.
///
/// # Errors
///
/// See [`split_strings`].
pub fn unquote_txt(text: &str) -> Result<Vec<u8>, String> {
    Ok(split_strings(text)?.concat())
}

/// Parse a sequence of quoted strings and return each string's payload.
///
/// Supports `\"`, `\\`, any `\X` escape and decimal `\DDD` escapes.
///
/// # Errors
///
/// Returns a message when a string is unterminated, an escape is malformed, or
/// quoted strings are not separated by whitespace.
pub fn split_strings(text: &str) -> Result<Vec<Vec<u8>>, String> {
    let bytes = text.as_bytes();
    let mut strings = Vec::new();
    let mut i = 0;

    loop {
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i == bytes.len() {
            break;
        }
        if bytes[i] != b'"' {
            return Err(format!(
                "malformed TXT content: expected '\"' at position {i}"
            ));
        }
        i += 1;

        let mut out = Vec::new();
        loop {
            let Some(&b) = bytes.get(i) else {
                return Err("malformed TXT content: unterminated quoted string".to_string());
            };
            match b {
                b'"' => {
                    i += 1;
                    break;
                }
                b'\\' => {
                    i += 1;
                    let Some(&next) = bytes.get(i) else {
                        return Err("malformed TXT content: dangling backslash".to_string());
                    };
                    if next.is_ascii_digit() {
                        let digits = bytes
                            .get(i..i + 3)
                            .filter(|d| d.iter().all(u8::is_ascii_digit))
                            .ok_or_else(|| {
                                "malformed TXT content: \\DDD escape needs three digits"
                                    .to_string()
                            })?;
                        let value = digits
                            .iter()
                            .fold(0u32, |acc, d| acc * 10 + u32::from(d - b'0'));
                        let byte = u8::try_from(value).map_err(|_| {
                            format!("malformed TXT content: escape \\{value} exceeds 255")
                        })?;
                        out.push(byte);
                        i += 3;
                    } else {
                        out.push(next);
                        i += 1;
                    }
                }
                other => {
                    out.push(other);
                    i += 1;
                }
            }
        }
        strings.push(out);

        if i < bytes.len() && !bytes[i].is_ascii_whitespace() {
            return Err(
                "malformed TXT content: quoted strings must be separated by whitespace"
                    .to_string(),
            );
        }
    }

    if strings.is_empty() {
        return Err("malformed TXT content: no quoted string found".to_string());
    }
    Ok(strings)
}

/// Split a payload into chunks of at most `TXT_CHUNK_MAX_BYTES`.
///
/// Splits are moved back to a UTF-8 character boundary where possible so every
/// chunk stays readable; the concatenation of the chunks is always the input.
#[must_use]
pub fn chunk_payload(payload: &[u8]) -> Vec<&[u8]> {
    let mut chunks = Vec::new();
    let mut start = 0;
    while start < payload.len() {
        let mut end = (start + TXT_CHUNK_MAX_BYTES).min(payload.len());
        if end < payload.len() {
            let mut boundary = end;
            while boundary > start && is_utf8_continuation(payload[boundary]) {
                boundary -= 1;
            }
            if boundary > start {
                end = boundary;
            }
        }
        chunks.push(&payload[start..end]);
        start = end;
    }
    chunks
}

fn is_utf8_continuation(byte: u8) -> bool {
    byte & 0b1100_0000 == 0b1000_0000
}

/// Quote one chunk for the zone file.
fn quote_chunk(chunk: &[u8]) -> String {
    let mut out = String::with_capacity(chunk.len() + 2);
    out.push('"');
    if let Ok(text) = std::str::from_utf8(chunk) {
        for c in text.chars() {
            push_escaped_char(&mut out, c);
        }
    } else {
        for &b in chunk {
            match b {
                b'"' => out.push_str("\\\""),
                b'\\' => out.push_str("\\\\"),
                0x20..=0x7e => out.push(char::from(b)),
                _ => {
                    let _ = write!(out, "\\{b:03}");
                }
            }
        }
    }
    out.push('"');
    out
}

/// Render stored TXT content as quoted character-strings for a zone file.
///
/// Each stored string stays a separate character-string; only strings over
/// `TXT_CHUNK_MAX_BYTES` are split. Content that does not parse as quoted
/// strings is treated as raw text, so rendering never fails.
#[must_use]
pub fn render_txt(content: &str) -> String {
    let strings = split_strings(content).unwrap_or_else(|_| vec![content.as_bytes().to_vec()]);
    strings
        .iter()
        .flat_map(|payload| {
            if payload.is_empty() {
                vec![payload.as_slice()]
            } else {
                chunk_payload(payload)
            }
        })
        .map(quote_chunk)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
#[path = "txt_tests.rs"]
mod txt_tests;
