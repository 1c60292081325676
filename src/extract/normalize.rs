//! Canonical forms used as dedup keys.
//!
//! Every function returns `None` when the input is not a value of its kind, and is
//! idempotent on its own output: `normalize(normalize(x)) == normalize(x)`.

use std::net::Ipv6Addr;

use super::types::ValueKind;
use crate::config::ExtractionConfig;

pub fn normalize(kind: ValueKind, raw: &str, config: &ExtractionConfig) -> Option<String> {
    match kind {
        ValueKind::Phone => normalize_phone(raw, config),
        ValueKind::Email => normalize_email(raw),
        ValueKind::Ip => normalize_ip(raw, config),
    }
}

/// Digits only, North American country code optionally dropped, length checked
pub fn normalize_phone(raw: &str, config: &ExtractionConfig) -> Option<String> {
    let mut digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();

    if config.strip_country_code && digits.len() == 11 && digits.starts_with('1') {
        digits.remove(0);
    }

    let len = digits.len();
    (len >= config.min_phone_digits && len <= config.max_phone_digits).then_some(digits)
}

/// Trimmed and lowercased; must have a non-empty local part and a dotted domain
pub fn normalize_email(raw: &str) -> Option<String> {
    let email = raw.trim().to_lowercase();
    let (local, domain) = email.split_once('@')?;

    let valid = !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.');
    valid.then_some(email)
}

/// Dotted-decimal IPv4 without leading zeros, or canonical IPv6 text
pub fn normalize_ip(raw: &str, config: &ExtractionConfig) -> Option<String> {
    let raw = raw.trim();
    if let Some(v4) = normalize_ipv4(raw) {
        return Some(v4);
    }
    if config.ipv6 {
        return raw.parse::<Ipv6Addr>().ok().map(|addr| addr.to_string());
    }
    None
}

fn normalize_ipv4(raw: &str) -> Option<String> {
    let mut octets = Vec::with_capacity(4);
    for group in raw.split('.') {
        if group.is_empty() || group.len() > 3 || !group.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let octet: u16 = group.parse().ok()?;
        if octet > 255 {
            return None;
        }
        octets.push(octet.to_string());
    }
    (octets.len() == 4).then(|| octets.join("."))
}
