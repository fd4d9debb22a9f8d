//! Address / identity predicates.
//!
//! Pure, allocation-light checks called on every keystroke by form UIs.
//! None of them panic; a malformed input is simply `false`.

use once_cell::sync::Lazy;
use regex::Regex;
use std::net::IpAddr;

static LABEL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9_](?:[A-Za-z0-9_-]{0,61}[A-Za-z0-9_])?$").expect("static regex")
});

/// IPv4 or IPv6 literal (no brackets, no zone id).
pub fn is_valid_ip_address(s: &str) -> bool {
    s.parse::<IpAddr>().is_ok()
}

/// Syntactically valid hostname.
///
/// A TLD is not required (`localhost`, `node-1` pass) and underscores are
/// allowed. The last label may not be purely numeric, which keeps
/// `999.999.999.999` from sneaking through as a "domain".
pub fn is_valid_domain_name(s: &str) -> bool {
    let name = s.strip_suffix('.').unwrap_or(s);
    if name.is_empty() || name.len() > 253 {
        return false;
    }
    let mut last = "";
    for label in name.split('.') {
        if !LABEL_RE.is_match(label) {
            return false;
        }
        last = label;
    }
    !last.bytes().all(|b| b.is_ascii_digit())
}

/// IP literal or hostname, after trimming surrounding whitespace.
pub fn is_valid_address(s: &str) -> bool {
    let s = s.trim();
    !s.is_empty() && (is_valid_ip_address(s) || is_valid_domain_name(s))
}

/// Integer in `[1, 65535]`.
pub fn is_valid_port(p: &str) -> bool {
    matches!(p.trim().parse::<i64>(), Ok(n) if (1..=65535).contains(&n))
}

/// Canonical hyphenated UUID (8-4-4-4-12 hex), any version.
pub fn is_valid_uuid(s: &str) -> bool {
    s.len() == 36 && uuid::Uuid::try_parse(s).is_ok()
}
