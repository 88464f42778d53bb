//! Content fingerprint for violations via xxh3-128.
//!
//! The digest covers `(file, line, message-or-code, rule, category, severity,
//! source)` and nothing else, so the same finding hashes identically across
//! runs and process restarts.

use xxhash_rust::xxh3::xxh3_128;

use super::violation::Violation;

/// Field separator. Unit separator never appears in paths or tool output.
const SEP: u8 = 0x1f;

/// Compute the stable fingerprint of a violation as 32 lowercase hex chars.
pub fn fingerprint(v: &Violation) -> String {
    let line = v.line.to_string();
    let parts: [&[u8]; 7] = [
        v.file.as_bytes(),
        line.as_bytes(),
        v.message_or_code().as_bytes(),
        v.rule.as_deref().unwrap_or("").as_bytes(),
        v.category.as_str().as_bytes(),
        v.severity.as_str().as_bytes(),
        v.source.as_str().as_bytes(),
    ];

    let capacity = parts.iter().map(|p| p.len() + 1).sum();
    let mut buf = Vec::with_capacity(capacity);
    for part in parts {
        buf.extend_from_slice(part);
        buf.push(SEP);
    }

    format!("{:032x}", xxh3_128(&buf))
}
