//! Normalization applied to every adapter's raw output.

use vigil_core::types::{categorize, Category, Violation, ViolationSource};

/// Trim text fields, stamp the adapter's declared `source`, and fill in the
/// category from the lookup table when the adapter left it as `other`.
pub fn normalize_violations(raw: Vec<Violation>, source: ViolationSource) -> Vec<Violation> {
    raw.into_iter().map(|v| normalize(v, source)).collect()
}

fn normalize(mut v: Violation, source: ViolationSource) -> Violation {
    v.file = v.file.trim().to_string();
    v.code = v.code.trim().to_string();
    v.message = trimmed(v.message);
    v.rule = trimmed(v.rule);
    v.fix_suggestion = trimmed(v.fix_suggestion);
    v.source = source;
    if v.category == Category::Other {
        v.category = categorize(source, v.rule.as_deref());
    }
    v
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
