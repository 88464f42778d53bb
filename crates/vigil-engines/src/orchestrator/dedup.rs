//! Duplicate collapsing. The first record per key, in merged order, wins.

use rustc_hash::FxHashSet;
use vigil_core::constants::SIMILAR_CODE_PREFIX_CHARS;
use vigil_core::types::{Category, DedupStrategy, Violation, ViolationSource};

#[derive(Debug, PartialEq, Eq, Hash)]
enum DedupKey<'a> {
    Exact(&'a str, u32, &'a str, ViolationSource),
    Location(&'a str, u32),
    Similar(&'a str, Category, &'a str),
}

fn key(v: &Violation, strategy: DedupStrategy) -> DedupKey<'_> {
    match strategy {
        DedupStrategy::Exact => DedupKey::Exact(&v.file, v.line, &v.code, v.source),
        DedupStrategy::Location => DedupKey::Location(&v.file, v.line),
        DedupStrategy::Similar => DedupKey::Similar(&v.file, v.category, code_prefix(&v.code)),
    }
}

fn code_prefix(code: &str) -> &str {
    match code.char_indices().nth(SIMILAR_CODE_PREFIX_CHARS) {
        Some((end, _)) => &code[..end],
        None => code,
    }
}

pub fn deduplicate(violations: Vec<Violation>, strategy: DedupStrategy) -> Vec<Violation> {
    let keep: Vec<bool> = {
        let mut seen = FxHashSet::default();
        violations.iter().map(|v| seen.insert(key(v, strategy))).collect()
    };
    violations
        .into_iter()
        .zip(keep)
        .filter_map(|(v, keep)| keep.then_some(v))
        .collect()
}
