//! Deterministic merge of per-adapter output.

use std::cmp::Ordering;

use rustc_hash::FxHashMap;
use vigil_core::types::{Violation, ViolationSource};

use crate::engine::EngineResult;

/// Concatenate successful results and sort by
/// `(source tiebreak, severity, file, line)`.
///
/// `results` must already be in priority order: a source's tiebreak is the
/// position of the first result carrying it. The sort is stable, so the
/// output does not depend on which adapter finished first.
pub fn merge_results(results: &[EngineResult]) -> Vec<Violation> {
    let mut source_rank: FxHashMap<ViolationSource, usize> = FxHashMap::default();
    for (idx, result) in results.iter().enumerate() {
        source_rank.entry(result.source).or_insert(idx);
    }

    let mut merged: Vec<Violation> = results
        .iter()
        .filter(|r| r.success)
        .flat_map(|r| r.violations.iter().cloned())
        .collect();

    let rank = |v: &Violation| source_rank.get(&v.source).copied().unwrap_or(usize::MAX);
    merged.sort_by(|a, b| compare(a, b, &rank));
    merged
}

fn compare(a: &Violation, b: &Violation, rank: &impl Fn(&Violation) -> usize) -> Ordering {
    rank(a)
        .cmp(&rank(b))
        .then_with(|| a.severity.rank().cmp(&b.severity.rank()))
        .then_with(|| a.file.cmp(&b.file))
        .then_with(|| a.line.cmp(&b.line))
}
