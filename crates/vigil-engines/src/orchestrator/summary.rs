//! Per-cycle aggregate handed to the display and report collaborators.

use std::collections::BTreeMap;

use rustc_hash::FxHashMap;
use serde::Serialize;
use serde_json::{Map, Value};
use vigil_core::errors::VigilErrorCode;
use vigil_core::types::Violation;

use crate::engine::EngineResult;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileCount {
    pub file: String,
    pub count: usize,
}

/// A failed adapter, as reported in the summary's error list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineFailure {
    pub engine: String,
    pub message: String,
    pub error_code: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineInfo {
    pub name: String,
    pub source: String,
    pub success: bool,
    pub violations: usize,
    pub execution_ms: u64,
    pub metadata: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrchestrationSummary {
    pub total: usize,
    pub by_severity: BTreeMap<String, usize>,
    pub by_source: BTreeMap<String, usize>,
    pub by_category: BTreeMap<String, usize>,
    /// Most affected files; ties keep first-encountered order.
    pub top_files: Vec<FileCount>,
    pub errors: Vec<EngineFailure>,
    pub engines: Vec<EngineInfo>,
}

pub fn summarize(violations: &[Violation], results: &[EngineResult], top_n: usize) -> OrchestrationSummary {
    let mut summary = OrchestrationSummary {
        total: violations.len(),
        ..Default::default()
    };

    let mut file_slots: FxHashMap<&str, usize> = FxHashMap::default();
    let mut file_counts: Vec<FileCount> = Vec::new();

    for v in violations {
        *summary.by_severity.entry(v.severity.as_str().to_string()).or_default() += 1;
        *summary.by_source.entry(v.source.as_str().to_string()).or_default() += 1;
        *summary.by_category.entry(v.category.as_str().to_string()).or_default() += 1;

        let slot = *file_slots.entry(v.file.as_str()).or_insert_with(|| {
            file_counts.push(FileCount {
                file: v.file.clone(),
                count: 0,
            });
            file_counts.len() - 1
        });
        file_counts[slot].count += 1;
    }

    // Stable: equal counts stay in first-encountered order.
    file_counts.sort_by(|a, b| b.count.cmp(&a.count));
    file_counts.truncate(top_n);
    summary.top_files = file_counts;

    for r in results {
        if let Some(err) = &r.error {
            summary.errors.push(EngineFailure {
                engine: r.engine_name.clone(),
                message: err.to_string(),
                error_code: err.error_code().to_string(),
            });
        }
        summary.engines.push(EngineInfo {
            name: r.engine_name.clone(),
            source: r.source.as_str().to_string(),
            success: r.success,
            violations: r.violations.len(),
            execution_ms: r.execution_ms(),
            metadata: r.metadata.clone(),
        });
    }

    summary
}
