//! Orchestrator configuration.

use serde::{Deserialize, Serialize};

use crate::constants;
use crate::types::DedupStrategy;

/// Configuration for merge, dedup, and summaries.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Deduplication strategy. Default: exact.
    pub dedup_strategy: Option<DedupStrategy>,
    /// Files listed in the top-N summary. Default: 10.
    pub top_files: Option<usize>,
    /// Timeout applied to engines that do not set their own. Default: 120s.
    pub default_timeout_ms: Option<u64>,
}

impl OrchestratorConfig {
    pub fn effective_dedup_strategy(&self) -> DedupStrategy {
        self.dedup_strategy.unwrap_or_default()
    }

    pub fn effective_top_files(&self) -> usize {
        self.top_files.unwrap_or(constants::DEFAULT_TOP_FILES)
    }

    pub fn effective_default_timeout_ms(&self) -> u64 {
        self.default_timeout_ms
            .unwrap_or(constants::DEFAULT_ENGINE_TIMEOUT_MS)
    }
}
