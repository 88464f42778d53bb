//! Crossover detector configuration.

use serde::{Deserialize, Serialize};

use crate::constants;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CrossoverConfig {
    /// Run the crossover detector. Default: true.
    pub enabled: Option<bool>,
    /// Turn any error-level crossover warning into a cycle failure. Default: false.
    pub fail_on_crossover: Option<bool>,
    /// Lint engine wall-clock threshold for the performance check. Default: 30s.
    pub slow_engine_threshold_ms: Option<u64>,
    /// Additional rule ids known to need full type information.
    #[serde(default)]
    pub extra_type_aware_rules: Vec<String>,
    /// Engine names watched by the performance check, in addition to every
    /// engine whose source is the lint analyzer.
    #[serde(default)]
    pub watched_engines: Vec<String>,
}

impl CrossoverConfig {
    pub fn effective_enabled(&self) -> bool {
        self.enabled.unwrap_or(true)
    }

    pub fn effective_fail_on_crossover(&self) -> bool {
        self.fail_on_crossover.unwrap_or(false)
    }

    pub fn effective_slow_engine_threshold_ms(&self) -> u64 {
        self.slow_engine_threshold_ms
            .unwrap_or(constants::DEFAULT_SLOW_ENGINE_THRESHOLD_MS)
    }
}
