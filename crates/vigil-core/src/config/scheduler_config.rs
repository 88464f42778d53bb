//! Adaptive rule scheduler configuration.

use serde::{Deserialize, Serialize};

use crate::constants;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Zero-violation streak at which a rule backs off. Default: 5.
    pub zero_threshold: Option<u32>,
    /// Cycles between re-checks of a backed-off rule. Default: 5.
    pub reduced_interval: Option<u64>,
}

impl SchedulerConfig {
    pub fn effective_zero_threshold(&self) -> u32 {
        self.zero_threshold
            .unwrap_or(constants::DEFAULT_ZERO_THRESHOLD)
    }

    pub fn effective_reduced_interval(&self) -> u64 {
        self.reduced_interval
            .unwrap_or(constants::DEFAULT_REDUCED_INTERVAL)
    }
}
