//! Watch mode configuration.

use serde::{Deserialize, Serialize};

use crate::constants;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct WatchConfig {
    /// Interval between cycles. Default: 5000ms.
    pub interval_ms: Option<u64>,
    /// Debounce window for triggered cycles. Default: 500ms.
    pub debounce_ms: Option<u64>,
}

impl WatchConfig {
    pub fn effective_interval_ms(&self) -> u64 {
        self.interval_ms
            .unwrap_or(constants::DEFAULT_WATCH_INTERVAL_MS)
    }

    pub fn effective_debounce_ms(&self) -> u64 {
        self.debounce_ms
            .unwrap_or(constants::DEFAULT_WATCH_DEBOUNCE_MS)
    }
}
