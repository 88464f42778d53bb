//! Per-engine configuration: one `[engines.<name>]` table each.

use serde::{Deserialize, Serialize};

use crate::constants;
use crate::types::ViolationSource;

/// How to run one external analyzer.
///
/// `args` may contain `{target}` and, for rotating engines, `{rule}`.
/// A non-empty `rules` list makes the engine rotate through rules with the
/// adaptive scheduler instead of running exhaustively.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct EngineConfig {
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    pub source: Option<ViolationSource>,
    /// Lower runs first for merge tie-breaking. Default: 100.
    pub priority: Option<i32>,
    pub timeout_ms: Option<u64>,
    /// Degrade to zero violations on failure instead of aborting. Default: true.
    pub allow_failure: Option<bool>,
    pub enabled: Option<bool>,
    #[serde(default)]
    pub rules: Vec<String>,
    /// Exit codes treated as success; linters exit non-zero when they find
    /// something. Default: `[0, 1]`.
    #[serde(default)]
    pub success_exit_codes: Vec<i32>,
    pub working_dir: Option<String>,
}

impl EngineConfig {
    pub fn effective_source(&self) -> ViolationSource {
        self.source.unwrap_or(ViolationSource::Custom)
    }

    pub fn effective_priority(&self) -> i32 {
        self.priority.unwrap_or(constants::DEFAULT_ENGINE_PRIORITY)
    }

    pub fn effective_allow_failure(&self) -> bool {
        self.allow_failure.unwrap_or(true)
    }

    pub fn effective_enabled(&self) -> bool {
        self.enabled.unwrap_or(true)
    }

    pub fn effective_success_exit_codes(&self) -> Vec<i32> {
        if self.success_exit_codes.is_empty() {
            vec![0, 1]
        } else {
            self.success_exit_codes.clone()
        }
    }

    pub fn is_rotating(&self) -> bool {
        !self.rules.is_empty()
    }
}
