//! The analyzer adapter contract.
//!
//! Adapters implement [`AnalysisEngine::analyze`]; timeout, failure policy,
//! timing, and normalization live in [`runner::execute`] so no adapter has to
//! get them right on its own.

pub mod normalize;
pub mod runner;

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};
use vigil_core::constants;
use vigil_core::errors::EngineError;
use vigil_core::traits::CancellationToken;
use vigil_core::types::{RuleScheduleEntry, Violation, ViolationSource};

pub use runner::execute;

/// Per-invocation options handed to every adapter.
#[derive(Debug, Clone, Default)]
pub struct ExecuteOptions {
    /// Orchestration cycle this invocation belongs to.
    pub cycle: u64,
    /// Free-form `{key}` substitutions for command-backed adapters.
    pub params: BTreeMap<String, String>,
}

/// How the orchestrator treats one registered adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSettings {
    /// Lower sorts first when breaking merge ties.
    pub priority: i32,
    pub timeout: Duration,
    /// Degrade failures to an empty, unsuccessful result.
    pub allow_failure: bool,
    pub enabled: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            priority: constants::DEFAULT_ENGINE_PRIORITY,
            timeout: Duration::from_millis(constants::DEFAULT_ENGINE_TIMEOUT_MS),
            allow_failure: true,
            enabled: true,
        }
    }
}

/// One per-rule check performed by a rotating adapter during a cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleCheck {
    pub rule_id: String,
    pub engine: String,
    pub cycle: u64,
    pub violations_found: usize,
    pub execution_time_ms: u64,
    /// Picked only because no rule was eligible.
    pub forced: bool,
}

/// Per-adapter execution record for one cycle. Never persisted.
#[derive(Debug, Clone)]
pub struct EngineResult {
    pub engine_name: String,
    pub source: ViolationSource,
    pub violations: Vec<Violation>,
    pub execution_time: Duration,
    pub success: bool,
    pub error: Option<EngineError>,
    pub metadata: Map<String, Value>,
    pub rule_check: Option<RuleCheck>,
}

impl EngineResult {
    /// The zero-violation result of a recoverable failure.
    pub fn failed(
        engine_name: impl Into<String>,
        source: ViolationSource,
        execution_time: Duration,
        error: EngineError,
    ) -> Self {
        Self {
            engine_name: engine_name.into(),
            source,
            violations: Vec::new(),
            execution_time,
            success: false,
            error: Some(error),
            metadata: Map::new(),
            rule_check: None,
        }
    }

    pub fn execution_ms(&self) -> u64 {
        self.execution_time.as_millis() as u64
    }
}

/// A wrapper around one external analysis tool.
///
/// `analyze` receives a token scoped to this invocation alone; long-running
/// adapters should stop when it fires. Adapters never set `source` on their
/// violations, the wrapper does.
#[async_trait]
pub trait AnalysisEngine: Send + Sync {
    fn name(&self) -> &str;

    fn source(&self) -> ViolationSource;

    async fn analyze(
        &self,
        target: &Path,
        options: &ExecuteOptions,
        cancel: &CancellationToken,
    ) -> Result<Vec<Violation>, EngineError>;

    /// Extra metadata for the last successful `analyze`.
    fn metadata(&self) -> Map<String, Value> {
        Map::new()
    }

    /// The per-rule check made by the last `analyze`, if this adapter rotates.
    fn take_rule_check(&self) -> Option<RuleCheck> {
        None
    }

    /// Scheduler state to persist after a cycle.
    fn schedule_snapshot(&self) -> Vec<RuleScheduleEntry> {
        Vec::new()
    }

    /// Restore scheduler state loaded from storage.
    fn restore_schedule(&self, _entries: &[RuleScheduleEntry]) {}
}
