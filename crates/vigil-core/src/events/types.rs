//! Event payload types emitted over one orchestration cycle.

use std::path::PathBuf;

/// Payload for `on_cycle_started`.
#[derive(Debug, Clone)]
pub struct CycleStartedEvent {
    pub cycle: u64,
    pub target: PathBuf,
    pub engine_count: usize,
}

/// Payload for `on_cycle_completed`.
#[derive(Debug, Clone)]
pub struct CycleCompletedEvent {
    pub cycle: u64,
    pub check_id: i64,
    pub total_violations: usize,
    pub crossover_warnings: usize,
    pub engine_errors: usize,
    pub duration_ms: u64,
}

/// Payload for `on_cycle_failed`.
#[derive(Debug, Clone)]
pub struct CycleFailedEvent {
    pub cycle: u64,
    pub message: String,
    pub error_code: String,
}

/// Payload for `on_engine_completed`.
#[derive(Debug, Clone)]
pub struct EngineCompletedEvent {
    pub engine: String,
    pub violations: usize,
    pub duration_ms: u64,
}

/// Payload for `on_engine_failed`.
#[derive(Debug, Clone)]
pub struct EngineFailedEvent {
    pub engine: String,
    pub message: String,
    pub recoverable: bool,
}

/// Payload for `on_crossover_detected`.
#[derive(Debug, Clone)]
pub struct CrossoverDetectedEvent {
    pub warning_type: String,
    pub severity: String,
    pub message: String,
}

/// Payload for `on_violations_persisted`.
#[derive(Debug, Clone)]
pub struct ViolationsPersistedEvent {
    pub check_id: i64,
    pub inserted: usize,
    pub updated: usize,
    pub rejected: usize,
    pub added: usize,
    pub removed: usize,
    pub unchanged: usize,
}

/// Payload for `on_error`.
#[derive(Debug, Clone)]
pub struct ErrorEvent {
    pub message: String,
    pub error_code: String,
}
