//! Analyzer adapter execution errors.

use super::error_code::{self, VigilErrorCode};

/// Errors raised while executing one analyzer adapter.
#[derive(Debug, Clone, thiserror::Error)]
pub enum EngineError {
    #[error("Engine {engine} timed out after {timeout_ms}ms")]
    Timeout { engine: String, timeout_ms: u64 },

    #[error("Engine {engine} was cancelled")]
    Cancelled { engine: String },

    #[error("Engine {engine} failed to start: {message}")]
    SpawnFailed { engine: String, message: String },

    #[error("Engine {engine} exited with status {status}: {stderr}")]
    ProcessFailed {
        engine: String,
        status: i32,
        stderr: String,
    },

    #[error("Engine {engine} produced unparseable output: {message}")]
    InvalidOutput { engine: String, message: String },

    #[error("Engine {engine} panicked: {message}")]
    Panicked { engine: String, message: String },

    #[error("Engine {engine} failed: {message}")]
    Failed { engine: String, message: String },
}

impl EngineError {
    /// Name of the engine this error belongs to.
    pub fn engine(&self) -> &str {
        match self {
            Self::Timeout { engine, .. }
            | Self::Cancelled { engine }
            | Self::SpawnFailed { engine, .. }
            | Self::ProcessFailed { engine, .. }
            | Self::InvalidOutput { engine, .. }
            | Self::Panicked { engine, .. }
            | Self::Failed { engine, .. } => engine,
        }
    }

    pub fn failed(engine: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Failed {
            engine: engine.into(),
            message: message.into(),
        }
    }
}

impl VigilErrorCode for EngineError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Timeout { .. } => error_code::ENGINE_TIMEOUT,
            Self::Cancelled { .. } => error_code::CANCELLED,
            Self::InvalidOutput { .. } => error_code::ENGINE_OUTPUT,
            _ => error_code::ENGINE_FAILED,
        }
    }
}
