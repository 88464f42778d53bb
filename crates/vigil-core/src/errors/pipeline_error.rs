//! Pipeline errors: what propagates to the orchestration caller.

use super::error_code::{self, VigilErrorCode};
use super::{ConfigError, CrossoverError, EngineError, StorageError};

/// Errors that abort one orchestration cycle.
/// Aggregates subsystem errors via `From` conversions.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Crossover error: {0}")]
    Crossover(#[from] CrossoverError),

    #[error("No engines are enabled")]
    NoEngines,
}

impl VigilErrorCode for PipelineError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Engine(e) => e.error_code(),
            Self::Storage(e) => e.error_code(),
            Self::Config(e) => e.error_code(),
            Self::Crossover(e) => e.error_code(),
            Self::NoEngines => error_code::PIPELINE_ERROR,
        }
    }
}
