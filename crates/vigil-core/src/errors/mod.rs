//! Error handling for Vigil.
//! One error enum per subsystem, `thiserror` only, zero `anyhow`.

pub mod config_error;
pub mod crossover_error;
pub mod engine_error;
pub mod error_code;
pub mod pipeline_error;
pub mod storage_error;
pub mod validation_error;

pub use config_error::ConfigError;
pub use crossover_error::CrossoverError;
pub use engine_error::EngineError;
pub use error_code::VigilErrorCode;
pub use pipeline_error::PipelineError;
pub use storage_error::StorageError;
pub use validation_error::ValidationError;
