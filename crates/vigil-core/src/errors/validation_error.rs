//! Per-record validation failures for violations entering storage.

use super::error_code::{self, VigilErrorCode};

/// Why a single violation record was rejected. Collected, never thrown.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("file path is empty")]
    MissingFile,

    #[error("file path is {len} bytes (max {max})")]
    FileTooLong { len: usize, max: usize },

    #[error("{field} is {len} bytes (max {max})")]
    Oversized {
        field: &'static str,
        len: usize,
        max: usize,
    },

    #[error("violation has neither code nor message")]
    EmptyContent,
}

impl VigilErrorCode for ValidationError {
    fn error_code(&self) -> &'static str {
        error_code::VALIDATION_ERROR
    }
}
