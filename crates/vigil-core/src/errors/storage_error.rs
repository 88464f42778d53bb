//! Storage errors.

use super::error_code::{self, VigilErrorCode};

/// Errors raised by the persistence layer. Surfaced to the caller for the
/// whole operation; chunks already committed stay committed.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("SQLite error: {message}")]
    SqliteError { message: String },

    #[error("Migration to v{version} failed: {message}")]
    MigrationFailed { version: u32, message: String },

    #[error("Storage task failed: {message}")]
    TaskFailed { message: String },
}

impl VigilErrorCode for StorageError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::MigrationFailed { .. } => error_code::MIGRATION_FAILED,
            _ => error_code::STORAGE_ERROR,
        }
    }
}
