//! VigilErrorCode trait for structured error codes.

/// Trait giving every Vigil error enum a stable code string for the
/// display and report collaborators.
pub trait VigilErrorCode {
    /// Returns the error code string (e.g., "ENGINE_TIMEOUT").
    fn error_code(&self) -> &'static str;

    /// Returns the formatted error string: `[ERROR_CODE] message`.
    fn coded_string(&self) -> String
    where
        Self: std::fmt::Display,
    {
        format!("[{}] {}", self.error_code(), self)
    }
}

// Error code constants.
pub const ENGINE_FAILED: &str = "ENGINE_FAILED";
pub const ENGINE_TIMEOUT: &str = "ENGINE_TIMEOUT";
pub const ENGINE_OUTPUT: &str = "ENGINE_OUTPUT";
pub const CANCELLED: &str = "CANCELLED";
pub const STORAGE_ERROR: &str = "STORAGE_ERROR";
pub const MIGRATION_FAILED: &str = "MIGRATION_FAILED";
pub const CONFIG_ERROR: &str = "CONFIG_ERROR";
pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
pub const CROSSOVER_POLICY: &str = "CROSSOVER_POLICY";
pub const PIPELINE_ERROR: &str = "PIPELINE_ERROR";
