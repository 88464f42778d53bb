//! Crossover policy failures.

use super::error_code::{self, VigilErrorCode};

/// Raised when `fail_on_crossover` is set and an error-level crossover
/// warning exists. A deliberate policy failure, not a bug.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CrossoverError {
    #[error(
        "Crossover policy failed with {count} error-level warning(s): {summary}. \
         Rules: [{}]. Files: [{}]",
        .rules.join(", "),
        .files.join(", ")
    )]
    PolicyViolation {
        count: usize,
        summary: String,
        rules: Vec<String>,
        files: Vec<String>,
    },
}

impl VigilErrorCode for CrossoverError {
    fn error_code(&self) -> &'static str {
        error_code::CROSSOVER_POLICY
    }
}
