//! Per-record validation applied before a violation reaches storage.

use vigil_core::constants::{MAX_MESSAGE_LEN, MAX_PATH_LEN};
use vigil_core::errors::ValidationError;
use vigil_core::types::Violation;

/// Check one record. Rejected records are reported, never stored.
pub fn validate_violation(v: &Violation) -> Result<(), ValidationError> {
    if v.file.trim().is_empty() {
        return Err(ValidationError::MissingFile);
    }
    if v.file.len() > MAX_PATH_LEN {
        return Err(ValidationError::FileTooLong {
            len: v.file.len(),
            max: MAX_PATH_LEN,
        });
    }
    if v.code.len() > MAX_MESSAGE_LEN {
        return Err(ValidationError::Oversized {
            field: "code",
            len: v.code.len(),
            max: MAX_MESSAGE_LEN,
        });
    }
    let message = v.message.as_deref().unwrap_or("");
    if message.len() > MAX_MESSAGE_LEN {
        return Err(ValidationError::Oversized {
            field: "message",
            len: message.len(),
            max: MAX_MESSAGE_LEN,
        });
    }
    if v.code.trim().is_empty() && message.trim().is_empty() {
        return Err(ValidationError::EmptyContent);
    }
    Ok(())
}
