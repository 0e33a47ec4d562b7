//! Configuration errors

use super::OlmError;

/// Creates a missing required field error
pub fn missing_field(field: &'static str) -> OlmError {
    OlmError::MissingField { field }
}

/// Creates a malformed install mode error
pub fn malformed_install_mode(input: impl Into<String>, reason: impl Into<String>) -> OlmError {
    OlmError::MalformedInstallMode {
        input: input.into(),
        reason: reason.into(),
    }
}

/// Wraps a configuration error as a validation failure
pub fn validation(source: OlmError) -> OlmError {
    OlmError::Validation {
        source: Box::new(source),
    }
}
