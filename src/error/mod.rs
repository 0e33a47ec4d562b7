//! Error types and handling for olm-run
//!
//! Uses `thiserror` for error definitions and `miette` for pretty diagnostics.
//!
//! This module is organized into sub-modules by error domain:
//! - [`config`]: Configuration and install mode errors
//! - [`manager`]: Errors reported by the operator manager collaborator

pub mod config;
pub mod manager;

pub use manager::ManagerError;

use miette::Diagnostic;
use thiserror::Error;

use crate::context::ContextError;
use crate::operations::Operation;

/// Main error type for olm-run operations
#[derive(Error, Diagnostic, Debug)]
pub enum OlmError {
    // Configuration errors
    #[error("{field} must be set")]
    #[diagnostic(
        code(olm_run::config::missing_field),
        help("Pass --manifests and --operator-version to select the bundle to deploy")
    )]
    MissingField { field: &'static str },

    #[error("malformed install mode '{input}': {reason}")]
    #[diagnostic(
        code(olm_run::config::malformed_install_mode),
        help("Expected format: InstallModeType[=ns1,ns2[, ...]]")
    )]
    MalformedInstallMode { input: String, reason: String },

    // Lifecycle errors
    #[error("validation error: {source}")]
    #[diagnostic(code(olm_run::lifecycle::validation))]
    Validation {
        #[source]
        source: Box<OlmError>,
    },

    #[error("error initializing operator manager: {source}")]
    #[diagnostic(
        code(olm_run::lifecycle::manager_init),
        help("Nothing was changed on the cluster")
    )]
    ManagerInit {
        #[source]
        source: ManagerError,
    },

    #[error("{operation} failed: {source}")]
    #[diagnostic(code(olm_run::lifecycle::execution))]
    Execution {
        operation: Operation,
        #[source]
        source: ManagerError,
    },
}

impl OlmError {
    /// Whether the failure was caused by the command timeout elapsing
    pub fn is_deadline_exceeded(&self) -> bool {
        match self {
            OlmError::Execution { source, .. } => {
                matches!(source, ManagerError::Context(ContextError::DeadlineExceeded))
            }
            _ => false,
        }
    }

    /// The innermost error of a validation failure, or the error itself
    pub fn root(&self) -> &OlmError {
        match self {
            OlmError::Validation { source } => source.root(),
            other => other,
        }
    }
}

/// Result type alias using miette for error handling
pub type Result<T> = miette::Result<T, OlmError>;
