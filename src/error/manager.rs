//! Operator manager errors
//!
//! Failures reported by the collaborator that talks to the cluster. The
//! lifecycle wraps these into [`super::OlmError::ManagerInit`] or
//! [`super::OlmError::Execution`] depending on the phase they came from.

use std::path::Path;

use thiserror::Error;

use super::OlmError;
use crate::context::ContextError;

#[derive(Error, Debug)]
pub enum ManagerError {
    #[error(transparent)]
    Context(#[from] ContextError),

    #[error("invalid configuration: {0}")]
    Config(#[source] Box<OlmError>),

    #[error("invalid bundle at {path}: {reason}")]
    Bundle { path: String, reason: String },

    #[error("failed to load manifest {path}: {reason}")]
    Manifest { path: String, reason: String },

    #[error("failed to render {kind}: {reason}")]
    Render { kind: String, reason: String },

    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("kubectl {args} exited with {status}: {stderr}")]
    Kubectl {
        args: String,
        status: String,
        stderr: String,
    },
}

/// Creates an invalid bundle error
pub fn bundle(path: &Path, reason: impl Into<String>) -> ManagerError {
    ManagerError::Bundle {
        path: path.display().to_string(),
        reason: reason.into(),
    }
}

/// Creates a manifest load error
pub fn manifest(path: &Path, reason: impl std::fmt::Display) -> ManagerError {
    ManagerError::Manifest {
        path: path.display().to_string(),
        reason: reason.to_string(),
    }
}

/// Creates a render error for a resource kind
pub fn render(kind: impl Into<String>, reason: impl std::fmt::Display) -> ManagerError {
    ManagerError::Render {
        kind: kind.into(),
        reason: reason.to_string(),
    }
}

impl From<OlmError> for ManagerError {
    fn from(err: OlmError) -> Self {
        ManagerError::Config(Box::new(err))
    }
}
