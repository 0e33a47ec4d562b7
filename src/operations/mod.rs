//! Operations module for deploying and removing operator bundles
//!
//! This module provides the high-level command lifecycle:
//! - OlmCommand: `run` and `cleanup` entry points (from lifecycle module)
//! - execute: deadline-bound invocation of the manager (from execution module)
//!
//! The operations coordinate with:
//! - Config: defaulting and validation (from config module)
//! - Manager: cluster side effects (from manager module)
//! - Context: timeout and cancellation (from context module)

pub mod execution;
pub mod lifecycle;


pub use lifecycle::OlmCommand;

use std::fmt;

/// The two entry points of the lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Run,
    Cleanup,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Run => f.write_str("run"),
            Operation::Cleanup => f.write_str("cleanup"),
        }
    }
}
