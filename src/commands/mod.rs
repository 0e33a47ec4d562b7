//! Command implementations for olm-run CLI

pub mod cleanup;
pub mod completions;
pub mod run;
