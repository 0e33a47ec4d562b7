//! Run / cleanup command lifecycle
//!
//! Both entry points walk the same states:
//!
//! ```text
//! Created -> Initialized -> Validated -> ManagerBuilt -> Executing -> Succeeded | Failed
//! ```
//!
//! `cleanup` forces registry removal on the manager right before executing.
//! A manager is built fresh for every call and never reused.

use std::fmt;

use crate::config::OlmConfig;
use crate::error::config::validation;
use crate::error::{OlmError, Result};
use crate::manager::{ManagerFactory, OperatorManager};

use super::Operation;
use super::execution;

/// Lifecycle state of the most recent call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Created,
    Initialized,
    Validated,
    ManagerBuilt,
    Executing,
    Succeeded,
    Failed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Created => "created",
            Phase::Initialized => "initialized",
            Phase::Validated => "validated",
            Phase::ManagerBuilt => "manager built",
            Phase::Executing => "executing",
            Phase::Succeeded => "succeeded",
            Phase::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Deploys or tears down an operator bundle through OLM
pub struct OlmCommand<F> {
    config: OlmConfig,
    factory: F,
    phase: Phase,
}

impl<F: ManagerFactory> OlmCommand<F> {
    pub fn new(config: OlmConfig, factory: F) -> Self {
        Self {
            config,
            factory,
            phase: Phase::Created,
        }
    }

    pub fn config(&self) -> &OlmConfig {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Deploy the operator bundle
    pub async fn run(&mut self) -> Result<()> {
        self.execute(Operation::Run).await
    }

    /// Remove the operator bundle, including its registry
    pub async fn cleanup(&mut self) -> Result<()> {
        self.execute(Operation::Cleanup).await
    }

    async fn execute(&mut self, operation: Operation) -> Result<()> {
        self.enter(Phase::Created);

        self.config.initialize();
        self.enter(Phase::Initialized);

        if let Err(err) = self.config.validate() {
            return Err(self.fail(validation(err)));
        }
        self.enter(Phase::Validated);

        let mut manager = match self.factory.build(&self.config) {
            Ok(manager) => manager,
            Err(source) => return Err(self.fail(OlmError::ManagerInit { source })),
        };
        self.enter(Phase::ManagerBuilt);

        if operation == Operation::Cleanup {
            manager.set_force_registry(true);
        }

        self.enter(Phase::Executing);
        tracing::info!(
            version = %self.config.operator_version,
            timeout = ?self.config.timeout(),
            force_registry = manager.force_registry(),
            "starting {}",
            operation
        );

        match execution::execute(&mut manager, operation, self.config.timeout()).await {
            Ok(()) => {
                self.enter(Phase::Succeeded);
                tracing::info!("{} completed", operation);
                Ok(())
            }
            Err(source) => Err(self.fail(OlmError::Execution { operation, source })),
        }
    }

    fn enter(&mut self, phase: Phase) {
        tracing::debug!(from = %self.phase, to = %phase, "lifecycle transition");
        self.phase = phase;
    }

    fn fail(&mut self, err: OlmError) -> OlmError {
        self.enter(Phase::Failed);
        err
    }
}
