//! Operator manager capability
//!
//! The lifecycle never talks to the cluster itself. It builds an
//! [`OperatorManager`] through a [`ManagerFactory`] and calls exactly one of
//! `run` or `cleanup` on it under an [`ExecutionContext`].
//!
//! - [`kubectl`]: manager that drives OLM through the kubectl binary
//! - [`resources`]: OLM resources rendered for a bundle

pub mod kubectl;
pub mod resources;

pub use kubectl::KubectlFactory;

use crate::config::OlmConfig;
use crate::context::ExecutionContext;
use crate::error::ManagerError;

/// Applies and removes an operator bundle on a cluster
pub trait OperatorManager {
    /// Whether `cleanup` also removes the catalog registry
    fn force_registry(&self) -> bool;

    fn set_force_registry(&mut self, force: bool);

    /// Deploy the operator. Must return promptly once `ctx` is done.
    async fn run(&mut self, ctx: &ExecutionContext) -> Result<(), ManagerError>;

    /// Remove the operator. Must return promptly once `ctx` is done.
    async fn cleanup(&mut self, ctx: &ExecutionContext) -> Result<(), ManagerError>;
}

/// Builds a fresh manager from validated configuration
pub trait ManagerFactory {
    type Manager: OperatorManager;

    fn build(&self, config: &OlmConfig) -> Result<Self::Manager, ManagerError>;
}
