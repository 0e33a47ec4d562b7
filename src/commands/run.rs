//! Run command CLI wrapper
//!
//! Turns the parsed flags into an [`OlmConfig`](crate::config::OlmConfig) and
//! delegates to the lifecycle in operations/lifecycle.rs.

use std::path::PathBuf;

use crate::cli::OlmArgs;
use crate::error::Result;
use crate::manager::KubectlFactory;
use crate::operations::OlmCommand;

/// Run run command
pub async fn run(kubeconfig: Option<PathBuf>, args: OlmArgs) -> Result<()> {
    let mut command = OlmCommand::new(args.into_config(kubeconfig), KubectlFactory);
    let result = command.run().await;
    tracing::debug!(phase = %command.phase(), "run finished");
    result?;

    let config = command.config();
    println!(
        "Deployed {} version {}",
        config.manifests_dir.display(),
        config.operator_version
    );
    Ok(())
}
