//! Cleanup command CLI wrapper

use std::path::PathBuf;

use crate::cli::OlmArgs;
use crate::error::Result;
use crate::manager::KubectlFactory;
use crate::operations::OlmCommand;

/// Run cleanup command
///
/// The catalog registry is always removed along with the operator.
pub async fn run(kubeconfig: Option<PathBuf>, args: OlmArgs) -> Result<()> {
    let mut command = OlmCommand::new(args.into_config(kubeconfig), KubectlFactory);
    let result = command.cleanup().await;
    tracing::debug!(phase = %command.phase(), "cleanup finished");
    result?;

    println!(
        "Removed {} version {}",
        command.config().manifests_dir.display(),
        command.config().operator_version
    );
    Ok(())
}
