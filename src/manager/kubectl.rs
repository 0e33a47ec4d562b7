//! kubectl-backed operator manager
//!
//! Drives an existing OLM installation by applying and deleting resources
//! with the kubectl binary. Every invocation is killed as soon as the
//! execution context is done.

use std::io::ErrorKind;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use super::resources::{CATALOG_SOURCE_LABEL, ResourcePlan};
use super::{ManagerFactory, OperatorManager};
use crate::bundle::{Bundle, Manifest, manifest};
use crate::config::{InstallModeSpec, OlmConfig};
use crate::context::{ContextError, ExecutionContext};
use crate::error::ManagerError;

/// Interval between CSV status checks
const POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Builds a [`KubectlManager`] per command invocation
#[derive(Debug, Default, Clone, Copy)]
pub struct KubectlFactory;

impl ManagerFactory for KubectlFactory {
    type Manager = KubectlManager;

    fn build(&self, config: &OlmConfig) -> Result<KubectlManager, ManagerError> {
        let bundle = Bundle::load(&config.manifests_dir, &config.operator_version)?;
        tracing::debug!(
            bundle = %bundle.dir.display(),
            crds = bundle.crds.len(),
            "building kubectl manager"
        );
        let includes = manifest::load_all(&config.include_paths)?;
        let install_mode = config
            .install_mode_spec()?
            .unwrap_or_else(InstallModeSpec::own_namespace);
        if install_mode.known_type().is_none() {
            tracing::warn!(
                "install mode type {} is not defined by OLM; the CSV decides whether it is supported",
                install_mode.mode_type
            );
        }

        Ok(KubectlManager {
            kubectl: Kubectl {
                program: config.kubectl.clone(),
                kubeconfig: config.kubeconfig_path.clone(),
            },
            bundle,
            includes,
            install_mode,
            operator_namespace: config.operator_namespace.clone(),
            olm_namespace: config.olm_namespace.clone(),
            force_registry: config.force_registry,
        })
    }
}

/// Deploys one bundle through OLM with kubectl
#[derive(Debug)]
pub struct KubectlManager {
    kubectl: Kubectl,
    bundle: Bundle,
    includes: Vec<Manifest>,
    install_mode: InstallModeSpec,
    operator_namespace: String,
    olm_namespace: String,
    force_registry: bool,
}

impl OperatorManager for KubectlManager {
    fn force_registry(&self) -> bool {
        self.force_registry
    }

    fn set_force_registry(&mut self, force: bool) {
        self.force_registry = force;
    }

    async fn run(&mut self, ctx: &ExecutionContext) -> Result<(), ManagerError> {
        let plan = self.plan(ctx).await?;
        self.check_olm(ctx).await?;

        match self.install(ctx, &plan).await {
            Ok(()) => {
                tracing::info!(csv = %plan.csv_name, namespace = %plan.namespace, "operator installed");
                Ok(())
            }
            Err(err) => {
                if ctx.err().is_some() {
                    tracing::warn!(
                        "timed out installing {}; resources left in place, run cleanup to remove them",
                        plan.csv_name
                    );
                } else if let Err(teardown) = self.teardown(ctx, &plan).await {
                    tracing::warn!(error = %teardown, "failed to remove partially installed resources");
                }
                Err(err)
            }
        }
    }

    async fn cleanup(&mut self, ctx: &ExecutionContext) -> Result<(), ManagerError> {
        let plan = self.plan(ctx).await?;
        self.teardown(ctx, &plan).await?;
        tracing::info!(csv = %plan.csv_name, namespace = %plan.namespace, "operator removed");
        Ok(())
    }
}

impl KubectlManager {
    async fn plan(&self, ctx: &ExecutionContext) -> Result<ResourcePlan, ManagerError> {
        let namespace = if self.operator_namespace.is_empty() {
            self.kubectl.default_namespace(ctx).await?
        } else {
            self.operator_namespace.clone()
        };
        ResourcePlan::render(&self.bundle, &self.install_mode, &namespace, &self.includes)
    }

    /// Fail early when OLM is not installed where we expect it
    async fn check_olm(&self, ctx: &ExecutionContext) -> Result<(), ManagerError> {
        self.kubectl
            .exec(
                ctx,
                &args(["get", "namespace", self.olm_namespace.as_str(), "-o", "name"]),
                None,
            )
            .await
            .map(|_| ())
    }

    async fn install(&self, ctx: &ExecutionContext, plan: &ResourcePlan) -> Result<(), ManagerError> {
        let stream = manifest::to_yaml_stream(plan.apply_order())?;
        tracing::debug!(namespace = %plan.namespace, "applying OLM resources");
        self.kubectl
            .exec(ctx, &args(["apply", "-f", "-"]), Some(stream))
            .await?;
        self.wait_for_csv(ctx, plan).await
    }

    async fn wait_for_csv(&self, ctx: &ExecutionContext, plan: &ResourcePlan) -> Result<(), ManagerError> {
        let get = args([
            "get",
            "clusterserviceversions.operators.coreos.com",
            plan.csv_name.as_str(),
            "-n",
            plan.namespace.as_str(),
            "-o",
            "json",
            "--ignore-not-found",
        ]);

        loop {
            let output = self.kubectl.exec(ctx, &get, None).await?;
            match csv_phase(&output) {
                Some((phase, _)) if phase == "Succeeded" => return Ok(()),
                Some((phase, message)) if phase == "Failed" => {
                    return Err(ManagerError::Kubectl {
                        args: get.join(" "),
                        status: format!("CSV {} failed", plan.csv_name),
                        stderr: message,
                    });
                }
                phase => {
                    tracing::debug!(
                        csv = %plan.csv_name,
                        ?phase,
                        remaining = ?ctx.remaining(),
                        "waiting for CSV"
                    );
                }
            }

            tokio::select! {
                () = tokio::time::sleep(POLL_INTERVAL) => {}
                () = ctx.done() => {
                    return Err(ctx.err().unwrap_or(ContextError::Canceled).into());
                }
            }
        }
    }

    async fn teardown(&self, ctx: &ExecutionContext, plan: &ResourcePlan) -> Result<(), ManagerError> {
        let stream = manifest::to_yaml_stream(plan.delete_order())?;
        self.kubectl
            .exec(ctx, &args(["delete", "--ignore-not-found", "-f", "-"]), Some(stream))
            .await?;

        self.kubectl
            .exec(
                ctx,
                &args([
                    "delete",
                    "clusterserviceversions.operators.coreos.com",
                    plan.csv_name.as_str(),
                    "-n",
                    plan.namespace.as_str(),
                    "--ignore-not-found",
                ]),
                None,
            )
            .await?;

        if self.force_registry {
            self.delete_registry(ctx, plan).await?;
        }
        Ok(())
    }

    async fn delete_registry(&self, ctx: &ExecutionContext, plan: &ResourcePlan) -> Result<(), ManagerError> {
        tracing::debug!(catalog = %plan.catalog_name, "removing registry");
        let stream = manifest::to_yaml_stream([&plan.registry])?;
        self.kubectl
            .exec(ctx, &args(["delete", "--ignore-not-found", "-f", "-"]), Some(stream))
            .await?;

        let selector = format!("{}={}", CATALOG_SOURCE_LABEL, plan.catalog_name);
        self.kubectl
            .exec(
                ctx,
                &args([
                    "delete",
                    "pods",
                    "-l",
                    selector.as_str(),
                    "-n",
                    plan.namespace.as_str(),
                    "--ignore-not-found",
                ]),
                None,
            )
            .await
            .map(|_| ())
    }
}

fn args<const N: usize>(parts: [&str; N]) -> Vec<String> {
    parts.iter().map(|s| (*s).to_string()).collect()
}

/// `status.phase` and `status.message` of a CSV printed as JSON
fn csv_phase(output: &str) -> Option<(String, String)> {
    if output.trim().is_empty() {
        return None;
    }
    let value: serde_json::Value = serde_json::from_str(output).ok()?;
    let status = value.get("status")?;
    let phase = status.get("phase")?.as_str()?.to_string();
    let message = status
        .get("message")
        .and_then(serde_json::Value::as_str)
        .unwrap_or_default()
        .to_string();
    Some((phase, message))
}

#[derive(Debug, Clone)]
struct Kubectl {
    program: PathBuf,
    kubeconfig: Option<PathBuf>,
}

impl Kubectl {
    /// Namespace of the current kubeconfig context, `default` if unset
    async fn default_namespace(&self, ctx: &ExecutionContext) -> Result<String, ManagerError> {
        let output = self
            .exec(
                ctx,
                &args(["config", "view", "--minify", "-o", "jsonpath={..namespace}"]),
                None,
            )
            .await?;
        let namespace = output.trim();
        Ok(if namespace.is_empty() {
            "default".to_string()
        } else {
            namespace.to_string()
        })
    }

    /// Run kubectl with `args`, feeding `stdin`, and return its stdout
    async fn exec(
        &self,
        ctx: &ExecutionContext,
        args: &[String],
        stdin: Option<String>,
    ) -> Result<String, ManagerError> {
        if let Some(err) = ctx.err() {
            return Err(err.into());
        }

        let mut command = Command::new(&self.program);
        if let Some(kubeconfig) = &self.kubeconfig {
            command.arg("--kubeconfig").arg(kubeconfig);
        }
        command
            .args(args)
            .stdin(if stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        tracing::debug!(program = %self.program.display(), args = %args.join(" "), "exec");
        let mut child = command.spawn().map_err(|source| ManagerError::Spawn {
            program: self.program.display().to_string(),
            source,
        })?;

        let input = child.stdin.take();
        let write = async move {
            if let (Some(mut pipe), Some(data)) = (input, stdin) {
                match pipe.write_all(data.as_bytes()).await {
                    // kubectl exited without reading; its status tells why
                    Err(e) if e.kind() == ErrorKind::BrokenPipe => {
                        tracing::debug!("kubectl closed stdin early");
                    }
                    other => other?,
                }
            }
            Ok::<(), std::io::Error>(())
        };

        let spawn_error = |source| ManagerError::Spawn {
            program: self.program.display().to_string(),
            source,
        };

        let output = tokio::select! {
            result = async { tokio::try_join!(write, child.wait_with_output()) } => {
                result.map_err(spawn_error)?.1
            }
            () = ctx.done() => {
                return Err(ctx.err().unwrap_or(ContextError::Canceled).into());
            }
        };

        if !output.status.success() {
            return Err(ManagerError::Kubectl {
                args: args.join(" "),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
