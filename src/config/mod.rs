//! Command configuration
//!
//! [`OlmConfig`] holds everything a user supplies for `run` and `cleanup`.
//! It is defaulted once by [`OlmConfig::initialize`] and validated by
//! [`OlmConfig::validate`] before any manager is constructed.

pub mod install_mode;

pub use install_mode::InstallModeSpec;

use std::path::PathBuf;
use std::sync::OnceLock;
use std::time::Duration;

use crate::error::OlmError;
use crate::error::config::missing_field;

/// How long a command may run when no timeout is configured
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2 * 60);

/// Namespace OLM itself is installed into by default
pub const DEFAULT_OLM_NAMESPACE: &str = "olm";

/// kubectl binary used when none is configured
pub const DEFAULT_KUBECTL: &str = "kubectl";

/// Deployment and teardown settings for an operator bundle
#[derive(Debug)]
pub struct OlmConfig {
    /// Directory containing 1..N bundle directories and package metadata
    pub manifests_dir: PathBuf,
    /// Version of the operator bundle to deploy, ex. 0.0.1
    pub operator_version: String,
    /// Manifests that supplement or override generated resources.
    ///
    /// CatalogSource, Subscription and OperatorGroup kinds replace the
    /// generated ones.
    pub include_paths: Vec<PathBuf>,
    /// `InstallModeType[=ns1,ns2[, ...]]`; empty selects OwnNamespace
    pub install_mode: String,
    /// Local kubeconfig; kubectl loading rules apply when unset
    pub kubeconfig_path: Option<PathBuf>,
    /// Namespace in which operator resources are created
    pub operator_namespace: String,
    /// Namespace in which OLM is installed
    pub olm_namespace: String,
    /// Configured timeout; zero means unset
    pub timeout: Duration,
    /// Delete registry resources as well
    pub force_registry: bool,
    /// kubectl binary used by the cluster manager
    pub kubectl: PathBuf,

    effective_timeout: OnceLock<Duration>,
}

impl OlmConfig {
    pub fn new(manifests_dir: impl Into<PathBuf>, operator_version: impl Into<String>) -> Self {
        Self {
            manifests_dir: manifests_dir.into(),
            operator_version: operator_version.into(),
            include_paths: Vec::new(),
            install_mode: String::new(),
            kubeconfig_path: None,
            operator_namespace: String::new(),
            olm_namespace: DEFAULT_OLM_NAMESPACE.to_string(),
            timeout: Duration::ZERO,
            force_registry: false,
            kubectl: PathBuf::from(DEFAULT_KUBECTL),
            effective_timeout: OnceLock::new(),
        }
    }

    /// Apply defaults exactly once
    ///
    /// Safe to call from several threads sharing one config: the defaulting
    /// runs once and every caller returns after it has completed.
    pub fn initialize(&self) {
        self.effective_timeout.get_or_init(|| {
            if self.timeout.is_zero() {
                tracing::debug!(timeout = ?DEFAULT_TIMEOUT, "using default timeout");
                DEFAULT_TIMEOUT
            } else {
                self.timeout
            }
        });
    }

    #[cfg(test)]
    pub fn is_initialized(&self) -> bool {
        self.effective_timeout.get().is_some()
    }

    /// Timeout in effect for the command
    ///
    /// Falls back to the configured value until [`Self::initialize`] runs.
    pub fn timeout(&self) -> Duration {
        self.effective_timeout
            .get()
            .copied()
            .unwrap_or(self.timeout)
    }

    /// Check required fields and the install mode grammar
    ///
    /// Purely structural; neither the filesystem nor the cluster is touched.
    pub fn validate(&self) -> Result<(), OlmError> {
        if self.manifests_dir.as_os_str().is_empty() {
            return Err(missing_field("manifests dir"));
        }
        if self.operator_version.trim().is_empty() {
            return Err(missing_field("operator version"));
        }
        self.install_mode_spec()?;
        Ok(())
    }

    /// The parsed install mode, `None` when the default mode applies
    pub fn install_mode_spec(&self) -> Result<Option<InstallModeSpec>, OlmError> {
        if self.install_mode.is_empty() {
            return Ok(None);
        }
        InstallModeSpec::parse(&self.install_mode).map(Some)
    }
}

impl Default for OlmConfig {
    fn default() -> Self {
        Self::new(PathBuf::new(), String::new())
    }
}
