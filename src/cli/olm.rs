use clap::Args;
use std::path::PathBuf;
use std::time::Duration;

use crate::config::{DEFAULT_KUBECTL, DEFAULT_OLM_NAMESPACE, OlmConfig};
use crate::context::MAX_TIMEOUT;

/// Arguments shared by the run and cleanup commands
#[derive(Args, Debug, Clone)]
#[command(after_help = "EXAMPLES:\n  \
                   Deploy a bundle version:\n    olm-run run --manifests ./bundle --operator-version 0.0.1\n\n\
                   Deploy watching two namespaces:\n    olm-run run --manifests ./bundle --operator-version 0.0.1 \\\n      \
                   --install-mode MultiNamespace=ns1,ns2\n\n\
                   Supply extra resources:\n    olm-run run --manifests ./bundle --operator-version 0.0.1 --include ns.yaml,rbac.yaml\n\n\
                   Tear down:\n    olm-run cleanup --manifests ./bundle --operator-version 0.0.1")]
pub struct OlmArgs {
    /// [olm only] The namespace where OLM is installed
    #[arg(long, value_name = "NAMESPACE", default_value = DEFAULT_OLM_NAMESPACE)]
    pub olm_namespace: String,

    /// [olm only] The namespace where operator resources are created. It must already exist
    /// in the cluster or be defined in a manifest passed to --include
    #[arg(long, value_name = "NAMESPACE", default_value = "")]
    pub operator_namespace: String,

    /// [olm only] Directory containing operator bundle directories and metadata
    #[arg(long, value_name = "DIR")]
    pub manifests: Option<PathBuf>,

    /// [olm only] Version of operator to deploy
    #[arg(long, value_name = "VERSION", default_value = "")]
    pub operator_version: String,

    /// [olm only] InstallMode to create OperatorGroup with. Format: InstallModeType[=ns1,ns2[, ...]]
    #[arg(long, value_name = "MODE", default_value = "")]
    pub install_mode: String,

    /// [olm only] Path to Kubernetes resource manifests, ex. Role, Subscription.
    /// These supplement or override defaults generated by run/cleanup
    #[arg(long, value_name = "PATH", value_delimiter = ',')]
    pub include: Vec<PathBuf>,

    /// [olm only] Time to wait for the command to complete before failing
    #[arg(long, value_name = "DURATION", default_value = "2m", value_parser = parse_timeout)]
    pub timeout: Duration,

    /// kubectl binary used to talk to the cluster
    #[arg(long, value_name = "PATH", env = "OLM_RUN_KUBECTL", default_value = DEFAULT_KUBECTL)]
    pub kubectl: PathBuf,
}

fn parse_timeout(raw: &str) -> Result<Duration, String> {
    let timeout = humantime::parse_duration(raw.trim()).map_err(|e| e.to_string())?;
    if timeout > MAX_TIMEOUT {
        return Err(format!(
            "must be at most {}",
            humantime::format_duration(MAX_TIMEOUT)
        ));
    }
    Ok(timeout)
}

impl OlmArgs {
    /// Build the command configuration from parsed flags
    pub fn into_config(self, kubeconfig: Option<PathBuf>) -> OlmConfig {
        let mut config = OlmConfig::new(self.manifests.unwrap_or_default(), self.operator_version);
        config.include_paths = self.include;
        config.install_mode = self.install_mode;
        config.kubeconfig_path = kubeconfig;
        config.operator_namespace = self.operator_namespace;
        config.olm_namespace = self.olm_namespace;
        config.timeout = self.timeout;
        config.kubectl = self.kubectl;
        config
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::super::{Cli, Commands};
    use super::*;
    use clap::Parser;
    use serial_test::serial;

    fn parse_run(extra: &[&str]) -> OlmArgs {
        let mut argv = vec!["olm-run", "run"];
        argv.extend_from_slice(extra);
        let cli = Cli::try_parse_from(argv).unwrap_or_else(|e| {
            panic!("Failed to parse CLI arguments: {}", e);
        });
        match cli.command {
            Commands::Run(args) => args,
            _ => panic!("Expected Run command"),
        }
    }

    #[test]
    #[serial]
    fn test_defaults() {
        let args = parse_run(&[]);
        assert_eq!(args.olm_namespace, DEFAULT_OLM_NAMESPACE);
        assert_eq!(args.operator_namespace, "");
        assert_eq!(args.manifests, None);
        assert_eq!(args.operator_version, "");
        assert_eq!(args.install_mode, "");
        assert!(args.include.is_empty());
        assert_eq!(args.timeout, Duration::from_secs(120));
    }

    #[test]
    #[serial]
    fn test_kubectl_from_environment() {
        // SAFETY: serialized with every other test that reads OLM_RUN_KUBECTL
        unsafe { std::env::set_var("OLM_RUN_KUBECTL", "/opt/bin/kubectl") };
        let args = parse_run(&[]);
        unsafe { std::env::remove_var("OLM_RUN_KUBECTL") };
        assert_eq!(args.kubectl, PathBuf::from("/opt/bin/kubectl"));

        let args = parse_run(&["--kubectl", "oc"]);
        assert_eq!(args.kubectl, PathBuf::from("oc"));
    }

    #[test]
    #[serial]
    fn test_all_flags() {
        let args = parse_run(&[
            "--olm-namespace",
            "openshift-operator-lifecycle-manager",
            "--operator-namespace",
            "memcached",
            "--manifests",
            "deploy/olm-catalog/memcached-operator",
            "--operator-version",
            "0.0.3",
            "--install-mode",
            "SingleNamespace=watched",
            "--timeout",
            "90s",
            "--kubectl",
            "/usr/local/bin/kubectl",
        ]);
        assert_eq!(args.olm_namespace, "openshift-operator-lifecycle-manager");
        assert_eq!(args.operator_namespace, "memcached");
        assert_eq!(args.operator_version, "0.0.3");
        assert_eq!(args.install_mode, "SingleNamespace=watched");
        assert_eq!(args.timeout, Duration::from_secs(90));
        assert_eq!(args.kubectl, PathBuf::from("/usr/local/bin/kubectl"));
    }

    #[test]
    #[serial]
    fn test_include_repeatable_and_comma_separated() {
        let args = parse_run(&["--include", "ns.yaml,role.yaml", "--include", "sub.yaml"]);
        assert_eq!(
            args.include,
            vec![
                PathBuf::from("ns.yaml"),
                PathBuf::from("role.yaml"),
                PathBuf::from("sub.yaml")
            ]
        );
    }

    #[test]
    #[serial]
    fn test_invalid_timeout_rejected() {
        let result = Cli::try_parse_from(["olm-run", "run", "--timeout", "soon"]);
        assert!(result.is_err());
    }

    #[test]
    #[serial]
    fn test_oversized_timeout_rejected() {
        let err = Cli::try_parse_from(["olm-run", "run", "--timeout", "500000000000y"])
            .expect_err("timeout beyond the cap should not parse");
        assert!(err.to_string().contains("must be at most"), "{err}");

        let args = parse_run(&["--timeout", "1year"]);
        assert!(args.timeout <= MAX_TIMEOUT);
    }

    #[test]
    #[serial]
    fn test_into_config() {
        let args = parse_run(&[
            "--manifests",
            "bundle",
            "--operator-version",
            "0.0.1",
            "--timeout",
            "0s",
            "--include",
            "a.yaml",
        ]);
        let config = args.into_config(Some(PathBuf::from("kubeconfig")));
        assert_eq!(config.manifests_dir, PathBuf::from("bundle"));
        assert_eq!(config.operator_version, "0.0.1");
        assert_eq!(config.include_paths, vec![PathBuf::from("a.yaml")]);
        assert_eq!(config.kubeconfig_path, Some(PathBuf::from("kubeconfig")));
        assert!(!config.force_registry);

        assert_eq!(config.timeout(), Duration::ZERO);
        config.initialize();
        assert_eq!(config.timeout(), crate::config::DEFAULT_TIMEOUT);
    }
}
