//! Common test utilities for olm-run integration tests
//!
//! A [`TestWorkspace`] holds a package-manifests bundle and a fake kubectl
//! script that records every invocation (arguments and stdin) to a log file.

#![allow(dead_code)]

use std::path::PathBuf;
use tempfile::TempDir;

/// How the fake kubectl answers CSV status queries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CsvStatus {
    Succeeded,
    Failed,
    /// Never answers, so the command has to hit its deadline
    Hang,
}

/// A test workspace for integration tests
pub struct TestWorkspace {
    /// Temporary directory
    pub temp: TempDir,
    /// Path to workspace root
    pub path: PathBuf,
}

impl TestWorkspace {
    /// Create a new test workspace
    pub fn new() -> Self {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let path = temp.path().to_path_buf();
        Self { temp, path }
    }

    /// Write a file in workspace
    pub fn write_file(&self, path: &str, content: &str) {
        let file_path = self.path.join(path);
        if let Some(parent) = file_path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        std::fs::write(&file_path, content).expect("Failed to write file");
    }

    /// Check if a file exists in workspace
    pub fn file_exists(&self, path: &str) -> bool {
        self.path.join(path).exists()
    }

    /// Write the memcached operator in package-manifests layout, returns its dir
    pub fn create_bundle(&self) -> PathBuf {
        self.write_file(
            "manifests/memcached.package.yaml",
            "packageName: memcached\nchannels:\n- name: alpha\n  currentCSV: memcached-operator.v0.0.1\n",
        );
        self.write_file(
            "manifests/0.0.1/memcached-operator.v0.0.1.clusterserviceversion.yaml",
            "apiVersion: operators.coreos.com/v1alpha1\n\
             kind: ClusterServiceVersion\n\
             metadata:\n  name: memcached-operator.v0.0.1\n\
             spec:\n  version: 0.0.1\n  replaces: memcached-operator.v0.0.0\n  \
             installModes:\n  - type: OwnNamespace\n    supported: true\n",
        );
        self.write_file(
            "manifests/0.0.1/cache_v1alpha1_memcached_crd.yaml",
            "apiVersion: apiextensions.k8s.io/v1\n\
             kind: CustomResourceDefinition\n\
             metadata:\n  name: memcacheds.cache.example.com\n",
        );
        self.path.join("manifests")
    }

    /// Install a fake kubectl script, returns its path
    #[cfg(unix)]
    pub fn create_kubectl(&self, csv: CsvStatus) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let csv_response = match csv {
            CsvStatus::Succeeded => r#"printf '{"status":{"phase":"Succeeded"}}'"#,
            CsvStatus::Failed => {
                r#"printf '{"status":{"phase":"Failed","message":"install strategy failed"}}'"#
            }
            CsvStatus::Hang => "exec sleep 30",
        };
        let script = format!(
            "#!/bin/sh\n\
             log='{log}'\n\
             printf 'ARGS: %s\\n' \"$*\" >> \"$log\"\n\
             [ -n \"$KUBECONFIG\" ] && printf 'KUBECONFIG: %s\\n' \"$KUBECONFIG\" >> \"$log\"\n\
             case \"$*\" in\n  *' -f -'*) cat >> \"$log\" ;;\nesac\n\
             case \"$*\" in\n  \
             *'config view'*) printf 'operators' ;;\n  \
             *'get clusterserviceversions'*) {csv_response} ;;\n\
             esac\n\
             exit 0\n",
            log = self.kubectl_log_path().display(),
        );

        let path = self.path.join("bin").join("kubectl");
        std::fs::create_dir_all(path.parent().expect("script has a parent"))
            .expect("Failed to create bin directory");
        std::fs::write(&path, script).expect("Failed to write fake kubectl");
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
            .expect("Failed to make fake kubectl executable");
        path
    }

    pub fn kubectl_log_path(&self) -> PathBuf {
        self.path.join("kubectl.log")
    }

    /// Everything the fake kubectl recorded, empty if it never ran
    pub fn kubectl_log(&self) -> String {
        std::fs::read_to_string(self.kubectl_log_path()).unwrap_or_default()
    }
}

impl Default for TestWorkspace {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workspace_creation() {
        let workspace = TestWorkspace::new();
        assert!(workspace.path.exists());
    }

    #[test]
    fn test_workspace_bundle_layout() {
        let workspace = TestWorkspace::new();
        workspace.create_bundle();
        assert!(workspace.file_exists("manifests/memcached.package.yaml"));
        assert!(workspace.file_exists(
            "manifests/0.0.1/memcached-operator.v0.0.1.clusterserviceversion.yaml"
        ));
    }

    #[test]
    fn test_kubectl_log_empty_before_use() {
        let workspace = TestWorkspace::new();
        assert!(workspace.kubectl_log().is_empty());
    }
}
