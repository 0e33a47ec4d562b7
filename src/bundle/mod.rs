//! Operator bundle discovery
//!
//! Locates the ClusterServiceVersion for a requested version inside a
//! manifests directory, along with the CRDs shipped next to it and the
//! package name. Supported layouts:
//!
//! - `<dir>/<version>/...` or `<dir>/v<version>/...` (package manifests)
//! - `<dir>/manifests/` + `<dir>/metadata/annotations.yaml` (bundle image layout)
//! - any tree whose CSVs carry `spec.version`

pub mod manifest;

pub use manifest::Manifest;

use std::path::{Path, PathBuf};

use serde_yaml::Value;
use walkdir::WalkDir;

use crate::error::ManagerError;
use crate::error::manager::bundle;

const CSV_KIND: &str = "ClusterServiceVersion";
const CRD_KIND: &str = "CustomResourceDefinition";
const PACKAGE_ANNOTATION: &str = "operators.operatorframework.io.bundle.package.v1";

/// The manifests of one operator version
#[derive(Debug, Clone)]
pub struct Bundle {
    pub dir: PathBuf,
    pub package_name: String,
    pub csv: Manifest,
    pub crds: Vec<Manifest>,
}

impl Bundle {
    /// Find the bundle for `version` below `manifests_dir`
    pub fn load(manifests_dir: &Path, version: &str) -> Result<Self, ManagerError> {
        if !manifests_dir.is_dir() {
            return Err(bundle(manifests_dir, "not a directory"));
        }

        let dir = version_dir(manifests_dir, version);
        let documents = load_tree(&dir)?;

        let csv = documents
            .iter()
            .filter(|m| m.is_kind(CSV_KIND))
            .find(|m| csv_version(m).is_some_and(|v| versions_match(&v, version)))
            .cloned()
            .ok_or_else(|| {
                bundle(
                    &dir,
                    format!("no ClusterServiceVersion with version {}", version),
                )
            })?;

        let csv_name = csv
            .name()
            .ok_or_else(|| bundle(&csv.path, "ClusterServiceVersion has no metadata.name"))?
            .to_string();

        let csv_dir = csv.path.parent().map(Path::to_path_buf);
        let crds = documents
            .iter()
            .filter(|m| m.is_kind(CRD_KIND))
            .filter(|m| m.path.parent().map(Path::to_path_buf) == csv_dir)
            .cloned()
            .collect();

        let package_name = package_name(manifests_dir, &dir, &documents)
            .unwrap_or_else(|| csv_name.split('.').next().unwrap_or(&csv_name).to_string());

        tracing::debug!(
            dir = %dir.display(),
            package = %package_name,
            csv = %csv_name,
            "resolved bundle"
        );

        Ok(Self {
            dir,
            package_name,
            csv,
            crds,
        })
    }

    pub fn csv_name(&self) -> &str {
        self.csv.name().unwrap_or_default()
    }
}

fn version_dir(manifests_dir: &Path, version: &str) -> PathBuf {
    let bare = version.trim_start_matches('v');
    [version.to_string(), bare.to_string(), format!("v{}", bare)]
        .iter()
        .map(|name| manifests_dir.join(name))
        .find(|candidate| candidate.is_dir())
        .unwrap_or_else(|| manifests_dir.to_path_buf())
}

fn load_tree(dir: &Path) -> Result<Vec<Manifest>, ManagerError> {
    let mut documents = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(|e| bundle(dir, e.to_string()))?;
        if entry.file_type().is_file() && manifest::is_yaml(entry.path()) {
            documents.extend(manifest::load_file(entry.path())?);
        }
    }
    Ok(documents)
}

fn csv_version(csv: &Manifest) -> Option<String> {
    csv.value
        .get("spec")
        .and_then(|s| s.get("version"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Compare versions semantically, tolerating a leading `v`
fn versions_match(found: &str, wanted: &str) -> bool {
    let parse = |v: &str| semver::Version::parse(v.trim_start_matches('v'));
    match (parse(found), parse(wanted)) {
        (Ok(a), Ok(b)) => a == b,
        _ => found.trim_start_matches('v') == wanted.trim_start_matches('v'),
    }
}

/// Package name from bundle annotations or a package manifest
fn package_name(manifests_dir: &Path, dir: &Path, documents: &[Manifest]) -> Option<String> {
    let from_annotations = [dir, manifests_dir]
        .iter()
        .map(|d| d.join("metadata").join("annotations.yaml"))
        .filter(|p| p.is_file())
        .filter_map(|p| manifest::load_file(&p).ok())
        .flatten()
        .find_map(|m| {
            m.value
                .get("annotations")
                .and_then(|a| a.get(PACKAGE_ANNOTATION))
                .and_then(Value::as_str)
                .map(str::to_string)
        });

    from_annotations
        .or_else(|| package_manifest_name(documents))
        .or_else(|| {
            // the package manifest of a package-manifests layout sits above the version dir
            if dir == manifests_dir {
                return None;
            }
            std::fs::read_dir(manifests_dir)
                .ok()?
                .filter_map(std::result::Result::ok)
                .map(|e| e.path())
                .filter(|p| p.is_file() && manifest::is_yaml(p))
                .filter_map(|p| manifest::load_file(&p).ok())
                .find_map(|docs| package_manifest_name(&docs))
        })
}

fn package_manifest_name(documents: &[Manifest]) -> Option<String> {
    documents.iter().find_map(|m| {
        m.value
            .get("packageName")
            .and_then(Value::as_str)
            .map(str::to_string)
    })
}
