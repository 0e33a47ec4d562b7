//! Kubernetes manifest loading
//!
//! Manifests are kept as untyped YAML values; only `kind` and
//! `metadata.name` are interpreted here.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_yaml::Value;

use crate::error::ManagerError;
use crate::error::manager::manifest;

/// One YAML document and the file it came from
#[derive(Debug, Clone, PartialEq)]
pub struct Manifest {
    pub path: PathBuf,
    pub value: Value,
}

impl Manifest {
    pub fn kind(&self) -> Option<&str> {
        self.value.get("kind").and_then(Value::as_str)
    }

    pub fn name(&self) -> Option<&str> {
        self.value
            .get("metadata")
            .and_then(|m| m.get("name"))
            .and_then(Value::as_str)
    }

    pub fn is_kind(&self, kind: &str) -> bool {
        self.kind() == Some(kind)
    }
}

/// Load every non-empty document of a (possibly multi-document) YAML file
pub fn load_file(path: &Path) -> Result<Vec<Manifest>, ManagerError> {
    let content = fs::read_to_string(path).map_err(|e| manifest(path, e))?;

    let mut manifests = Vec::new();
    for document in serde_yaml::Deserializer::from_str(&content) {
        let value = Value::deserialize(document).map_err(|e| manifest(path, e))?;
        if value.is_null() {
            continue;
        }
        if !value.is_mapping() {
            return Err(manifest(path, "document is not a mapping"));
        }
        manifests.push(Manifest {
            path: path.to_path_buf(),
            value,
        });
    }
    Ok(manifests)
}

/// Load all manifests from `paths`, in order
pub fn load_all(paths: &[PathBuf]) -> Result<Vec<Manifest>, ManagerError> {
    let mut manifests = Vec::new();
    for path in paths {
        let loaded = load_file(path)?;
        tracing::debug!(path = %path.display(), count = loaded.len(), "loaded manifests");
        manifests.extend(loaded);
    }
    Ok(manifests)
}

pub fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml" | "yml")
    )
}

/// Render manifests as a multi-document YAML stream for `kubectl -f -`
pub fn to_yaml_stream<'a>(
    values: impl IntoIterator<Item = &'a Value>,
) -> Result<String, ManagerError> {
    let mut out = String::new();
    for value in values {
        let doc = serde_yaml::to_string(value)
            .map_err(|e| crate::error::manager::render("manifest stream", e))?;
        out.push_str("---\n");
        out.push_str(&doc);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_multi_document_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("rbac.yaml");
        fs::write(
            &path,
            "---\napiVersion: v1\nkind: ServiceAccount\nmetadata:\n  name: sa\n---\n---\nkind: Role\nmetadata:\n  name: role\n",
        )
        .unwrap();

        let manifests = load_file(&path).unwrap();
        assert_eq!(manifests.len(), 2);
        assert_eq!(manifests[0].kind(), Some("ServiceAccount"));
        assert_eq!(manifests[0].name(), Some("sa"));
        assert!(manifests[1].is_kind("Role"));
        assert_eq!(manifests[1].path, path);
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_file(Path::new("/nonexistent/include.yaml")).unwrap_err();
        assert!(matches!(err, ManagerError::Manifest { .. }));
    }

    #[test]
    fn test_load_rejects_scalar_document() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("bad.yaml");
        fs::write(&path, "just a string\n").unwrap();
        assert!(load_file(&path).is_err());
    }

    #[test]
    fn test_load_all_preserves_order() {
        let temp = TempDir::new().unwrap();
        let a = temp.path().join("a.yaml");
        let b = temp.path().join("b.yml");
        fs::write(&a, "kind: Namespace\nmetadata:\n  name: a\n").unwrap();
        fs::write(&b, "kind: Namespace\nmetadata:\n  name: b\n").unwrap();

        let manifests = load_all(&[b.clone(), a.clone()]).unwrap();
        let names: Vec<_> = manifests.iter().filter_map(Manifest::name).collect();
        assert_eq!(names, vec!["b", "a"]);
        assert!(is_yaml(&a) && is_yaml(&b));
        assert!(!is_yaml(Path::new("README.md")));
    }

    #[test]
    fn test_yaml_stream_separates_documents() {
        let values: Vec<Value> = vec![
            serde_yaml::from_str("kind: A").unwrap(),
            serde_yaml::from_str("kind: B").unwrap(),
        ];
        let stream = to_yaml_stream(&values).unwrap();
        assert_eq!(stream.matches("---\n").count(), 2);
        assert!(stream.contains("kind: A") && stream.contains("kind: B"));
    }
}
