//! OLM resources rendered for a bundle
//!
//! A [`ResourcePlan`] holds everything `run` applies and `cleanup` deletes:
//! the registry ConfigMap serving the bundle, a CatalogSource pointing at it,
//! an OperatorGroup, a Subscription, and the user's include manifests.
//! Include manifests of kind CatalogSource, Subscription or OperatorGroup
//! replace the generated resource of the same kind. Namespaced includes
//! without `metadata.namespace` are placed in the operator namespace.

use serde::Serialize;
use serde_yaml::Value;

use crate::bundle::{Bundle, Manifest};
use crate::config::InstallModeSpec;
use crate::error::ManagerError;
use crate::error::manager::render;

/// Channel of the synthesized package, pointing at the deployed CSV
pub const CHANNEL: &str = "olm-run";

/// Label OLM puts on the registry pods it starts for a CatalogSource
pub const CATALOG_SOURCE_LABEL: &str = "olm.catalogSource";

const OPERATORS_V1ALPHA1: &str = "operators.coreos.com/v1alpha1";
const OPERATORS_V1: &str = "operators.coreos.com/v1";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ObjectMeta {
    name: String,
    namespace: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Resource<S: Serialize> {
    api_version: &'static str,
    kind: &'static str,
    metadata: ObjectMeta,
    #[serde(skip_serializing_if = "Option::is_none")]
    spec: Option<S>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<RegistryData>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RegistryData {
    custom_resource_definitions: String,
    cluster_service_versions: String,
    packages: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PackageManifest {
    package_name: String,
    channels: Vec<PackageChannel>,
    default_channel: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PackageChannel {
    name: &'static str,
    #[serde(rename = "currentCSV")]
    current_csv: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CatalogSourceSpec {
    source_type: &'static str,
    config_map: String,
    display_name: String,
    publisher: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OperatorGroupSpec {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    target_namespaces: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SubscriptionSpec {
    channel: &'static str,
    name: String,
    source: String,
    source_namespace: String,
    #[serde(rename = "startingCSV")]
    starting_csv: String,
    install_plan_approval: &'static str,
}

/// Generated and included resources for one deployment
#[derive(Debug, Clone)]
pub struct ResourcePlan {
    pub namespace: String,
    pub csv_name: String,
    pub catalog_name: String,
    pub registry: Value,
    pub catalog_source: Value,
    pub operator_group: Value,
    pub subscription: Value,
    pub includes: Vec<Value>,
}

impl ResourcePlan {
    /// Render the resources for `bundle` in `namespace`
    pub fn render(
        bundle: &Bundle,
        install_mode: &InstallModeSpec,
        namespace: &str,
        includes: &[Manifest],
    ) -> Result<Self, ManagerError> {
        let package = &bundle.package_name;
        let csv_name = bundle.csv_name().to_string();
        let registry_name = format!("{}-registry-manifests", package);

        let included = |kind: &str| {
            includes
                .iter()
                .find(|m| m.is_kind(kind))
                .map(|m| in_namespace(m, namespace))
        };

        let catalog_source = match included("CatalogSource") {
            Some(value) => value,
            None => to_value(
                "CatalogSource",
                &Resource {
                    api_version: OPERATORS_V1ALPHA1,
                    kind: "CatalogSource",
                    metadata: meta(format!("{}-ocs", package), namespace),
                    spec: Some(CatalogSourceSpec {
                        source_type: "configmap",
                        config_map: registry_name.clone(),
                        display_name: package.clone(),
                        publisher: "olm-run",
                    }),
                    data: None,
                },
            )?,
        };
        let catalog_name = object_name(&catalog_source)
            .unwrap_or_else(|| format!("{}-ocs", package));
        let catalog_namespace = object_namespace(&catalog_source)
            .unwrap_or_else(|| namespace.to_string());

        let operator_group = match included("OperatorGroup") {
            Some(value) => value,
            None => to_value(
                "OperatorGroup",
                &Resource {
                    api_version: OPERATORS_V1,
                    kind: "OperatorGroup",
                    metadata: meta(format!("{}-og", package), namespace),
                    spec: Some(OperatorGroupSpec {
                        target_namespaces: install_mode.target_namespaces(namespace),
                    }),
                    data: None,
                },
            )?,
        };

        let subscription = match included("Subscription") {
            Some(value) => value,
            None => to_value(
                "Subscription",
                &Resource {
                    api_version: OPERATORS_V1ALPHA1,
                    kind: "Subscription",
                    metadata: meta(format!("{}-sub", package), namespace),
                    spec: Some(SubscriptionSpec {
                        channel: CHANNEL,
                        name: package.clone(),
                        source: catalog_name.clone(),
                        source_namespace: catalog_namespace,
                        starting_csv: csv_name.clone(),
                        install_plan_approval: "Automatic",
                    }),
                    data: None,
                },
            )?,
        };

        let registry = registry_config_map(bundle, &registry_name, namespace)?;

        let includes = includes
            .iter()
            .filter(|m| !OVERRIDABLE_KINDS.iter().any(|kind| m.is_kind(kind)))
            .map(|m| in_namespace(m, namespace))
            .collect();

        Ok(Self {
            namespace: namespace.to_string(),
            csv_name,
            catalog_name,
            registry,
            catalog_source,
            operator_group,
            subscription,
            includes,
        })
    }

    /// Resources in the order they are applied
    pub fn apply_order(&self) -> Vec<&Value> {
        let mut values: Vec<&Value> = self.includes.iter().collect();
        values.extend([
            &self.registry,
            &self.catalog_source,
            &self.operator_group,
            &self.subscription,
        ]);
        values
    }

    /// Resources removed on teardown, registry excluded, in deletion order
    pub fn delete_order(&self) -> Vec<&Value> {
        let mut values = vec![
            &self.subscription,
            &self.operator_group,
            &self.catalog_source,
        ];
        values.extend(self.includes.iter().rev());
        values
    }
}

const OVERRIDABLE_KINDS: [&str; 3] = ["CatalogSource", "Subscription", "OperatorGroup"];

const CLUSTER_SCOPED_KINDS: [&str; 10] = [
    "Namespace",
    "CustomResourceDefinition",
    "ClusterRole",
    "ClusterRoleBinding",
    "PersistentVolume",
    "StorageClass",
    "PriorityClass",
    "APIService",
    "MutatingWebhookConfiguration",
    "ValidatingWebhookConfiguration",
];

/// The manifest's value, defaulted into `namespace` unless cluster scoped
fn in_namespace(manifest: &Manifest, namespace: &str) -> Value {
    let mut value = manifest.value.clone();
    if CLUSTER_SCOPED_KINDS.iter().any(|kind| manifest.is_kind(kind)) {
        return value;
    }
    if let Some(metadata) = value.get_mut("metadata").and_then(Value::as_mapping_mut) {
        if !metadata.contains_key("namespace") {
            metadata.insert(
                Value::String("namespace".to_string()),
                Value::String(namespace.to_string()),
            );
        }
    }
    value
}

fn meta(name: String, namespace: &str) -> ObjectMeta {
    ObjectMeta {
        name,
        namespace: namespace.to_string(),
    }
}

fn to_value<T: Serialize>(kind: &str, resource: &T) -> Result<Value, ManagerError> {
    serde_yaml::to_value(resource).map_err(|e| render(kind, e))
}

fn object_name(value: &Value) -> Option<String> {
    value
        .get("metadata")?
        .get("name")?
        .as_str()
        .map(str::to_string)
}

fn object_namespace(value: &Value) -> Option<String> {
    value
        .get("metadata")?
        .get("namespace")?
        .as_str()
        .map(str::to_string)
}

/// ConfigMap in the layout read by OLM's `configmap` catalog source type
fn registry_config_map(
    bundle: &Bundle,
    name: &str,
    namespace: &str,
) -> Result<Value, ManagerError> {
    // the registry only serves this CSV, so upgrade edges would dangle
    let mut csv = bundle.csv.value.clone();
    if let Some(spec) = csv.get_mut("spec").and_then(Value::as_mapping_mut) {
        spec.remove("replaces");
        spec.remove("skips");
    }

    let crds: Vec<&Value> = bundle.crds.iter().map(|m| &m.value).collect();
    let package = vec![PackageManifest {
        package_name: bundle.package_name.clone(),
        channels: vec![PackageChannel {
            name: CHANNEL,
            current_csv: bundle.csv_name().to_string(),
        }],
        default_channel: CHANNEL,
    }];

    to_value(
        "ConfigMap",
        &Resource::<()> {
            api_version: "v1",
            kind: "ConfigMap",
            metadata: meta(name.to_string(), namespace),
            spec: None,
            data: Some(RegistryData {
                custom_resource_definitions: yaml_string("CustomResourceDefinition", &crds)?,
                cluster_service_versions: yaml_string("ClusterServiceVersion", &[csv])?,
                packages: yaml_string("PackageManifest", &package)?,
            }),
        },
    )
}

fn yaml_string<T: Serialize + ?Sized>(kind: &str, value: &T) -> Result<String, ManagerError> {
    serde_yaml::to_string(value).map_err(|e| render(kind, e))
}
