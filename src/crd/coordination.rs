//! CoordinationCluster Custom Resource Definition
//!
//! The storage coordination tier (metadata/consensus service) that the
//! journal tier depends on.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::conditions::ClusterCondition;

/// CoordinationCluster is the Schema for the coordinationclusters API
#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "streamline.io",
    version = "v1alpha1",
    kind = "CoordinationCluster",
    namespaced,
    status = "CoordinationClusterStatus",
    shortname = "coord",
    printcolumn = r#"{"name":"Replicas","type":"integer","jsonPath":".spec.replicas"}"#,
    printcolumn = r#"{"name":"Ready","type":"integer","jsonPath":".status.readyReplicas"}"#,
    printcolumn = r#"{"name":"Version","type":"string","jsonPath":".status.currentVersion"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct CoordinationClusterSpec {
    /// Number of coordination server replicas
    #[serde(default = "default_replicas")]
    pub replicas: i32,

    /// Container image for the coordination servers
    #[serde(default = "default_image")]
    pub image: String,

    /// Client port exposed by the client service
    #[serde(default = "default_client_port")]
    pub client_port: i32,

    /// Persistent storage configuration
    #[serde(default)]
    pub persistence: Persistence,
}

/// Persistent volume configuration shared by the stateful tiers
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Persistence {
    /// What happens to volumes when the cluster is deleted
    #[serde(default)]
    pub volume_reclaim_policy: VolumeReclaimPolicy,
    /// Storage class name for PVCs
    #[serde(default)]
    pub storage_class_name: Option<String>,
    /// Size of each persistent volume (e.g., "20Gi")
    #[serde(default = "default_storage_size")]
    pub size: String,
}

impl Default for Persistence {
    fn default() -> Self {
        Self {
            volume_reclaim_policy: VolumeReclaimPolicy::default(),
            storage_class_name: None,
            size: default_storage_size(),
        }
    }
}

/// Reclaim behavior for volumes owned by a deleted cluster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
pub enum VolumeReclaimPolicy {
    #[default]
    Retain,
    Delete,
}

/// Observed state of a CoordinationCluster, written by its reconciler
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct CoordinationClusterStatus {
    /// Number of ready replicas
    #[serde(default)]
    pub ready_replicas: i32,
    /// Total number of replicas
    #[serde(default)]
    pub replicas: i32,
    /// Currently deployed version
    #[serde(default)]
    pub current_version: Option<String>,
    /// Conditions representing cluster state
    #[serde(default)]
    pub conditions: Vec<ClusterCondition>,
}

impl CoordinationCluster {
    /// Address of the client service, used to wire dependent tiers.
    pub fn client_service_address(&self) -> String {
        let name = self.metadata.name.as_deref().unwrap_or("coordination");
        format!("{}-client:{}", name, self.spec.client_port)
    }

    /// Labels the reconciler stamps on this cluster's pods and claims.
    pub fn selector_labels(&self) -> BTreeMap<String, String> {
        let name = self.metadata.name.as_deref().unwrap_or("coordination");
        BTreeMap::from([("app".to_string(), name.to_string())])
    }
}

fn default_replicas() -> i32 {
    3
}

fn default_image() -> String {
    "ghcr.io/streamlinelabs/coordination-server:latest".to_string()
}

fn default_client_port() -> i32 {
    2181
}

fn default_storage_size() -> String {
    "20Gi".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_defaults() {
        let spec: CoordinationClusterSpec = serde_json::from_str("{}").unwrap();
        assert_eq!(spec.replicas, 3);
        assert_eq!(spec.client_port, 2181);
        assert_eq!(
            spec.persistence.volume_reclaim_policy,
            VolumeReclaimPolicy::Retain
        );
    }

    #[test]
    fn test_client_service_address() {
        let cluster = CoordinationCluster::new(
            "coordination",
            CoordinationClusterSpec {
                replicas: 1,
                image: default_image(),
                client_port: 2181,
                persistence: Persistence::default(),
            },
        );
        assert_eq!(cluster.client_service_address(), "coordination-client:2181");
    }

    #[test]
    fn test_selector_labels_use_name() {
        let cluster =
            CoordinationCluster::new("coordination", serde_json::from_str("{}").unwrap());
        assert_eq!(
            cluster.selector_labels().get("app").map(String::as_str),
            Some("coordination")
        );
    }
}
