//! StreamingCluster Custom Resource Definition
//!
//! The streaming-data tier. Depends on the journal tier for durable log
//! storage and on a bulk-storage claim for long-term segment data.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::conditions::ClusterCondition;

/// StreamingCluster is the Schema for the streamingclusters API
#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "streamline.io",
    version = "v1alpha1",
    kind = "StreamingCluster",
    namespaced,
    status = "StreamingClusterStatus",
    shortname = "sc",
    printcolumn = r#"{"name":"Version","type":"string","jsonPath":".spec.version"}"#,
    printcolumn = r#"{"name":"Ready","type":"integer","jsonPath":".status.readyReplicas"}"#,
    printcolumn = r#"{"name":"Current","type":"string","jsonPath":".status.currentVersion"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct StreamingClusterSpec {
    /// Number of streaming server replicas (controller plus segment stores)
    #[serde(default = "default_replicas")]
    pub replicas: i32,

    /// Desired version; changing it triggers an upgrade in the reconciler
    #[serde(default = "default_version")]
    pub version: String,

    /// Container image repository for the streaming servers
    #[serde(default = "default_image")]
    pub image: String,

    /// Controller service port for client traffic
    #[serde(default = "default_controller_port")]
    pub controller_port: i32,

    /// Bulk storage backing for long-term segment data
    #[serde(default)]
    pub bulk_storage: BulkStorage,
}

/// Reference to the shared bulk-storage claim
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BulkStorage {
    /// Name of the PersistentVolumeClaim the segment stores mount
    #[serde(default = "default_bulk_storage_claim")]
    pub claim_name: String,
}

impl Default for BulkStorage {
    fn default() -> Self {
        Self {
            claim_name: default_bulk_storage_claim(),
        }
    }
}

/// Observed state of a StreamingCluster, written by its reconciler
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct StreamingClusterStatus {
    /// Number of ready replicas
    #[serde(default)]
    pub ready_replicas: i32,
    /// Total number of replicas
    #[serde(default)]
    pub replicas: i32,
    /// Version currently running, updated only once a rollout lands
    #[serde(default)]
    pub current_version: Option<String>,
    /// Conditions representing cluster state
    #[serde(default)]
    pub conditions: Vec<ClusterCondition>,
}

impl StreamingCluster {
    /// Address of the controller service, the endpoint verification jobs
    /// write to and read from.
    pub fn controller_service_address(&self) -> String {
        let name = self.metadata.name.as_deref().unwrap_or("streaming");
        format!("{}-controller:{}", name, self.spec.controller_port)
    }

    /// Labels the reconciler stamps on this cluster's pods and claims.
    pub fn selector_labels(&self) -> BTreeMap<String, String> {
        let name = self.metadata.name.as_deref().unwrap_or("streaming");
        BTreeMap::from([("app".to_string(), name.to_string())])
    }
}

fn default_replicas() -> i32 {
    3
}

fn default_version() -> String {
    "0.9.0".to_string()
}

fn default_image() -> String {
    "ghcr.io/streamlinelabs/streaming-server".to_string()
}

fn default_controller_port() -> i32 {
    9090
}

fn default_bulk_storage_claim() -> String {
    "streaming-bulk-storage".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_defaults() {
        let spec: StreamingClusterSpec = serde_json::from_str("{}").unwrap();
        assert_eq!(spec.replicas, 3);
        assert_eq!(spec.version, "0.9.0");
        assert_eq!(spec.bulk_storage.claim_name, "streaming-bulk-storage");
    }

    #[test]
    fn test_controller_service_address() {
        let cluster =
            StreamingCluster::new("streaming", serde_json::from_str("{}").unwrap());
        assert_eq!(
            cluster.controller_service_address(),
            "streaming-controller:9090"
        );
    }
}
