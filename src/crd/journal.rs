//! JournalCluster Custom Resource Definition
//!
//! The log/journal tier. Depends on the coordination tier for metadata
//! and leader election, so its spec carries the coordination endpoint.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::conditions::ClusterCondition;
use crate::crd::Persistence;

/// JournalCluster is the Schema for the journalclusters API
#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "streamline.io",
    version = "v1alpha1",
    kind = "JournalCluster",
    namespaced,
    status = "JournalClusterStatus",
    shortname = "jc",
    printcolumn = r#"{"name":"Replicas","type":"integer","jsonPath":".spec.replicas"}"#,
    printcolumn = r#"{"name":"Ready","type":"integer","jsonPath":".status.readyReplicas"}"#,
    printcolumn = r#"{"name":"Version","type":"string","jsonPath":".status.currentVersion"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct JournalClusterSpec {
    /// Number of journal server replicas
    #[serde(default = "default_replicas")]
    pub replicas: i32,

    /// Container image for the journal servers
    #[serde(default = "default_image")]
    pub image: String,

    /// Client address of the coordination cluster this tier registers with
    #[serde(default = "default_coordination_uri")]
    pub coordination_uri: String,

    /// ConfigMap holding environment overrides for the journal servers
    #[serde(default = "default_env_config_map")]
    pub env_config_map: String,

    /// Persistent storage configuration
    #[serde(default)]
    pub persistence: Persistence,
}

/// Observed state of a JournalCluster, written by its reconciler
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct JournalClusterStatus {
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

impl JournalCluster {
    /// Labels the reconciler stamps on this cluster's pods and claims.
    pub fn selector_labels(&self) -> BTreeMap<String, String> {
        let name = self.metadata.name.as_deref().unwrap_or("journal");
        BTreeMap::from([("app".to_string(), name.to_string())])
    }
}

fn default_replicas() -> i32 {
    3
}

fn default_image() -> String {
    "ghcr.io/streamlinelabs/journal-server:latest".to_string()
}

fn default_coordination_uri() -> String {
    "coordination-client:2181".to_string()
}

fn default_env_config_map() -> String {
    "journal-configmap".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_defaults() {
        let spec: JournalClusterSpec = serde_json::from_str("{}").unwrap();
        assert_eq!(spec.replicas, 3);
        assert_eq!(spec.coordination_uri, "coordination-client:2181");
        assert_eq!(spec.env_config_map, "journal-configmap");
    }

    #[test]
    fn test_spec_round_trips_camel_case() {
        let json = r#"{"replicas":5,"coordinationUri":"coord-client:2181"}"#;
        let spec: JournalClusterSpec = serde_json::from_str(json).unwrap();
        assert_eq!(spec.replicas, 5);
        assert_eq!(spec.coordination_uri, "coord-client:2181");
    }
}
