//! Custom Resource Definitions for the three cluster tiers
//!
//! - `CoordinationCluster`: storage coordination (metadata/consensus)
//! - `JournalCluster`: durable log storage, depends on coordination
//! - `StreamingCluster`: streaming data plane, depends on the journal
//!
//! The orchestrator owns only the specs; every status here is written by
//! the external reconcilers and consumed read-only.

mod coordination;
mod journal;
mod streaming;

pub use coordination::{
    CoordinationCluster, CoordinationClusterSpec, CoordinationClusterStatus, Persistence,
    VolumeReclaimPolicy,
};
pub use journal::{JournalCluster, JournalClusterSpec, JournalClusterStatus};
pub use streaming::{BulkStorage, StreamingCluster, StreamingClusterSpec, StreamingClusterStatus};

use k8s_openapi::NamespaceResourceScope;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Debug;

use crate::conditions::ClusterCondition;

/// Common status surface the workflows poll on every cluster kind.
///
/// Statuses are optional until the reconciler first reports; the accessors
/// fall back to "nothing observed yet" rather than panicking.
pub trait ClusterResource:
    kube::Resource<Scope = NamespaceResourceScope, DynamicType = ()>
    + Clone
    + Debug
    + Serialize
    + DeserializeOwned
    + Send
    + Sync
{
    /// Conditions reported by the reconciler, empty until first observed
    fn conditions(&self) -> &[ClusterCondition];

    /// Ready replica count, zero until first observed
    fn ready_replicas(&self) -> i32;

    /// Version currently running, if the reconciler has reported one
    fn current_version(&self) -> Option<&str>;

    /// Label selector for the pods and volume claims owned by this cluster
    fn selector_labels(&self) -> BTreeMap<String, String>;
}

impl ClusterResource for CoordinationCluster {
    fn conditions(&self) -> &[ClusterCondition] {
        self.status
            .as_ref()
            .map(|s| s.conditions.as_slice())
            .unwrap_or(&[])
    }

    fn ready_replicas(&self) -> i32 {
        self.status.as_ref().map(|s| s.ready_replicas).unwrap_or(0)
    }

    fn current_version(&self) -> Option<&str> {
        self.status.as_ref().and_then(|s| s.current_version.as_deref())
    }

    fn selector_labels(&self) -> BTreeMap<String, String> {
        CoordinationCluster::selector_labels(self)
    }
}

impl ClusterResource for JournalCluster {
    fn conditions(&self) -> &[ClusterCondition] {
        self.status
            .as_ref()
            .map(|s| s.conditions.as_slice())
            .unwrap_or(&[])
    }

    fn ready_replicas(&self) -> i32 {
        self.status.as_ref().map(|s| s.ready_replicas).unwrap_or(0)
    }

    fn current_version(&self) -> Option<&str> {
        self.status.as_ref().and_then(|s| s.current_version.as_deref())
    }

    fn selector_labels(&self) -> BTreeMap<String, String> {
        JournalCluster::selector_labels(self)
    }
}

impl ClusterResource for StreamingCluster {
    fn conditions(&self) -> &[ClusterCondition] {
        self.status
            .as_ref()
            .map(|s| s.conditions.as_slice())
            .unwrap_or(&[])
    }

    fn ready_replicas(&self) -> i32 {
        self.status.as_ref().map(|s| s.ready_replicas).unwrap_or(0)
    }

    fn current_version(&self) -> Option<&str> {
        self.status.as_ref().and_then(|s| s.current_version.as_deref())
    }

    fn selector_labels(&self) -> BTreeMap<String, String> {
        StreamingCluster::selector_labels(self)
    }
}
