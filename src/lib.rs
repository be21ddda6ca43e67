//! Streamline Lifecycle Orchestrator
//!
//! A one-shot workflow driver for the three-tier Streamline stack on
//! Kubernetes. It sequences custom cluster resources through
//! create → ready → upgrade → terminate transitions in dependency order,
//! and verifies convergence by polling observable state (status
//! conditions, ready-replica counts, pod and volume-claim existence)
//! published by the external reconcilers.
//!
//! ## Custom Resources
//!
//! - `CoordinationCluster`: storage coordination (metadata/consensus)
//! - `JournalCluster`: log/journal tier, depends on coordination
//! - `StreamingCluster`: streaming data plane, depends on the journal
//!
//! ## Example
//!
//! ```bash
//! # Re-establish the ready baseline in a namespace
//! streamline-orchestrator --namespace staging bootstrap
//!
//! # Upgrade a streaming cluster and wait for the rollout
//! streamline-orchestrator upgrade --name streaming --target-version 0.10.0
//! ```

pub mod client;
pub mod conditions;
pub mod config;
pub mod crd;
pub mod error;
pub mod poll;
pub mod workflow;

pub use client::ResourceClient;
pub use conditions::{ClusterCondition, ConditionStatus};
pub use config::Timeouts;
pub use crd::{
    ClusterResource, CoordinationCluster, CoordinationClusterSpec, JournalCluster,
    JournalClusterSpec, StreamingCluster, StreamingClusterSpec,
};
pub use error::{OrchestratorError, Result};
pub use workflow::{bootstrap, teardown, BootstrapSpec, WorkflowContext};
