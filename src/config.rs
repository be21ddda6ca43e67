//! Timeout and interval configuration
//!
//! Every workflow component takes its intervals and deadlines from one
//! [`Timeouts`] value threaded through the [`crate::workflow::WorkflowContext`],
//! so a caller can tighten or relax the whole run in one place.

use std::time::Duration;

/// Polling intervals and per-operation deadlines.
///
/// Defaults match the differentiated bounds the workflows were tuned
/// against: readiness waits are generous, termination is expected to be
/// quick, upgrades are the slowest operation.
#[derive(Debug, Clone)]
pub struct Timeouts {
    /// Interval between poll ticks for all waits
    pub retry_interval: Duration,
    /// Deadline for short one-off waits with no dedicated override
    pub default_timeout: Duration,
    /// Interval between deferred-cleanup delete attempts
    pub cleanup_retry_interval: Duration,
    /// Grace period for one deferred-cleanup deletion
    pub cleanup_timeout: Duration,
    /// Deadline for a cluster to reach its ready size
    pub ready_timeout: Duration,
    /// Deadline for an upgrade to converge on the target version
    pub upgrade_timeout: Duration,
    /// Deadline for pods, then volume claims, to disappear
    pub terminate_timeout: Duration,
    /// Deadline for a verification job to complete
    pub verification_timeout: Duration,
    /// Deadline for the bulk-storage claim to be confirmed absent
    pub reset_timeout: Duration,
    /// Per-pod ceiling for each phase of rolling-restart tracking
    pub pod_cycle_timeout: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            retry_interval: Duration::from_secs(5),
            default_timeout: Duration::from_secs(60),
            cleanup_retry_interval: Duration::from_secs(1),
            cleanup_timeout: Duration::from_secs(5),
            ready_timeout: Duration::from_secs(5 * 60),
            upgrade_timeout: Duration::from_secs(10 * 60),
            terminate_timeout: Duration::from_secs(2 * 60),
            verification_timeout: Duration::from_secs(5 * 60),
            reset_timeout: Duration::from_secs(3 * 60),
            pod_cycle_timeout: Duration::from_secs(5 * 60),
        }
    }
}
