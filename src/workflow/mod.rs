//! Lifecycle workflows
//!
//! One-shot drivers that sequence the resource client and the polling
//! primitive: dependency-ordered bootstrap, termination verification,
//! upgrade monitoring, rolling-restart verification, bulk-storage reset,
//! and verification-job dispatch.

pub mod bootstrap;
pub mod reset;
pub mod restart;
pub mod terminate;
pub mod upgrade;
pub mod verify;

pub use bootstrap::{bootstrap, bootstrap_stages, teardown, teardown_stages, BootstrapSpec, Stage};

use tracing::info;

use crate::client::ResourceClient;
use crate::conditions::{condition_status, ClusterCondition, ConditionStatus, CONDITION_PODS_READY};
use crate::config::Timeouts;
use crate::crd::ClusterResource;
use crate::error::Result;
use crate::poll::{poll_until, PollCheck};

/// Shared state for one workflow invocation: the namespace-scoped client
/// and the timeout table. Workflows run strictly sequentially; nothing
/// here is shared across concurrent runs.
pub struct WorkflowContext {
    pub resources: ResourceClient,
    pub timeouts: Timeouts,
}

impl WorkflowContext {
    pub fn new(resources: ResourceClient, timeouts: Timeouts) -> Self {
        Self { resources, timeouts }
    }

    pub fn namespace(&self) -> &str {
        self.resources.namespace()
    }
}

/// Readiness requires agreement of both signals: the PodsReady condition
/// and the ready-replica count. A size match alone can be observed
/// transiently mid-rollout and must not count.
pub fn cluster_ready(
    conditions: &[ClusterCondition],
    ready_replicas: i32,
    expected_size: i32,
) -> bool {
    condition_status(conditions, CONDITION_PODS_READY) == ConditionStatus::True
        && ready_replicas == expected_size
}

/// Wait until the named cluster reports ready at `expected_size`,
/// re-fetching it on every tick.
pub async fn wait_for_ready<K>(ctx: &WorkflowContext, name: &str, expected_size: i32) -> Result<()>
where
    K: ClusterResource,
{
    let kind = K::kind(&()).to_string();
    info!(kind = %kind, name, expected_size, "waiting for cluster to become ready");

    poll_until(
        &format!("{} {} ready", kind, name),
        ctx.timeouts.retry_interval,
        ctx.timeouts.ready_timeout,
        || async {
            let cluster: K = ctx.resources.get(name).await?;
            if cluster_ready(cluster.conditions(), cluster.ready_replicas(), expected_size) {
                Ok(PollCheck::Ready(()))
            } else {
                Ok(PollCheck::NotYet(format!(
                    "{}/{} replicas ready, PodsReady={}",
                    cluster.ready_replicas(),
                    expected_size,
                    condition_status(cluster.conditions(), CONDITION_PODS_READY),
                )))
            }
        },
    )
    .await?;

    info!(kind = %kind, name, "cluster ready");
    Ok(())
}

/// Wait until the stored cluster object itself is gone after a delete.
///
/// The store drops the object quickly once the delete is accepted; the
/// slow part of termination is the owned children, which
/// [`terminate::wait_for_gone`] covers separately. Hence the short
/// default bound here.
pub async fn wait_for_absence<K>(ctx: &WorkflowContext, name: &str) -> Result<()>
where
    K: ClusterResource,
{
    let kind = K::kind(&()).to_string();
    poll_until(
        &format!("{} {} absent", kind, name),
        ctx.timeouts.retry_interval,
        ctx.timeouts.default_timeout,
        || async {
            match ctx.resources.get::<K>(name).await {
                Ok(_) => Ok(PollCheck::NotYet("still present".to_string())),
                Err(err) if err.is_not_found() => Ok(PollCheck::Ready(())),
                Err(err) => Err(err),
            }
        },
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conditions::build_condition;

    #[test]
    fn test_size_match_alone_is_not_ready() {
        assert!(!cluster_ready(&[], 3, 3));

        let progressing = vec![build_condition(
            CONDITION_PODS_READY,
            ConditionStatus::False,
            "Rollout",
            "rolling",
        )];
        assert!(!cluster_ready(&progressing, 3, 3));
    }

    #[test]
    fn test_condition_alone_is_not_ready() {
        let ready = vec![build_condition(
            CONDITION_PODS_READY,
            ConditionStatus::True,
            "AllReady",
            "all ready",
        )];
        assert!(!cluster_ready(&ready, 2, 3));
    }

    #[test]
    fn test_both_signals_agree() {
        let ready = vec![build_condition(
            CONDITION_PODS_READY,
            ConditionStatus::True,
            "AllReady",
            "all ready",
        )];
        assert!(cluster_ready(&ready, 3, 3));
    }
}
