//! Upgrade monitor
//!
//! Drives the version bump on a StreamingCluster and polls the Upgrading
//! and Error conditions until the rollout lands or fails.

use tracing::info;

use crate::conditions::{
    condition_status, find_condition, ClusterCondition, ConditionStatus, CONDITION_ERROR,
    CONDITION_UPGRADING,
};
use crate::crd::{ClusterResource, StreamingCluster};
use crate::error::{OrchestratorError, Result};
use crate::poll::{poll_until, PollCheck};
use crate::workflow::WorkflowContext;

/// One observation of upgrade progress
#[derive(Debug, PartialEq, Eq)]
pub enum UpgradeProgress {
    /// Upgrading is False and the reported version matches the target
    Complete,
    /// Anything else that is not a reported failure
    InProgress(String),
}

/// Classify one observed status against the target version.
///
/// An Error=True condition is terminal at any point, regardless of the
/// Upgrading value. Upgrading=False with an unchanged version is still in
/// progress: the condition can flip before the version field is
/// persisted, and trusting it alone would report success early.
pub fn evaluate_upgrade(
    conditions: &[ClusterCondition],
    current_version: Option<&str>,
    target_version: &str,
) -> Result<UpgradeProgress> {
    if let Some(error) = find_condition(conditions, CONDITION_ERROR) {
        if error.status == ConditionStatus::True {
            return Err(OrchestratorError::ReportedFailure {
                reason: error.reason.clone().unwrap_or_else(|| "Unknown".to_string()),
                message: error.message.clone().unwrap_or_default(),
            });
        }
    }

    let upgrading = condition_status(conditions, CONDITION_UPGRADING);
    if upgrading == ConditionStatus::False && current_version == Some(target_version) {
        return Ok(UpgradeProgress::Complete);
    }

    Ok(UpgradeProgress::InProgress(format!(
        "Upgrading={}, version {} (target {})",
        upgrading,
        current_version.unwrap_or("unreported"),
        target_version
    )))
}

/// Poll the named streaming cluster until it has upgraded to
/// `target_version`, failed, or exceeded the upgrade deadline.
pub async fn wait_for_upgrade(
    ctx: &WorkflowContext,
    name: &str,
    target_version: &str,
) -> Result<()> {
    info!(name, target_version, "waiting for cluster to upgrade");

    poll_until(
        &format!("StreamingCluster {} upgrade to {}", name, target_version),
        ctx.timeouts.retry_interval,
        ctx.timeouts.upgrade_timeout,
        || async {
            let cluster: StreamingCluster = ctx.resources.get(name).await?;
            match evaluate_upgrade(
                cluster.conditions(),
                ClusterResource::current_version(&cluster),
                target_version,
            )? {
                UpgradeProgress::Complete => Ok(PollCheck::Ready(())),
                UpgradeProgress::InProgress(note) => Ok(PollCheck::NotYet(note)),
            }
        },
    )
    .await?;

    info!(name, target_version, "cluster upgraded");
    Ok(())
}

/// Bump the desired version on the stored object, then monitor the
/// rollout to completion.
pub async fn upgrade(ctx: &WorkflowContext, name: &str, target_version: &str) -> Result<()> {
    let mut cluster: StreamingCluster = ctx.resources.get(name).await?;
    info!(
        name,
        from = %cluster.spec.version,
        to = target_version,
        "starting upgrade"
    );
    cluster.spec.version = target_version.to_string();
    ctx.resources.update(&cluster).await?;

    wait_for_upgrade(ctx, name, target_version).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conditions::build_condition;

    fn upgrading(status: ConditionStatus) -> ClusterCondition {
        build_condition(CONDITION_UPGRADING, status, "Rollout", "rolling pods")
    }

    #[test]
    fn test_success_only_once_condition_and_version_agree() {
        // The sequence a healthy upgrade reports, in order.
        let observations = [
            (vec![upgrading(ConditionStatus::True)], None),
            (vec![upgrading(ConditionStatus::True)], Some("0.10.0")),
            (vec![upgrading(ConditionStatus::False)], Some("0.10.0")),
        ];

        let first = evaluate_upgrade(&observations[0].0, observations[0].1, "0.10.0").unwrap();
        assert!(matches!(first, UpgradeProgress::InProgress(_)));

        let second = evaluate_upgrade(&observations[1].0, observations[1].1, "0.10.0").unwrap();
        assert!(matches!(second, UpgradeProgress::InProgress(_)));

        let third = evaluate_upgrade(&observations[2].0, observations[2].1, "0.10.0").unwrap();
        assert_eq!(third, UpgradeProgress::Complete);
    }

    #[test]
    fn test_condition_flip_before_version_persists_is_not_complete() {
        let conditions = vec![upgrading(ConditionStatus::False)];
        let progress = evaluate_upgrade(&conditions, Some("0.9.0"), "0.10.0").unwrap();
        assert!(matches!(progress, UpgradeProgress::InProgress(_)));
    }

    #[test]
    fn test_error_condition_is_terminal_at_any_point() {
        let conditions = vec![
            upgrading(ConditionStatus::True),
            build_condition(
                CONDITION_ERROR,
                ConditionStatus::True,
                "UpgradeFailed",
                "image pull backoff",
            ),
        ];
        let result = evaluate_upgrade(&conditions, Some("0.10.0"), "0.10.0");
        match result {
            Err(OrchestratorError::ReportedFailure { reason, message }) => {
                assert_eq!(reason, "UpgradeFailed");
                assert_eq!(message, "image pull backoff");
            }
            other => panic!("expected ReportedFailure, got {:?}", other),
        }
    }

    #[test]
    fn test_error_condition_false_does_not_abort() {
        let conditions = vec![
            upgrading(ConditionStatus::False),
            build_condition(CONDITION_ERROR, ConditionStatus::False, "NoError", ""),
        ];
        let progress = evaluate_upgrade(&conditions, Some("0.10.0"), "0.10.0").unwrap();
        assert_eq!(progress, UpgradeProgress::Complete);
    }
}
