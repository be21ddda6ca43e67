//! Rolling-restart verifier
//!
//! After a config change that should trigger a rolling restart, confirm
//! every selected pod cycles not-ready before coming back ready. Two
//! phases: first every pod is seen not-ready, then every pod is seen
//! ready again, each bounded per pod. A pod that restarts faster than
//! one poll interval can be missed; this is a known coarse-grained
//! limitation of tracking the rollout from the client side.

use k8s_openapi::api::core::v1::Pod;
use kube::api::{Api, ListParams};
use kube::ResourceExt;
use std::collections::BTreeMap;
use tracing::info;

use crate::error::Result;
use crate::poll::{poll_until, PollCheck};
use crate::workflow::terminate::selector_string;
use crate::workflow::WorkflowContext;

/// Pod readiness per its own Ready condition.
pub fn is_pod_ready(pod: &Pod) -> bool {
    pod.status
        .as_ref()
        .and_then(|s| s.conditions.as_ref())
        .map(|conditions| {
            conditions
                .iter()
                .any(|c| c.type_ == "Ready" && c.status == "True")
        })
        .unwrap_or(false)
}

async fn list_pod_names(ctx: &WorkflowContext, params: &ListParams) -> Result<Vec<String>> {
    let pods: Api<Pod> = Api::namespaced(ctx.resources.kube(), ctx.namespace());
    let listed = pods.list(params).await?;
    Ok(listed.items.iter().map(|p| p.name_any()).collect())
}

/// Wait until the named pod is observed in the given readiness state.
/// A pod deleted outright counts as having left the ready state.
async fn wait_for_pod_readiness(ctx: &WorkflowContext, name: &str, want_ready: bool) -> Result<()> {
    let pods: Api<Pod> = Api::namespaced(ctx.resources.kube(), ctx.namespace());
    let state = if want_ready { "ready" } else { "not-ready" };

    poll_until(
        &format!("pod {} {}", name, state),
        ctx.timeouts.retry_interval,
        ctx.timeouts.pod_cycle_timeout,
        || async {
            match get_pod(&pods, name).await? {
                Some(pod) => {
                    if is_pod_ready(&pod) == want_ready {
                        Ok(PollCheck::Ready(()))
                    } else {
                        Ok(PollCheck::NotYet(format!("pod {} not yet {}", name, state)))
                    }
                }
                // Gone entirely: definitely not ready.
                None if !want_ready => Ok(PollCheck::Ready(())),
                None => Ok(PollCheck::NotYet(format!("pod {} not recreated yet", name))),
            }
        },
    )
    .await
}

async fn get_pod(pods: &Api<Pod>, name: &str) -> Result<Option<Pod>> {
    match pods.get(name).await {
        Ok(pod) => Ok(Some(pod)),
        Err(kube::Error::Api(resp)) if resp.code == 404 => Ok(None),
        Err(err) => Err(err.into()),
    }
}

/// Confirm a rolling restart across all pods matching `labels`.
pub async fn wait_for_rolling_restart(
    ctx: &WorkflowContext,
    labels: &BTreeMap<String, String>,
) -> Result<()> {
    let selector = selector_string(labels);
    let params = ListParams::default().labels(&selector);

    let before = list_pod_names(ctx, &params).await?;
    info!(%selector, pods = ?before, "waiting for pods to cycle not-ready");
    for name in &before {
        wait_for_pod_readiness(ctx, name, false).await?;
    }

    // Re-enumerate: restarted pods may have new names.
    let after = list_pod_names(ctx, &params).await?;
    info!(%selector, pods = ?after, "waiting for pods to come back ready");
    for name in &after {
        wait_for_pod_readiness(ctx, name, true).await?;
    }

    info!(%selector, "rolling restart confirmed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::core::v1::{PodCondition, PodStatus};
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

    fn pod_with_ready(status: &str) -> Pod {
        Pod {
            metadata: ObjectMeta {
                name: Some("streaming-0".to_string()),
                ..Default::default()
            },
            status: Some(PodStatus {
                conditions: Some(vec![PodCondition {
                    type_: "Ready".to_string(),
                    status: status.to_string(),
                    ..Default::default()
                }]),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_pod_ready_condition_true() {
        assert!(is_pod_ready(&pod_with_ready("True")));
        assert!(!is_pod_ready(&pod_with_ready("False")));
    }

    #[test]
    fn test_pod_without_status_is_not_ready() {
        let pod = Pod::default();
        assert!(!is_pod_ready(&pod));
    }

    #[test]
    fn test_pod_with_other_conditions_only_is_not_ready() {
        let pod = Pod {
            status: Some(PodStatus {
                conditions: Some(vec![PodCondition {
                    type_: "PodScheduled".to_string(),
                    status: "True".to_string(),
                    ..Default::default()
                }]),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert!(!is_pod_ready(&pod));
    }
}
