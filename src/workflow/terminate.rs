//! Termination verifier
//!
//! After a cluster resource is deleted, its reconciler tears down the
//! owned pods and volume claims asynchronously. This waits for both to
//! vanish under the cluster's label selector. Pods are checked first:
//! claims are only released once their mounting pods are gone, so the
//! reverse order would report false negatives.

use k8s_openapi::api::core::v1::{PersistentVolumeClaim, Pod};
use kube::api::{Api, ListParams};
use kube::ResourceExt;
use std::collections::BTreeMap;
use tracing::info;

use crate::error::Result;
use crate::poll::{poll_until, PollCheck};
use crate::workflow::WorkflowContext;

/// Render labels as a Kubernetes label-selector string.
pub fn selector_string(labels: &BTreeMap<String, String>) -> String {
    labels
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join(",")
}

/// Names of the resources still present in a listing.
fn remaining_names<T: ResourceExt>(items: &[T]) -> Vec<String> {
    items.iter().map(|item| item.name_any()).collect()
}

/// A phase completes only when its own listing is empty; survivors keep
/// the phase waiting regardless of what the other phase reports.
fn phase_complete(noun: &str, survivors: Vec<String>) -> PollCheck<()> {
    if survivors.is_empty() {
        PollCheck::Ready(())
    } else {
        PollCheck::NotYet(format!("{} still present: {:?}", noun, survivors))
    }
}

/// Wait until no pods, then no persistent volume claims, match `labels`
/// in the workflow namespace.
pub async fn wait_for_gone(ctx: &WorkflowContext, labels: &BTreeMap<String, String>) -> Result<()> {
    let selector = selector_string(labels);
    let params = ListParams::default().labels(&selector);
    info!(%selector, "waiting for owned resources to terminate");

    let pods: Api<Pod> = Api::namespaced(ctx.resources.kube(), ctx.namespace());
    poll_until(
        &format!("pods gone ({})", selector),
        ctx.timeouts.retry_interval,
        ctx.timeouts.terminate_timeout,
        || async {
            let listed = pods.list(&params).await?;
            Ok(phase_complete("pods", remaining_names(&listed.items)))
        },
    )
    .await?;

    let claims: Api<PersistentVolumeClaim> = Api::namespaced(ctx.resources.kube(), ctx.namespace());
    poll_until(
        &format!("volume claims gone ({})", selector),
        ctx.timeouts.retry_interval,
        ctx.timeouts.terminate_timeout,
        || async {
            let listed = claims.list(&params).await?;
            Ok(phase_complete(
                "volume claims",
                remaining_names(&listed.items),
            ))
        },
    )
    .await?;

    info!(%selector, "owned resources terminated");
    Ok(())
}
