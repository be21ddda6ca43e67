//! Convergent reset of the bulk-storage claim
//!
//! Delete-if-present, wait for confirmed absence, recreate from the same
//! fixed declarative spec. The bootstrap workflow runs this after both
//! tiers are ready because stale bulk-storage state left by a previous
//! run makes the streaming tier misbehave; that defect is in the storage
//! environment, not in this orchestrator, and the compensating reset is
//! kept until it is fixed there.

use k8s_openapi::api::core::v1::{
    PersistentVolumeClaim, PersistentVolumeClaimSpec, VolumeResourceRequirements,
};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use std::collections::BTreeMap;
use tracing::info;

use crate::error::Result;
use crate::poll::{poll_until, PollCheck};
use crate::workflow::WorkflowContext;

/// Default name of the shared bulk-storage claim
pub const BULK_STORAGE_CLAIM: &str = "streaming-bulk-storage";

/// The fixed declarative spec for the bulk-storage claim. Shared by all
/// segment stores, hence ReadWriteMany.
pub fn bulk_storage_claim() -> PersistentVolumeClaim {
    PersistentVolumeClaim {
        metadata: ObjectMeta {
            name: Some(BULK_STORAGE_CLAIM.to_string()),
            ..Default::default()
        },
        spec: Some(PersistentVolumeClaimSpec {
            access_modes: Some(vec!["ReadWriteMany".to_string()]),
            resources: Some(VolumeResourceRequirements {
                requests: Some(BTreeMap::from([(
                    "storage".to_string(),
                    Quantity("20Gi".to_string()),
                )])),
                ..Default::default()
            }),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Force the bulk-storage claim to a known fresh state.
///
/// Idempotent: when the claim is already absent this skips straight to
/// creation, so repeated invocations converge on the same observed spec.
pub async fn reset_bulk_storage(ctx: &WorkflowContext) -> Result<()> {
    info!(claim = BULK_STORAGE_CLAIM, "resetting bulk storage");

    match ctx
        .resources
        .get::<PersistentVolumeClaim>(BULK_STORAGE_CLAIM)
        .await
    {
        Ok(_) => {
            ctx.resources
                .delete::<PersistentVolumeClaim>(BULK_STORAGE_CLAIM)
                .await?;
        }
        Err(err) if err.is_not_found() => {
            info!(claim = BULK_STORAGE_CLAIM, "claim already absent");
        }
        Err(err) => return Err(err),
    }

    poll_until(
        &format!("bulk-storage claim {} absent", BULK_STORAGE_CLAIM),
        ctx.timeouts.retry_interval,
        ctx.timeouts.reset_timeout,
        || async {
            match ctx
                .resources
                .get::<PersistentVolumeClaim>(BULK_STORAGE_CLAIM)
                .await
            {
                Ok(_) => Ok(PollCheck::NotYet("claim still present".to_string())),
                Err(err) if err.is_not_found() => Ok(PollCheck::Ready(())),
                Err(err) => Err(err),
            }
        },
    )
    .await?;

    ctx.resources.create(&bulk_storage_claim()).await?;
    info!(claim = BULK_STORAGE_CLAIM, "bulk storage reset complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claim_spec_is_fixed_and_shared() {
        let claim = bulk_storage_claim();
        assert_eq!(claim.metadata.name.as_deref(), Some(BULK_STORAGE_CLAIM));

        let spec = claim.spec.unwrap();
        assert_eq!(
            spec.access_modes,
            Some(vec!["ReadWriteMany".to_string()])
        );
        let requests = spec.resources.unwrap().requests.unwrap();
        assert_eq!(requests.get("storage"), Some(&Quantity("20Gi".to_string())));
    }

    #[test]
    fn test_repeated_builds_yield_identical_spec() {
        // The reset recreates from this function every time; two builds
        // must not drift.
        let a = serde_json::to_value(bulk_storage_claim()).unwrap();
        let b = serde_json::to_value(bulk_storage_claim()).unwrap();
        assert_eq!(a, b);
    }
}
