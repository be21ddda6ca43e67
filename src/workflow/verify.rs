//! Verification job dispatcher
//!
//! Runs a one-shot write/read job against a streaming cluster's
//! controller endpoint and waits for its terminal state. Completion and
//! success are distinct signals: a job can report a completion timestamp
//! while also counting failed attempts, and both must be checked.

use k8s_openapi::api::batch::v1::{Job, JobSpec, JobStatus};
use k8s_openapi::api::core::v1::{Container, PodSpec, PodTemplateSpec};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::api::Api;
use kube::ResourceExt;
use tracing::info;

use crate::crd::StreamingCluster;
use crate::error::{OrchestratorError, Result};
use crate::poll::{poll_until, PollCheck};
use crate::workflow::WorkflowContext;

/// Build the one-shot write/read job targeting the cluster's controller
/// service address.
pub fn write_read_job(cluster: &StreamingCluster) -> Job {
    let cluster_name = cluster.metadata.name.as_deref().unwrap_or("streaming");
    Job {
        metadata: ObjectMeta {
            name: Some(format!("{}-write-read", cluster_name)),
            ..Default::default()
        },
        spec: Some(JobSpec {
            backoff_limit: Some(0),
            template: PodTemplateSpec {
                spec: Some(PodSpec {
                    containers: vec![Container {
                        name: "write-read".to_string(),
                        image: Some(
                            "ghcr.io/streamlinelabs/streamline-verify:latest".to_string(),
                        ),
                        args: Some(vec![
                            "--endpoint".to_string(),
                            cluster.controller_service_address(),
                        ]),
                        ..Default::default()
                    }],
                    restart_policy: Some("Never".to_string()),
                    ..Default::default()
                }),
                ..Default::default()
            },
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Classify one observed job status.
pub fn evaluate_job(status: &JobStatus) -> Result<PollCheck<()>> {
    if status.completion_time.is_none() {
        return Ok(PollCheck::NotYet("job not completed yet".to_string()));
    }
    let failed = status.failed.unwrap_or(0);
    if failed > 0 {
        return Err(OrchestratorError::ReportedFailure {
            reason: "VerificationFailed".to_string(),
            message: format!("write/read job completed with {} failed attempt(s)", failed),
        });
    }
    Ok(PollCheck::Ready(()))
}

/// Submit the job and wait for a clean completion.
pub async fn run_and_await(ctx: &WorkflowContext, job: &Job) -> Result<()> {
    let name = job.name_any();
    info!(job = %name, "dispatching verification job");
    ctx.resources.create(job).await?;

    let jobs: Api<Job> = Api::namespaced(ctx.resources.kube(), ctx.namespace());
    poll_until(
        &format!("verification job {} complete", name),
        ctx.timeouts.retry_interval,
        ctx.timeouts.verification_timeout,
        || async {
            let observed = jobs.get(&name).await?;
            evaluate_job(&observed.status.unwrap_or_default())
        },
    )
    .await?;

    info!(job = %name, "verification job succeeded");
    Ok(())
}

/// Run the standard write/read validation against the named cluster.
pub async fn verify_cluster(ctx: &WorkflowContext, name: &str) -> Result<()> {
    let cluster: StreamingCluster = ctx.resources.get(name).await?;
    run_and_await(ctx, &write_read_job(&cluster)).await
}
