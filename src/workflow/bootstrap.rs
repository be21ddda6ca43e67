//! Dependency-ordered bootstrap workflow
//!
//! Brings the coordination and journal tiers from any prior state to a
//! known ready baseline. The ordering lives in one inspectable list of
//! stage descriptors; the driver runs them strictly in order and aborts
//! on the first error. There is no partial rollback: teardown stages are
//! idempotent, so a failed run is retried from scratch.

use async_trait::async_trait;
use std::collections::BTreeMap;
use tracing::{error, info};

use crate::crd::{
    CoordinationCluster, CoordinationClusterSpec, JournalCluster, JournalClusterSpec, Persistence,
    VolumeReclaimPolicy,
};
use crate::error::Result;
use crate::workflow::{reset, terminate, wait_for_absence, wait_for_ready, WorkflowContext};

/// Names and sizes for the baseline topology
#[derive(Debug, Clone)]
pub struct BootstrapSpec {
    pub coordination_name: String,
    pub coordination_replicas: i32,
    pub journal_name: String,
    pub journal_replicas: i32,
}

impl Default for BootstrapSpec {
    fn default() -> Self {
        // A single coordination server is enough for a baseline; the
        // journal quorum needs three.
        Self {
            coordination_name: "coordination".to_string(),
            coordination_replicas: 1,
            journal_name: "journal".to_string(),
            journal_replicas: 3,
        }
    }
}

/// One step of the bootstrap sequence
#[async_trait]
pub trait Stage: Send + Sync {
    /// Stage name for logging and inspection
    fn name(&self) -> &'static str;

    /// Execute the stage to completion, including its convergence wait
    async fn execute(&self, ctx: &WorkflowContext) -> Result<()>;
}

fn app_labels(name: &str) -> BTreeMap<String, String> {
    BTreeMap::from([("app".to_string(), name.to_string())])
}

/// Delete the journal cluster if present and wait for its pods and
/// volume claims to disappear.
struct TearDownJournal {
    name: String,
}

#[async_trait]
impl Stage for TearDownJournal {
    fn name(&self) -> &'static str {
        "tear-down-journal"
    }

    async fn execute(&self, ctx: &WorkflowContext) -> Result<()> {
        ctx.resources.delete::<JournalCluster>(&self.name).await?;
        wait_for_absence::<JournalCluster>(ctx, &self.name).await?;
        terminate::wait_for_gone(ctx, &app_labels(&self.name)).await
    }
}

/// Delete the coordination cluster if present and wait for full
/// termination. Runs after the journal teardown: a live journal would
/// keep re-registering against coordination.
struct TearDownCoordination {
    name: String,
}

#[async_trait]
impl Stage for TearDownCoordination {
    fn name(&self) -> &'static str {
        "tear-down-coordination"
    }

    async fn execute(&self, ctx: &WorkflowContext) -> Result<()> {
        ctx.resources
            .delete::<CoordinationCluster>(&self.name)
            .await?;
        wait_for_absence::<CoordinationCluster>(ctx, &self.name).await?;
        terminate::wait_for_gone(ctx, &app_labels(&self.name)).await
    }
}

/// Create the coordination cluster and wait until it is ready.
struct DeployCoordination {
    name: String,
    replicas: i32,
}

#[async_trait]
impl Stage for DeployCoordination {
    fn name(&self) -> &'static str {
        "deploy-coordination"
    }

    async fn execute(&self, ctx: &WorkflowContext) -> Result<()> {
        let mut spec: CoordinationClusterSpec = serde_json::from_str("{}")?;
        spec.replicas = self.replicas;
        // Bootstrap volumes must not survive the next teardown cycle.
        spec.persistence = Persistence {
            volume_reclaim_policy: VolumeReclaimPolicy::Delete,
            ..Persistence::default()
        };

        let cluster = CoordinationCluster::new(&self.name, spec);
        ctx.resources.create(&cluster).await?;
        wait_for_ready::<CoordinationCluster>(ctx, &self.name, self.replicas).await
    }
}

/// Create the journal cluster wired to the coordination tier and wait
/// until it is ready.
struct DeployJournal {
    name: String,
    replicas: i32,
    coordination_name: String,
}

#[async_trait]
impl Stage for DeployJournal {
    fn name(&self) -> &'static str {
        "deploy-journal"
    }

    async fn execute(&self, ctx: &WorkflowContext) -> Result<()> {
        let coordination: CoordinationCluster =
            ctx.resources.get(&self.coordination_name).await?;

        let mut spec: JournalClusterSpec = serde_json::from_str("{}")?;
        spec.replicas = self.replicas;
        spec.coordination_uri = coordination.client_service_address();

        let cluster = JournalCluster::new(&self.name, spec);
        ctx.resources.create(&cluster).await?;
        wait_for_ready::<JournalCluster>(ctx, &self.name, self.replicas).await
    }
}

/// Compensating reset of the bulk-storage claim (see the reset module
/// for why this runs on every bootstrap).
struct ResetBulkStorage;

#[async_trait]
impl Stage for ResetBulkStorage {
    fn name(&self) -> &'static str {
        "reset-bulk-storage"
    }

    async fn execute(&self, ctx: &WorkflowContext) -> Result<()> {
        reset::reset_bulk_storage(ctx).await
    }
}

/// The teardown stage list. The journal goes first: a live journal
/// would keep re-registering against coordination while coordination
/// drains.
pub fn teardown_stages(spec: &BootstrapSpec) -> Vec<Box<dyn Stage>> {
    vec![
        Box::new(TearDownJournal {
            name: spec.journal_name.clone(),
        }),
        Box::new(TearDownCoordination {
            name: spec.coordination_name.clone(),
        }),
    ]
}

/// The ordered stage list. Journal teardown precedes coordination
/// teardown; coordination deploy precedes journal deploy; the storage
/// reset runs last.
pub fn bootstrap_stages(spec: &BootstrapSpec) -> Vec<Box<dyn Stage>> {
    let mut stages = teardown_stages(spec);
    stages.push(Box::new(DeployCoordination {
        name: spec.coordination_name.clone(),
        replicas: spec.coordination_replicas,
    }));
    stages.push(Box::new(DeployJournal {
        name: spec.journal_name.clone(),
        replicas: spec.journal_replicas,
        coordination_name: spec.coordination_name.clone(),
    }));
    stages.push(Box::new(ResetBulkStorage));
    stages
}

/// Run stages strictly in order, aborting on the first error.
pub async fn run_stages(ctx: &WorkflowContext, stages: Vec<Box<dyn Stage>>) -> Result<()> {
    for stage in stages {
        info!(stage = stage.name(), "running stage");
        if let Err(err) = stage.execute(ctx).await {
            error!(stage = stage.name(), error = %err, "stage failed");
            return Err(err);
        }
        info!(stage = stage.name(), "stage complete");
    }
    Ok(())
}

/// Bring the coordination and journal tiers to the ready baseline.
pub async fn bootstrap(ctx: &WorkflowContext, spec: &BootstrapSpec) -> Result<()> {
    info!(namespace = ctx.namespace(), "starting bootstrap");
    run_stages(ctx, bootstrap_stages(spec)).await?;
    info!(namespace = ctx.namespace(), "bootstrap complete");
    Ok(())
}

/// Remove both tiers and wait for full termination. Safe to run against
/// a namespace where neither cluster exists.
pub async fn teardown(ctx: &WorkflowContext, spec: &BootstrapSpec) -> Result<()> {
    info!(namespace = ctx.namespace(), "starting teardown");
    run_stages(ctx, teardown_stages(spec)).await?;
    info!(namespace = ctx.namespace(), "teardown complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ResourceClient;
    use crate::config::Timeouts;
    use crate::error::OrchestratorError;
    use std::sync::{Arc, Mutex};

    fn offline_ctx() -> WorkflowContext {
        let config = kube::Config::new("http://localhost:8080".parse().unwrap());
        let client = kube::Client::try_from(config).unwrap();
        WorkflowContext::new(
            ResourceClient::new(client, "default", Timeouts::default()),
            Timeouts::default(),
        )
    }

    struct Recording {
        name: &'static str,
        fail: bool,
        log: Arc<Mutex<Vec<&'static str>>>,
    }

    #[async_trait]
    impl Stage for Recording {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn execute(&self, _ctx: &WorkflowContext) -> Result<()> {
            self.log.lock().unwrap().push(self.name);
            if self.fail {
                Err(OrchestratorError::Configuration("boom".to_string()))
            } else {
                Ok(())
            }
        }
    }

    #[tokio::test]
    async fn test_run_stages_aborts_on_first_error() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let stages: Vec<Box<dyn Stage>> = vec![
            Box::new(Recording {
                name: "first",
                fail: false,
                log: Arc::clone(&log),
            }),
            Box::new(Recording {
                name: "second",
                fail: true,
                log: Arc::clone(&log),
            }),
            Box::new(Recording {
                name: "third",
                fail: false,
                log: Arc::clone(&log),
            }),
        ];

        let result = run_stages(&offline_ctx(), stages).await;
        assert!(matches!(result, Err(OrchestratorError::Configuration(_))));
        assert_eq!(*log.lock().unwrap(), vec!["first", "second"]);
    }

    #[test]
    fn test_stage_order_honors_dependencies() {
        let stages = bootstrap_stages(&BootstrapSpec::default());
        let names: Vec<&str> = stages.iter().map(|s| s.name()).collect();
        assert_eq!(
            names,
            vec![
                "tear-down-journal",
                "tear-down-coordination",
                "deploy-coordination",
                "deploy-journal",
                "reset-bulk-storage",
            ]
        );
    }

    #[test]
    fn test_teardown_removes_journal_before_coordination() {
        let stages = teardown_stages(&BootstrapSpec::default());
        let names: Vec<&str> = stages.iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["tear-down-journal", "tear-down-coordination"]);
    }

    #[test]
    fn test_default_spec_sizes() {
        let spec = BootstrapSpec::default();
        assert_eq!(spec.coordination_replicas, 1);
        assert_eq!(spec.journal_replicas, 3);
    }
}
