//! Streamline Lifecycle Orchestrator CLI
//!
//! One-shot workflow invocations against a live cluster:
//!
//! ```bash
//! # Re-establish the ready baseline (requires kubeconfig)
//! streamline-orchestrator --namespace staging bootstrap
//!
//! # Run with custom log level
//! RUST_LOG=debug streamline-orchestrator bootstrap
//! ```

use clap::{Parser, Subcommand};
use kube::Client;
use streamline_orchestrator::workflow::{reset, restart, upgrade, verify, WorkflowContext};
use streamline_orchestrator::{
    bootstrap, teardown, BootstrapSpec, ResourceClient, StreamingCluster, Timeouts,
};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Streamline Lifecycle Orchestrator
#[derive(Parser, Debug)]
#[command(name = "streamline-orchestrator")]
#[command(version, about = "Workflow driver for Streamline cluster lifecycles")]
struct Args {
    /// Namespace the workflow operates in
    #[arg(long, default_value = "default")]
    namespace: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Tear down and redeploy the coordination and journal tiers, then
    /// reset bulk storage
    Bootstrap {
        /// Coordination cluster size for the baseline
        #[arg(long, default_value_t = 1)]
        coordination_replicas: i32,

        /// Journal cluster size for the baseline
        #[arg(long, default_value_t = 3)]
        journal_replicas: i32,
    },
    /// Bump a streaming cluster to a target version and wait for the
    /// rollout
    Upgrade {
        /// Name of the StreamingCluster
        #[arg(long, default_value = "streaming")]
        name: String,

        /// Version to upgrade to
        #[arg(long)]
        target_version: String,
    },
    /// Run the write/read verification job against a streaming cluster
    Verify {
        /// Name of the StreamingCluster
        #[arg(long, default_value = "streaming")]
        name: String,
    },
    /// Confirm every pod of a streaming cluster cycled through a rolling
    /// restart after a config change
    ConfirmRestart {
        /// Name of the StreamingCluster
        #[arg(long, default_value = "streaming")]
        name: String,
    },
    /// Delete-wait-recreate the bulk-storage claim
    Reset,
    /// Remove the coordination and journal tiers and wait for full
    /// termination
    Teardown {
        /// Name of the CoordinationCluster
        #[arg(long, default_value = "coordination")]
        coordination_name: String,

        /// Name of the JournalCluster
        #[arg(long, default_value = "journal")]
        journal_name: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    let args = Args::parse();

    info!("Starting Streamline Lifecycle Orchestrator");
    info!("Operating in namespace: {}", args.namespace);

    let client = Client::try_default().await?;
    info!("Connected to Kubernetes API server");

    let resources = ResourceClient::new(client, &args.namespace, Timeouts::default());
    let ctx = WorkflowContext::new(resources, Timeouts::default());

    let outcome = match &args.command {
        Command::Bootstrap {
            coordination_replicas,
            journal_replicas,
        } => {
            let spec = BootstrapSpec {
                coordination_replicas: *coordination_replicas,
                journal_replicas: *journal_replicas,
                ..BootstrapSpec::default()
            };
            bootstrap(&ctx, &spec).await
        }
        Command::Upgrade {
            name,
            target_version,
        } => upgrade::upgrade(&ctx, name, target_version).await,
        Command::Verify { name } => verify::verify_cluster(&ctx, name).await,
        Command::ConfirmRestart { name } => {
            let cluster: StreamingCluster = ctx.resources.get(name).await?;
            restart::wait_for_rolling_restart(&ctx, &cluster.selector_labels()).await
        }
        Command::Reset => reset::reset_bulk_storage(&ctx).await,
        Command::Teardown {
            coordination_name,
            journal_name,
        } => {
            let spec = BootstrapSpec {
                coordination_name: coordination_name.clone(),
                journal_name: journal_name.clone(),
                ..BootstrapSpec::default()
            };
            teardown(&ctx, &spec).await
        }
    };

    if let Err(err) = outcome {
        error!("Workflow failed: {}", err);
        // Converge anything this run created back to deletion before
        // surfacing the failure.
        ctx.resources.cleanup().await;
        return Err(err.into());
    }

    info!("Workflow complete");
    Ok(())
}
