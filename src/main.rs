//! Stagehand deployment trigger binary.
//!
//! One-shot worker: reads a job descriptor from stdin, runs the trigger
//! workflow, and exits. Exit status 0 means the pipeline knows the job's
//! fate (build command dispatched, or failure reported); non-zero means it
//! does not.

use std::sync::Arc;

use tokio::io::AsyncReadExt;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use stagehand::{
    HttpComputeProvider, HttpPipelineClient, HttpRemoteExecutor, JobOutcome, JobRunner,
    S3StoreFactory, WorkerConfig,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialise tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("stagehand=info".parse()?))
        .init();

    info!("Stagehand deployment trigger starting");

    // Load configuration
    let config = WorkerConfig::load().unwrap_or_else(|e| {
        info!(error = %e, "failed to load config, using defaults");
        WorkerConfig::default()
    });

    info!(
        compute = %config.compute.url,
        remote = %config.remote.url,
        pipeline = %config.pipeline.url,
        "configuration loaded"
    );

    let mut descriptor = String::new();
    tokio::io::stdin().read_to_string(&mut descriptor).await?;

    let runner = JobRunner::new(
        Arc::new(S3StoreFactory::new(config.stores.clone())),
        Arc::new(HttpComputeProvider::new(&config.compute)?),
        Arc::new(HttpRemoteExecutor::new(&config.remote)?),
        Arc::new(HttpPipelineClient::new(&config.pipeline)?),
        config,
    );

    let cancel = CancellationToken::new();
    let cancel_on_signal = cancel.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        info!("Shutdown signal received, cancelling the run");
        cancel_on_signal.cancel();
    });

    match runner.execute(&descriptor, &cancel).await {
        Ok(JobOutcome::Dispatched {
            job_id,
            instance_id,
            ..
        }) => {
            info!(job = %job_id, instance = %instance_id, "trigger complete");
            Ok(())
        }
        Ok(JobOutcome::Failed { job_id, message }) => {
            info!(job = %job_id, message = %message, "job failure reported to pipeline");
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "trigger run failed without reaching the pipeline");
            Err(e.into())
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C");
        }
        () = terminate => {
            info!("Received SIGTERM");
        }
    }
}
