//! Stagehand Deployment Trigger
//!
//! This crate implements a one-shot worker that a delivery pipeline invokes
//! to hand a job off to a build instance. It stages the job's source bundle,
//! provisions an instance, waits for the instance to come online, and
//! dispatches the remote build command. The build itself, and the job's
//! eventual completion, happen on the instance.
//!
//! # Architecture
//!
//! The worker is responsible for:
//!
//! - **Parameter validation**: Decoding the pipeline author's configuration
//!   blob and rejecting jobs with missing settings before anything external
//!   is touched
//! - **Artifact staging**: Copying the source bundle from the pipeline's
//!   bucket into the working bucket, across two credential domains
//! - **Instance provisioning**: Launching one instance per job from a launch
//!   template, tagged with the job id
//! - **Command dispatch**: Sending the build script invocation once the
//!   instance's management agent reports connected
//! - **Failure reporting**: Telling the pipeline, exactly once, when and
//!   where a job failed
//!
//! # State Machine
//!
//! A job run follows a strict state machine enforced at compile time using
//! the typestate pattern:
//!
//! ```text
//! Received ──▶ Validated ──▶ Located ──▶ Staged ──▶ Provisioned ──▶ Ready ──▶ Dispatched
//! ```
//!
//! Each transition carries the step's product (parameters, artifact, staged
//! location, instance) forward, so later steps can only read what earlier
//! steps actually produced. Invalid orderings are caught at compile time,
//! not runtime.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//!
//! use stagehand::{
//!     HttpComputeProvider, HttpPipelineClient, HttpRemoteExecutor, JobRunner, S3StoreFactory,
//!     WorkerConfig,
//! };
//! use tokio_util::sync::CancellationToken;
//!
//! let config = WorkerConfig::load()?;
//! let runner = JobRunner::new(
//!     Arc::new(S3StoreFactory::new(config.stores.clone())),
//!     Arc::new(HttpComputeProvider::new(&config.compute)?),
//!     Arc::new(HttpRemoteExecutor::new(&config.remote)?),
//!     Arc::new(HttpPipelineClient::new(&config.pipeline)?),
//!     config,
//! );
//!
//! let outcome = runner.execute(&descriptor, &CancellationToken::new()).await?;
//! ```

#![doc = include_str!("../README.md")]
#![forbid(unsafe_code)]

pub mod artifact;
pub mod compute;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod params;
pub mod pipeline;
pub mod readiness;
pub mod remote;
pub mod runner;
pub mod state;
pub mod types;

// Re-export commonly used types at the crate root
pub use artifact::{
    MemoryStoreFactory, S3StoreFactory, StagedArtifact, StoreFactory, SOURCE_ARTIFACT_NAME,
};
pub use compute::{
    ComputeProvider, ConnectionStatus, HttpComputeProvider, InstanceRequest, MockComputeProvider,
};
pub use config::WorkerConfig;
pub use dispatch::DispatchRequest;
pub use error::{JobStage, TriggerError, TriggerResult};
pub use params::JobParameters;
pub use pipeline::{HttpPipelineClient, PipelineController, RecordingReporter};
pub use readiness::wait_until_connected;
pub use remote::{HttpRemoteExecutor, MockRemoteExecutor, RemoteExecutor};
pub use runner::{JobOutcome, JobRunner};
pub use state::{
    Dispatched, JobRun, Located, Provisioned, Ready, Received, RunState, Staged, Validated,
};
pub use types::{
    Artifact, ArtifactCredentials, InstanceId, Job, JobId, ProvisionedInstance, SourceLocation,
};
