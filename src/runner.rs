//! Job orchestration.
//!
//! One [`JobRunner::execute`] call drives a job descriptor through the whole
//! workflow: validate parameters, locate and stage the source artifact,
//! provision a build instance, wait for it to connect, dispatch the build
//! command. Any step failure is reported to the pipeline exactly once, with
//! a message naming the step that failed.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::artifact::{self, StagedArtifact, StoreFactory, SOURCE_ARTIFACT_NAME};
use crate::compute::{ComputeProvider, InstanceRequest};
use crate::config::WorkerConfig;
use crate::dispatch::DispatchRequest;
use crate::error::{TriggerError, TriggerResult};
use crate::params::JobParameters;
use crate::pipeline::PipelineController;
use crate::readiness;
use crate::remote::RemoteExecutor;
use crate::state::{Dispatched, JobRun, Located, Ready, Staged};
use crate::types::{InstanceId, Job, JobId, ProvisionedInstance};

/// Terminal outcome of one worker invocation.
#[derive(Debug, Clone)]
pub enum JobOutcome {
    /// Build command submitted; the instance owns the job from here.
    Dispatched {
        /// Job the command belongs to.
        job_id: JobId,
        /// Instance the command was sent to.
        instance_id: InstanceId,
        /// When the command was submitted.
        dispatched_at: DateTime<Utc>,
    },
    /// Job failed and the failure was delivered to the pipeline.
    Failed {
        /// Job that failed.
        job_id: JobId,
        /// Message the pipeline received.
        message: String,
    },
}

/// Orchestrates one job from descriptor to dispatched build command.
pub struct JobRunner {
    stores: Arc<dyn StoreFactory>,
    compute: Arc<dyn ComputeProvider>,
    remote: Arc<dyn RemoteExecutor>,
    pipeline: Arc<dyn PipelineController>,
    config: WorkerConfig,
}

impl JobRunner {
    /// Create a new runner over the given provider handles.
    #[must_use]
    pub fn new(
        stores: Arc<dyn StoreFactory>,
        compute: Arc<dyn ComputeProvider>,
        remote: Arc<dyn RemoteExecutor>,
        pipeline: Arc<dyn PipelineController>,
        config: WorkerConfig,
    ) -> Self {
        Self {
            stores,
            compute,
            remote,
            pipeline,
            config,
        }
    }

    /// Run one job descriptor to completion.
    ///
    /// Returns `Ok(JobOutcome::Dispatched)` when the build command was
    /// submitted, and `Ok(JobOutcome::Failed)` when a step failed and the
    /// failure report reached the pipeline. An `Err` means the pipeline knows
    /// nothing: either the descriptor itself could not be decoded, or the
    /// failure report could not be delivered.
    pub async fn execute(
        &self,
        descriptor: &str,
        cancel: &CancellationToken,
    ) -> TriggerResult<JobOutcome> {
        let job = Job::from_json(descriptor)?;
        let job_id = job.id.clone();
        info!(job = %job_id, artifacts = job.input_artifacts.len(), "job received");

        match self.run(job, cancel).await {
            Ok(run) => {
                let (_, state) = run.into_parts();
                info!(job = %job_id, instance = %state.instance.id, "build command dispatched");
                Ok(JobOutcome::Dispatched {
                    job_id,
                    instance_id: state.instance.id,
                    dispatched_at: state.dispatched_at,
                })
            }
            Err(err) => {
                let message = failure_message(&err);
                error!(job = %job_id, error = %err, "job failed; reporting to pipeline");
                self.pipeline.report_failure(&job_id, &message).await?;
                Ok(JobOutcome::Failed { job_id, message })
            }
        }
    }

    async fn run(
        &self,
        job: Job,
        cancel: &CancellationToken,
    ) -> TriggerResult<JobRun<Dispatched>> {
        let run = JobRun::receive(job);

        let params = JobParameters::parse(&run.job().user_parameters)?;
        let run = run.validate(params);

        let found =
            artifact::find_artifact(&run.job().input_artifacts, SOURCE_ARTIFACT_NAME)?.clone();
        let run = run.locate(found);

        let staged = self.stage_artifact(&run).await?;
        let run = run.stage(staged);

        let instance = self.provision_instance(&run).await?;
        let run = run.provision(instance);

        readiness::wait_until_connected(
            self.compute.as_ref(),
            &run.state().instance.id,
            &self.config.readiness,
            cancel,
        )
        .await?;
        let run = run.mark_ready();

        self.dispatch_command(&run).await?;
        Ok(run.dispatch(Utc::now()))
    }

    async fn stage_artifact(&self, run: &JobRun<Located>) -> TriggerResult<StagedArtifact> {
        let state = run.state();
        let source = self.stores.scoped(
            &state.artifact.location.bucket,
            &run.job().artifact_credentials,
        )?;
        let destination = self.stores.ambient(&state.params.storage_bucket)?;

        artifact::stage(
            source.as_ref(),
            destination.as_ref(),
            &state.artifact,
            &state.params.storage_bucket,
            run.job_id(),
        )
        .await
    }

    async fn provision_instance(
        &self,
        run: &JobRun<Staged>,
    ) -> TriggerResult<ProvisionedInstance> {
        let request =
            InstanceRequest::for_job(run.state().params.instance_template.clone(), run.job_id());
        let instance = self.compute.run_from_template(&request).await?;

        info!(
            instance = %instance.id,
            network = %instance.network_id,
            private_ip = %instance.private_ip,
            state = %instance.state,
            "instance provisioned"
        );

        Ok(instance)
    }

    async fn dispatch_command(&self, run: &JobRun<Ready>) -> TriggerResult<()> {
        let state = run.state();
        let request = DispatchRequest::for_job(
            &self.config.dispatch,
            &state.params,
            run.job_id(),
            &state.instance,
        );
        self.remote.send_command(&request).await
    }
}

impl fmt::Debug for JobRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobRunner")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Message delivered to the pipeline for a failed job.
fn failure_message(error: &TriggerError) -> String {
    match error.stage() {
        Some(stage) => format!("job failed at {stage}: {error}"),
        None => format!("job failed: {error}"),
    }
}
