//! Typestate pattern for the job workflow.
//!
//! This module encodes the strictly forward progression of a trigger run in
//! the type system. Each state carries exactly the products available at
//! that point, so a later step cannot compile against data an earlier step
//! has not produced, and out-of-order transitions are compile-time errors.
//!
//! There is no failed state: errors leave the machine through `Result` and
//! are translated into a single pipeline report by the runner.
//!
//! # Example
//!
//! ```ignore
//! let received = JobRun::receive(job);
//! let validated = received.validate(params);
//! let located = validated.locate(artifact);
//! // located.provision(instance) would not compile - staging comes first
//! ```

use chrono::{DateTime, Utc};

use crate::artifact::StagedArtifact;
use crate::params::JobParameters;
use crate::types::{Artifact, Job, JobId, ProvisionedInstance};

// =============================================================================
// State types
// =============================================================================

/// Marker trait for workflow states.
pub trait RunState: private::Sealed + Send + Sync {
    /// Get the state name for logging and error messages.
    fn name() -> &'static str;
}

mod private {
    pub trait Sealed {}
}

/// Job descriptor decoded, nothing validated yet.
#[derive(Debug, Clone, Copy)]
pub struct Received;

/// User parameters decoded and checked.
#[derive(Debug, Clone)]
pub struct Validated {
    /// Validated trigger parameters.
    pub params: JobParameters,
}

/// Source artifact resolved in the job's input list.
#[derive(Debug, Clone)]
pub struct Located {
    /// Validated trigger parameters.
    pub params: JobParameters,
    /// The artifact selected for staging.
    pub artifact: Artifact,
}

/// Artifact copied into the working bucket.
#[derive(Debug, Clone)]
pub struct Staged {
    /// Validated trigger parameters.
    pub params: JobParameters,
    /// Where the artifact blob landed.
    pub staged: StagedArtifact,
}

/// Compute instance requested and acknowledged by the provider.
#[derive(Debug, Clone)]
pub struct Provisioned {
    /// Validated trigger parameters.
    pub params: JobParameters,
    /// Where the artifact blob landed.
    pub staged: StagedArtifact,
    /// The instance the provider created.
    pub instance: ProvisionedInstance,
}

/// Instance reported a connected management state.
#[derive(Debug, Clone)]
pub struct Ready {
    /// Validated trigger parameters.
    pub params: JobParameters,
    /// Where the artifact blob landed.
    pub staged: StagedArtifact,
    /// The instance awaiting its build command.
    pub instance: ProvisionedInstance,
}

/// Build command submitted; the run is complete.
#[derive(Debug, Clone)]
pub struct Dispatched {
    /// The instance the command was sent to.
    pub instance: ProvisionedInstance,
    /// When the command was submitted.
    pub dispatched_at: DateTime<Utc>,
}

impl private::Sealed for Received {}
impl private::Sealed for Validated {}
impl private::Sealed for Located {}
impl private::Sealed for Staged {}
impl private::Sealed for Provisioned {}
impl private::Sealed for Ready {}
impl private::Sealed for Dispatched {}

impl RunState for Received {
    fn name() -> &'static str {
        "received"
    }
}

impl RunState for Validated {
    fn name() -> &'static str {
        "validated"
    }
}

impl RunState for Located {
    fn name() -> &'static str {
        "located"
    }
}

impl RunState for Staged {
    fn name() -> &'static str {
        "staged"
    }
}

impl RunState for Provisioned {
    fn name() -> &'static str {
        "provisioned"
    }
}

impl RunState for Ready {
    fn name() -> &'static str {
        "ready"
    }
}

impl RunState for Dispatched {
    fn name() -> &'static str {
        "dispatched"
    }
}

// =============================================================================
// JobRun parameterised by state
// =============================================================================

/// One trigger run in a specific workflow state.
///
/// The state parameter `S` determines which transitions are available and
/// which products of earlier steps can be read.
#[derive(Debug)]
pub struct JobRun<S: RunState> {
    job: Job,
    state: S,
}

impl<S: RunState> JobRun<S> {
    /// Get a reference to the job being run.
    #[must_use]
    pub const fn job(&self) -> &Job {
        &self.job
    }

    /// Get the job identifier.
    #[must_use]
    pub const fn job_id(&self) -> &JobId {
        &self.job.id
    }

    /// Get the products carried by the current state.
    #[must_use]
    pub const fn state(&self) -> &S {
        &self.state
    }

    /// Get the state name.
    #[must_use]
    pub fn state_name(&self) -> &'static str {
        S::name()
    }

    /// Split into the job and the current state's products.
    #[must_use]
    pub fn into_parts(self) -> (Job, S) {
        (self.job, self.state)
    }
}

// =============================================================================
// State transitions
// =============================================================================

impl JobRun<Received> {
    /// Begin a run for a freshly decoded job.
    #[must_use]
    pub const fn receive(job: Job) -> Self {
        Self {
            job,
            state: Received,
        }
    }

    /// Record the validated user parameters.
    #[must_use]
    pub fn validate(self, params: JobParameters) -> JobRun<Validated> {
        JobRun {
            job: self.job,
            state: Validated { params },
        }
    }
}

impl JobRun<Validated> {
    /// Record the resolved source artifact.
    #[must_use]
    pub fn locate(self, artifact: Artifact) -> JobRun<Located> {
        let Self { job, state } = self;
        JobRun {
            job,
            state: Located {
                params: state.params,
                artifact,
            },
        }
    }
}

impl JobRun<Located> {
    /// Record the staged artifact location.
    ///
    /// The source artifact reference is dropped here: no later step reads
    /// the pipeline's copy again.
    #[must_use]
    pub fn stage(self, staged: StagedArtifact) -> JobRun<Staged> {
        let Self { job, state } = self;
        JobRun {
            job,
            state: Staged {
                params: state.params,
                staged,
            },
        }
    }
}

impl JobRun<Staged> {
    /// Record the provisioned instance.
    #[must_use]
    pub fn provision(self, instance: ProvisionedInstance) -> JobRun<Provisioned> {
        let Self { job, state } = self;
        JobRun {
            job,
            state: Provisioned {
                params: state.params,
                staged: state.staged,
                instance,
            },
        }
    }
}

impl JobRun<Provisioned> {
    /// Record that the instance reported a connected management state.
    #[must_use]
    pub fn mark_ready(self) -> JobRun<Ready> {
        let Self { job, state } = self;
        JobRun {
            job,
            state: Ready {
                params: state.params,
                staged: state.staged,
                instance: state.instance,
            },
        }
    }
}

impl JobRun<Ready> {
    /// Record the submitted build command, completing the run.
    #[must_use]
    pub fn dispatch(self, dispatched_at: DateTime<Utc>) -> JobRun<Dispatched> {
        let Self { job, state } = self;
        JobRun {
            job,
            state: Dispatched {
                instance: state.instance,
                dispatched_at,
            },
        }
    }
}
