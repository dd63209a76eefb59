//! Error types for the deployment trigger.

use std::fmt;

/// Result type alias using [`TriggerError`].
pub type TriggerResult<T> = Result<T, TriggerError>;

/// The workflow step a failure is attributed to.
///
/// Stage names appear verbatim in the failure message reported to the
/// pipeline, so operators can tell at a glance how far a job got.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStage {
    /// Decoding and validating the user-supplied parameters.
    ValidateParameters,
    /// Resolving the source artifact in the job's input list.
    LocateArtifact,
    /// Copying the artifact into the working bucket.
    StageArtifact,
    /// Requesting a new instance from the compute provider.
    ProvisionInstance,
    /// Polling the instance's management connection.
    WaitForReadiness,
    /// Submitting the remote build command.
    DispatchCommand,
}

impl fmt::Display for JobStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ValidateParameters => write!(f, "validate-parameters"),
            Self::LocateArtifact => write!(f, "locate-artifact"),
            Self::StageArtifact => write!(f, "stage-artifact"),
            Self::ProvisionInstance => write!(f, "provision-instance"),
            Self::WaitForReadiness => write!(f, "wait-for-readiness"),
            Self::DispatchCommand => write!(f, "dispatch-command"),
        }
    }
}

/// Errors that can occur while running a trigger job.
#[derive(Debug, thiserror::Error)]
pub enum TriggerError {
    /// Job descriptor could not be decoded. No job id is available, so this
    /// failure cannot be reported to the pipeline.
    #[error("job descriptor invalid: {0}")]
    Descriptor(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// User parameters were not valid JSON.
    #[error("user parameters invalid: {0}")]
    ParameterDecode(String),

    /// A required user parameter was absent or empty.
    #[error("missing required parameter: {name}")]
    MissingParameter {
        /// Name of the absent parameter key.
        name: &'static str,
    },

    /// Named artifact absent from the job's input list.
    #[error("artifact not found: {0}")]
    ArtifactNotFound(String),

    /// Artifact copy to the working bucket failed.
    #[error("artifact staging failed: {0}")]
    Staging(String),

    /// Compute provider rejected the instance request.
    #[error("provisioning error: {0}")]
    Provisioning(String),

    /// Connection status poll could not be completed.
    #[error("connection status check failed: {0}")]
    StatusCheck(String),

    /// Instance never reported a connected management state.
    #[error("instance {instance_id} not connected after {budget_secs}s (last status: {last_status})")]
    ReadinessTimeout {
        /// Identifier of the instance being polled.
        instance_id: String,
        /// Overall wait budget that was exhausted.
        budget_secs: u64,
        /// Status reported by the final poll.
        last_status: String,
    },

    /// Remote command submission was rejected.
    #[error("command dispatch failed: {0}")]
    Dispatch(String),

    /// The failure report itself could not be delivered to the pipeline.
    #[error("failure report not delivered: {0}")]
    Report(String),

    /// Run was cancelled by a shutdown signal.
    #[error("job cancelled by shutdown")]
    Cancelled,

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl TriggerError {
    /// Create a staging error.
    #[must_use]
    pub fn staging(msg: impl Into<String>) -> Self {
        Self::Staging(msg.into())
    }

    /// Create a provisioning error.
    #[must_use]
    pub fn provisioning(msg: impl Into<String>) -> Self {
        Self::Provisioning(msg.into())
    }

    /// Create a status check error.
    #[must_use]
    pub fn status_check(msg: impl Into<String>) -> Self {
        Self::StatusCheck(msg.into())
    }

    /// Create a dispatch error.
    #[must_use]
    pub fn dispatch(msg: impl Into<String>) -> Self {
        Self::Dispatch(msg.into())
    }

    /// Create a report-delivery error.
    #[must_use]
    pub fn report(msg: impl Into<String>) -> Self {
        Self::Report(msg.into())
    }

    /// Create an internal error.
    #[must_use]
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// The workflow stage this error is attributed to.
    ///
    /// Returns `None` for failures outside the job workflow: an undecodable
    /// descriptor, service configuration problems, a failed failure report,
    /// and internal errors.
    #[must_use]
    pub const fn stage(&self) -> Option<JobStage> {
        match self {
            Self::ParameterDecode(_) | Self::MissingParameter { .. } => {
                Some(JobStage::ValidateParameters)
            }
            Self::ArtifactNotFound(_) => Some(JobStage::LocateArtifact),
            Self::Staging(_) => Some(JobStage::StageArtifact),
            Self::Provisioning(_) => Some(JobStage::ProvisionInstance),
            Self::StatusCheck(_) | Self::ReadinessTimeout { .. } | Self::Cancelled => {
                Some(JobStage::WaitForReadiness)
            }
            Self::Dispatch(_) => Some(JobStage::DispatchCommand),
            Self::Descriptor(_) | Self::Config(_) | Self::Report(_) | Self::Internal(_) => None,
        }
    }
}
