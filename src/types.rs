//! Core types for the deployment trigger.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{TriggerError, TriggerResult};

/// Unique identifier for a pipeline job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    /// Create a new job ID.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for JobId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Unique identifier for a provisioned compute instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstanceId(String);

impl InstanceId {
    /// Create a new instance ID.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for InstanceId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Location of an artifact in the pipeline's object store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    /// Bucket holding the artifact.
    pub bucket: String,
    /// Object key within the bucket.
    pub key: String,
}

/// A named input artifact from an upstream pipeline stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    /// Artifact name as assigned by the pipeline.
    pub name: String,
    /// Where the artifact blob lives.
    pub location: SourceLocation,
}

/// Short-lived credentials scoped to the job's input artifacts.
///
/// These come with the job descriptor and are only valid for reading the
/// pipeline's own artifact store. They must never be used for the working
/// bucket, which is accessed with the process identity instead.
#[derive(Clone, Serialize, Deserialize)]
pub struct ArtifactCredentials {
    /// Access key identifier.
    pub access_key_id: String,
    /// Secret access key.
    pub secret_access_key: String,
    /// Session token for the temporary credentials.
    pub session_token: String,
}

impl fmt::Debug for ArtifactCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArtifactCredentials")
            .field("access_key_id", &self.access_key_id)
            .finish_non_exhaustive()
    }
}

/// A pipeline job as delivered to the trigger.
///
/// Immutable once received; one `Job` drives exactly one orchestration run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    /// Unique job identifier assigned by the pipeline.
    pub id: JobId,
    /// Artifacts produced by upstream stages.
    pub input_artifacts: Vec<Artifact>,
    /// Credentials for reading the input artifacts.
    pub artifact_credentials: ArtifactCredentials,
    /// Free-form configuration blob supplied by the pipeline author.
    pub user_parameters: String,
}

impl Job {
    /// Decode a job descriptor from its JSON wire form.
    pub fn from_json(raw: &str) -> TriggerResult<Self> {
        serde_json::from_str(raw).map_err(|e| TriggerError::Descriptor(e.to_string()))
    }
}

/// Descriptor of a compute instance returned by the provider.
///
/// Owned by the compute provider once created; this worker only observes it
/// and never mutates it after provisioning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisionedInstance {
    /// Instance identifier.
    pub id: InstanceId,
    /// Identifier of the network the instance was placed in.
    pub network_id: String,
    /// Private address reachable from within that network.
    pub private_ip: String,
    /// Lifecycle state as reported by the provider, observed only.
    pub state: String,
}
