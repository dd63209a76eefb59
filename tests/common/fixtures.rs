//! Test fixtures for trigger integration tests.

use stagehand::{
    Artifact, ArtifactCredentials, InstanceId, Job, JobId, ProvisionedInstance, SourceLocation,
};

/// Builder for creating test job descriptors.
///
/// The defaults describe a complete, valid job: one `SourceArtifact` in the
/// pipeline bucket and a parameter blob naming bucket, notification target,
/// and launch template.
pub struct JobBuilder {
    id: String,
    artifacts: Vec<Artifact>,
    user_parameters: String,
}

impl JobBuilder {
    /// Creates a new job builder with the given job id.
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_owned(),
            artifacts: vec![source_artifact("pipeline-artifacts", "release/app/abc123.zip")],
            user_parameters: user_params("b1", "arn:sns:x", "lt-1"),
        }
    }

    /// Replaces the job's input artifacts.
    pub fn with_artifacts(mut self, artifacts: Vec<Artifact>) -> Self {
        self.artifacts = artifacts;
        self
    }

    /// Replaces the raw user parameter blob.
    pub fn with_user_parameters(mut self, raw: &str) -> Self {
        self.user_parameters = raw.to_owned();
        self
    }

    /// Builds the job.
    pub fn build(self) -> Job {
        Job {
            id: JobId::new(self.id),
            input_artifacts: self.artifacts,
            artifact_credentials: test_credentials(),
            user_parameters: self.user_parameters,
        }
    }

    /// Builds the job and encodes it as a wire descriptor.
    pub fn to_json(self) -> String {
        serde_json::to_string(&self.build()).unwrap()
    }
}

/// A `SourceArtifact` entry at the given location.
pub fn source_artifact(bucket: &str, key: &str) -> Artifact {
    named_artifact("SourceArtifact", bucket, key)
}

/// An arbitrary named artifact entry at the given location.
pub fn named_artifact(name: &str, bucket: &str, key: &str) -> Artifact {
    Artifact {
        name: name.to_owned(),
        location: SourceLocation {
            bucket: bucket.to_owned(),
            key: key.to_owned(),
        },
    }
}

/// Short-lived artifact credentials as the pipeline would mint them.
pub fn test_credentials() -> ArtifactCredentials {
    ArtifactCredentials {
        access_key_id: "ASIA-test".to_owned(),
        secret_access_key: "secret".to_owned(),
        session_token: "token".to_owned(),
    }
}

/// A user parameter blob with all three required keys.
pub fn user_params(bucket: &str, sns: &str, template: &str) -> String {
    format!(r#"{{"bucket":"{bucket}","sns":"{sns}","template":"{template}"}}"#)
}

/// The instance every test provisioning returns.
pub fn provisioned_instance() -> ProvisionedInstance {
    ProvisionedInstance {
        id: InstanceId::new("i-0abc12345"),
        network_id: "vpc-0abc".to_owned(),
        private_ip: "10.0.0.17".to_owned(),
        state: "pending".to_owned(),
    }
}
