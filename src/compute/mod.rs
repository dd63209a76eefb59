//! Compute provider for build instance lifecycle.
//!
//! The worker launches one instance per job from a pre-baked launch template
//! and then polls the provider until the instance's management agent reports
//! a connected state. The provider itself is behind a trait so tests can
//! script provisioning outcomes and status sequences.

mod http;

pub use http::HttpComputeProvider;

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::{TriggerError, TriggerResult};
use crate::types::{InstanceId, JobId, ProvisionedInstance};

/// Tag key that links a provisioned instance back to its job.
pub const JOB_TAG_KEY: &str = "job_id";

/// A key/value tag applied to a provisioned instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tag {
    /// Tag key.
    pub key: String,
    /// Tag value.
    pub value: String,
}

/// Request to launch an instance from a template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstanceRequest {
    /// Launch template the instance is created from.
    pub template: String,
    /// Tags applied at launch.
    pub tags: Vec<Tag>,
}

impl InstanceRequest {
    /// Build the launch request for a job: one instance from the job's
    /// template, tagged with the job id for traceability.
    #[must_use]
    pub fn for_job(template: impl Into<String>, job_id: &JobId) -> Self {
        Self {
            template: template.into(),
            tags: vec![Tag {
                key: JOB_TAG_KEY.to_owned(),
                value: job_id.to_string(),
            }],
        }
    }
}

/// Management connection status reported by the compute provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionStatus {
    /// Agent is connected; the instance can receive commands.
    Connected,
    /// Agent has not connected yet.
    NotConnected,
    /// Any other status string the provider reports.
    Other(String),
}

impl ConnectionStatus {
    /// Parse a status string from the provider (case-insensitive).
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "connected" => Self::Connected,
            "notconnected" => Self::NotConnected,
            _ => Self::Other(raw.to_owned()),
        }
    }

    /// Whether the instance is ready to receive commands.
    #[must_use]
    pub const fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }

    /// String form, preserving unrecognised statuses verbatim.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Connected => "connected",
            Self::NotConnected => "notconnected",
            Self::Other(raw) => raw,
        }
    }
}

impl std::fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Trait for compute provider implementations.
#[async_trait]
pub trait ComputeProvider: Send + Sync {
    /// Launch an instance from a template.
    async fn run_from_template(
        &self,
        request: &InstanceRequest,
    ) -> TriggerResult<ProvisionedInstance>;

    /// Report the current management connection status of an instance.
    async fn connection_status(&self, instance_id: &InstanceId)
        -> TriggerResult<ConnectionStatus>;
}

/// Mock compute provider for testing.
///
/// Statuses are consumed front-to-back, one per poll; once the script runs
/// out every further poll reports connected.
#[derive(Debug, Default)]
pub struct MockComputeProvider {
    instance: Mutex<Option<ProvisionedInstance>>,
    statuses: Mutex<VecDeque<ConnectionStatus>>,
    requests: Mutex<Vec<InstanceRequest>>,
    polls: Mutex<Vec<InstanceId>>,
    provision_error: Mutex<Option<String>>,
    status_error: Mutex<Option<String>>,
}

impl MockComputeProvider {
    /// Create a mock that provisions a default instance and reports it
    /// connected on the first poll.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Provision the given instance instead of the default one.
    #[must_use]
    pub fn with_instance(self, instance: ProvisionedInstance) -> Self {
        Self {
            instance: Mutex::new(Some(instance)),
            ..self
        }
    }

    /// Script the status sequence returned by successive polls.
    #[must_use]
    pub fn with_statuses(self, statuses: impl IntoIterator<Item = ConnectionStatus>) -> Self {
        Self {
            statuses: Mutex::new(statuses.into_iter().collect()),
            ..self
        }
    }

    /// Make provisioning fail with the given message.
    #[must_use]
    pub fn fail_provisioning(self, msg: impl Into<String>) -> Self {
        Self {
            provision_error: Mutex::new(Some(msg.into())),
            ..self
        }
    }

    /// Make status checks fail with the given message.
    #[must_use]
    pub fn fail_status_checks(self, msg: impl Into<String>) -> Self {
        Self {
            status_error: Mutex::new(Some(msg.into())),
            ..self
        }
    }

    /// Launch requests received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<InstanceRequest> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }

    /// Number of status polls received so far.
    #[must_use]
    pub fn poll_count(&self) -> usize {
        self.polls.lock().map(|polls| polls.len()).unwrap_or_default()
    }

    fn default_instance() -> ProvisionedInstance {
        ProvisionedInstance {
            id: InstanceId::new("i-0mock0001"),
            network_id: "vpc-mock".to_owned(),
            private_ip: "10.0.0.5".to_owned(),
            state: "pending".to_owned(),
        }
    }
}

#[async_trait]
impl ComputeProvider for MockComputeProvider {
    async fn run_from_template(
        &self,
        request: &InstanceRequest,
    ) -> TriggerResult<ProvisionedInstance> {
        self.requests
            .lock()
            .map_err(|_| TriggerError::internal("lock poisoned"))?
            .push(request.clone());

        if let Some(msg) = self
            .provision_error
            .lock()
            .map_err(|_| TriggerError::internal("lock poisoned"))?
            .as_ref()
        {
            return Err(TriggerError::provisioning(msg.clone()));
        }

        let instance = self
            .instance
            .lock()
            .map_err(|_| TriggerError::internal("lock poisoned"))?
            .clone();
        Ok(instance.unwrap_or_else(Self::default_instance))
    }

    async fn connection_status(
        &self,
        instance_id: &InstanceId,
    ) -> TriggerResult<ConnectionStatus> {
        self.polls
            .lock()
            .map_err(|_| TriggerError::internal("lock poisoned"))?
            .push(instance_id.clone());

        if let Some(msg) = self
            .status_error
            .lock()
            .map_err(|_| TriggerError::internal("lock poisoned"))?
            .as_ref()
        {
            return Err(TriggerError::status_check(msg.clone()));
        }

        let next = self
            .statuses
            .lock()
            .map_err(|_| TriggerError::internal("lock poisoned"))?
            .pop_front();
        Ok(next.unwrap_or(ConnectionStatus::Connected))
    }
}
