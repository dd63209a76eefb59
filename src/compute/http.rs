//! HTTP client for the compute provider API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};

use crate::config::ComputeConfig;
use crate::error::{TriggerError, TriggerResult};
use crate::types::{InstanceId, ProvisionedInstance};

use super::{ComputeProvider, ConnectionStatus, InstanceRequest};

/// Raw connection status response from the compute API.
#[derive(serde::Deserialize)]
struct RawStatus {
    status: String,
}

/// HTTP client for the compute provider service.
#[derive(Debug, Clone)]
pub struct HttpComputeProvider {
    client: Client,
    base_url: String,
}

impl HttpComputeProvider {
    /// Create a new compute provider client from configuration.
    pub fn new(config: &ComputeConfig) -> TriggerResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| TriggerError::internal(format!("failed to build compute client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_owned(),
        })
    }

    /// Create a new compute provider client with a custom base URL.
    pub fn with_url(url: impl Into<String>) -> TriggerResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| TriggerError::internal(format!("failed to build compute client: {e}")))?;

        Ok(Self {
            client,
            base_url: url.into().trim_end_matches('/').to_owned(),
        })
    }
}

#[async_trait]
impl ComputeProvider for HttpComputeProvider {
    async fn run_from_template(
        &self,
        request: &InstanceRequest,
    ) -> TriggerResult<ProvisionedInstance> {
        let url = format!("{}/instances", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| TriggerError::provisioning(format!("instance request failed: {e}")))?;

        match response.status() {
            StatusCode::OK | StatusCode::CREATED => response
                .json()
                .await
                .map_err(|e| TriggerError::provisioning(format!("invalid instance response: {e}"))),
            status => Err(TriggerError::provisioning(format!(
                "instance request rejected: {status}"
            ))),
        }
    }

    async fn connection_status(
        &self,
        instance_id: &InstanceId,
    ) -> TriggerResult<ConnectionStatus> {
        let url = format!(
            "{}/instances/{}/connection-status",
            self.base_url, instance_id
        );
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| TriggerError::status_check(format!("status request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(TriggerError::status_check(format!(
                "status request rejected: {}",
                response.status()
            )));
        }

        let raw: RawStatus = response
            .json()
            .await
            .map_err(|e| TriggerError::status_check(format!("invalid status response: {e}")))?;

        Ok(ConnectionStatus::parse(&raw.status))
    }
}
