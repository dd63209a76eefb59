//! HTTP client for the remote execution API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::config::RemoteConfig;
use crate::dispatch::DispatchRequest;
use crate::error::{TriggerError, TriggerResult};

use super::RemoteExecutor;

/// HTTP client for the remote execution service.
#[derive(Debug, Clone)]
pub struct HttpRemoteExecutor {
    client: Client,
    base_url: String,
}

impl HttpRemoteExecutor {
    /// Create a new remote executor client from configuration.
    pub fn new(config: &RemoteConfig) -> TriggerResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| TriggerError::internal(format!("failed to build remote client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_owned(),
        })
    }

    /// Create a new remote executor client with a custom base URL.
    pub fn with_url(url: impl Into<String>) -> TriggerResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| TriggerError::internal(format!("failed to build remote client: {e}")))?;

        Ok(Self {
            client,
            base_url: url.into().trim_end_matches('/').to_owned(),
        })
    }
}

#[async_trait]
impl RemoteExecutor for HttpRemoteExecutor {
    async fn send_command(&self, request: &DispatchRequest) -> TriggerResult<()> {
        let url = format!("{}/commands", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| TriggerError::dispatch(format!("command submission failed: {e}")))?;

        if !response.status().is_success() {
            return Err(TriggerError::dispatch(format!(
                "command rejected: {}",
                response.status()
            )));
        }

        Ok(())
    }
}
