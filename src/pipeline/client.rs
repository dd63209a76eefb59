//! HTTP client for the pipeline controller API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use crate::config::PipelineConfig;
use crate::error::{TriggerError, TriggerResult};
use crate::types::JobId;

use super::{PipelineController, FAILURE_TYPE};

/// Failure report payload.
#[derive(Serialize)]
struct FailureDetails<'a> {
    message: &'a str,
    #[serde(rename = "type")]
    kind: &'a str,
}

/// HTTP client for the pipeline controller service.
#[derive(Debug, Clone)]
pub struct HttpPipelineClient {
    client: Client,
    base_url: String,
}

impl HttpPipelineClient {
    /// Create a new pipeline client from configuration.
    pub fn new(config: &PipelineConfig) -> TriggerResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| TriggerError::internal(format!("failed to build pipeline client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_owned(),
        })
    }

    /// Create a new pipeline client with a custom base URL.
    pub fn with_url(url: impl Into<String>) -> TriggerResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| TriggerError::internal(format!("failed to build pipeline client: {e}")))?;

        Ok(Self {
            client,
            base_url: url.into().trim_end_matches('/').to_owned(),
        })
    }
}

#[async_trait]
impl PipelineController for HttpPipelineClient {
    async fn report_failure(&self, job_id: &JobId, message: &str) -> TriggerResult<()> {
        let url = format!("{}/jobs/{}/failure", self.base_url, job_id);
        let details = FailureDetails {
            message,
            kind: FAILURE_TYPE,
        };

        let response = self
            .client
            .post(&url)
            .json(&details)
            .send()
            .await
            .map_err(|e| TriggerError::report(format!("failure report not sent: {e}")))?;

        if !response.status().is_success() {
            return Err(TriggerError::report(format!(
                "failure report rejected: {}",
                response.status()
            )));
        }

        Ok(())
    }
}
