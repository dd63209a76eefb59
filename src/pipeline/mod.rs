//! Failure reporting back to the delivery pipeline.
//!
//! The pipeline marks a job failed only when told so; a worker that dies
//! silently leaves the job to time out upstream. The orchestrator therefore
//! reports every job-level failure exactly once, through this seam. Success
//! is never reported from here: the build instance signals completion itself
//! once the build finishes.

mod client;

pub use client::HttpPipelineClient;

use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{TriggerError, TriggerResult};
use crate::types::JobId;

/// Failure type the pipeline expects in a failure report.
pub const FAILURE_TYPE: &str = "JobFailed";

/// Trait for pipeline controller implementations.
#[async_trait]
pub trait PipelineController: Send + Sync {
    /// Report a job as failed, with a human-readable message.
    async fn report_failure(&self, job_id: &JobId, message: &str) -> TriggerResult<()>;
}

/// Recording pipeline controller for testing.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    reports: Mutex<Vec<(JobId, String)>>,
    error: Mutex<Option<String>>,
}

impl RecordingReporter {
    /// Create a reporter that accepts every report.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make report delivery fail with the given message.
    #[must_use]
    pub fn fail_with(self, msg: impl Into<String>) -> Self {
        Self {
            error: Mutex::new(Some(msg.into())),
            ..self
        }
    }

    /// Failure reports received so far.
    #[must_use]
    pub fn reports(&self) -> Vec<(JobId, String)> {
        self.reports
            .lock()
            .map(|reports| reports.clone())
            .unwrap_or_default()
    }

    /// Number of failure reports received so far.
    #[must_use]
    pub fn report_count(&self) -> usize {
        self.reports
            .lock()
            .map(|reports| reports.len())
            .unwrap_or_default()
    }
}

#[async_trait]
impl PipelineController for RecordingReporter {
    async fn report_failure(&self, job_id: &JobId, message: &str) -> TriggerResult<()> {
        if let Some(msg) = self
            .error
            .lock()
            .map_err(|_| TriggerError::internal("lock poisoned"))?
            .as_ref()
        {
            return Err(TriggerError::report(msg.clone()));
        }

        self.reports
            .lock()
            .map_err(|_| TriggerError::internal("lock poisoned"))?
            .push((job_id.clone(), message.to_owned()));
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reporter_records_failures() {
        let reporter = RecordingReporter::new();

        reporter
            .report_failure(&JobId::new("j1"), "staging failed")
            .await
            .unwrap();

        assert_eq!(reporter.report_count(), 1);
        assert_eq!(
            reporter.reports(),
            vec![(JobId::new("j1"), "staging failed".to_owned())]
        );
    }

    #[tokio::test]
    async fn delivery_failure_records_nothing() {
        let reporter = RecordingReporter::new().fail_with("pipeline unreachable");

        let err = reporter
            .report_failure(&JobId::new("j1"), "staging failed")
            .await
            .unwrap_err();

        assert!(matches!(err, TriggerError::Report(msg) if msg == "pipeline unreachable"));
        assert_eq!(reporter.report_count(), 0);
    }
}
