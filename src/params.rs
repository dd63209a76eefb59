//! User parameter validation.
//!
//! The pipeline author configures the trigger through a free-form blob on
//! the job. It must decode to a JSON object carrying the `bucket`, `sns`
//! and `template` keys, all non-empty. Decode failures and missing fields
//! are reported as distinct errors so callers can tell a malformed blob
//! apart from a missing value.

use crate::error::{TriggerError, TriggerResult};

/// The destination bucket key in the user parameter blob.
pub const PARAM_BUCKET: &str = "bucket";
/// The notification target key in the user parameter blob.
pub const PARAM_NOTIFICATION: &str = "sns";
/// The instance template key in the user parameter blob.
pub const PARAM_TEMPLATE: &str = "template";

/// Validated trigger parameters for one job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobParameters {
    /// Working bucket the staged artifact is copied into.
    pub storage_bucket: String,
    /// Opaque identifier the build instance signals completion through.
    pub notification_target: String,
    /// Compute template to provision the build instance from.
    pub instance_template: String,
}

impl JobParameters {
    /// Decode and validate the raw user parameter blob.
    ///
    /// Fails with [`TriggerError::ParameterDecode`] if the blob is not valid
    /// JSON, and with [`TriggerError::MissingParameter`] naming the first
    /// required key that is absent, non-string or empty. No side effects
    /// occur on failure.
    pub fn parse(raw: &str) -> TriggerResult<Self> {
        let value: serde_json::Value =
            serde_json::from_str(raw).map_err(|e| TriggerError::ParameterDecode(e.to_string()))?;

        Ok(Self {
            storage_bucket: required(&value, PARAM_BUCKET)?,
            notification_target: required(&value, PARAM_NOTIFICATION)?,
            instance_template: required(&value, PARAM_TEMPLATE)?,
        })
    }
}

fn required(value: &serde_json::Value, name: &'static str) -> TriggerResult<String> {
    match value.get(name).and_then(serde_json::Value::as_str) {
        Some(text) if !text.trim().is_empty() => Ok(text.to_owned()),
        _ => Err(TriggerError::MissingParameter { name }),
    }
}
