//! Build command dispatch.
//!
//! Once the instance is connected, the worker sends it a single remote
//! command: download the build script and run it with the job's coordinates
//! as positional arguments. Everything after that (the build itself, progress
//! notifications, job completion) happens on the instance; this worker's
//! involvement ends at dispatch.

use serde::{Deserialize, Serialize};

use crate::config::DispatchConfig;
use crate::params::JobParameters;
use crate::types::{InstanceId, JobId, ProvisionedInstance};

/// Document that downloads and runs a remote script on the instance.
pub const REMOTE_SCRIPT_DOCUMENT: &str = "AWS-RunRemoteScript";

/// Source type for the script URL.
pub const SCRIPT_SOURCE_TYPE: &str = "S3";

/// Budget for the build command on the instance, in seconds.
pub const EXECUTION_TIMEOUT_SECS: u64 = 3600;

/// A remote command ready to send to an instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchRequest {
    /// Instance the command targets.
    pub instance_id: InstanceId,
    /// Execution document name.
    pub document: String,
    /// Where the script is fetched from.
    pub source_type: String,
    /// URL of the script to download and run.
    pub script_url: String,
    /// Full command line, script name first.
    pub command_line: String,
    /// Working directory on the instance; empty means the script's download
    /// directory.
    pub working_directory: String,
    /// Execution budget in seconds.
    pub execution_timeout_secs: u64,
    /// Whether command output is captured into the command record.
    pub capture_output: bool,
}

impl DispatchRequest {
    /// Build the dispatch request for a job.
    ///
    /// The command line is positional and order matters; the build script
    /// reads its arguments as bucket, job id, notification target, instance
    /// id, private IP.
    #[must_use]
    pub fn for_job(
        config: &DispatchConfig,
        params: &JobParameters,
        job_id: &JobId,
        instance: &ProvisionedInstance,
    ) -> Self {
        let script = script_name(&config.script_url);
        let command_line = [
            script,
            params.storage_bucket.as_str(),
            job_id.as_str(),
            params.notification_target.as_str(),
            instance.id.as_str(),
            instance.private_ip.as_str(),
        ]
        .join(" ");

        Self {
            instance_id: instance.id.clone(),
            document: REMOTE_SCRIPT_DOCUMENT.to_owned(),
            source_type: SCRIPT_SOURCE_TYPE.to_owned(),
            script_url: config.script_url.clone(),
            command_line,
            working_directory: String::new(),
            execution_timeout_secs: EXECUTION_TIMEOUT_SECS,
            capture_output: true,
        }
    }
}

/// Script file name: the last path segment of the script URL.
fn script_name(url: &str) -> &str {
    url.rsplit('/').next().unwrap_or(url)
}
