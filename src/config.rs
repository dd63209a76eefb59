//! Configuration for the deployment trigger worker.
//!
//! All of this is operational configuration (endpoints, budgets, the remote
//! script location). Job semantics never come from here; they arrive in the
//! job descriptor.

use figment::providers::{Env, Format, Toml};
use figment::Figment;
use serde::Deserialize;

use crate::error::{TriggerError, TriggerResult};

/// Top-level configuration for the trigger worker.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct WorkerConfig {
    /// Object store configuration.
    #[serde(default)]
    pub stores: StoreConfig,

    /// Compute provider client configuration.
    #[serde(default)]
    pub compute: ComputeConfig,

    /// Remote command executor client configuration.
    #[serde(default)]
    pub remote: RemoteConfig,

    /// Pipeline controller client configuration.
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Instance readiness polling configuration.
    #[serde(default)]
    pub readiness: ReadinessConfig,

    /// Build command dispatch configuration.
    #[serde(default)]
    pub dispatch: DispatchConfig,
}

impl WorkerConfig {
    /// Load configuration from the default sources.
    ///
    /// Configuration is loaded in the following order (later sources override earlier):
    /// 1. Default values
    /// 2. `stagehand.toml` in the current directory (if present)
    /// 3. Environment variables with `STAGEHAND_` prefix
    pub fn load() -> TriggerResult<Self> {
        Figment::new()
            .merge(Toml::file("stagehand.toml"))
            .merge(Env::prefixed("STAGEHAND_").split("__"))
            .extract()
            .map_err(|e| TriggerError::Config(e.to_string()))
    }

    /// Load configuration from a specific TOML file.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> TriggerResult<Self> {
        Figment::new()
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("STAGEHAND_").split("__"))
            .extract()
            .map_err(|e| TriggerError::Config(e.to_string()))
    }
}

/// Object store configuration shared by the scoped and ambient handles.
///
/// Credentials are never configured here: the scoped handle uses the job's
/// short-lived credentials and the ambient handle uses the process
/// environment.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct StoreConfig {
    /// Store region.
    pub region: Option<String>,

    /// Endpoint URL (for S3-compatible stores like Garage or MinIO).
    pub endpoint: Option<String>,
}

/// Compute provider client configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ComputeConfig {
    /// Base URL for the compute provider HTTP API.
    #[serde(default = "default_compute_url")]
    pub url: String,

    /// Request timeout in seconds.
    #[serde(default = "default_compute_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_compute_url() -> String {
    "http://localhost:8084".to_owned()
}

const fn default_compute_timeout_secs() -> u64 {
    30
}

impl Default for ComputeConfig {
    fn default() -> Self {
        Self {
            url: default_compute_url(),
            timeout_secs: default_compute_timeout_secs(),
        }
    }
}

/// Remote command executor client configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteConfig {
    /// Base URL for the remote execution HTTP API.
    #[serde(default = "default_remote_url")]
    pub url: String,

    /// Request timeout in seconds.
    #[serde(default = "default_remote_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_remote_url() -> String {
    "http://localhost:8085".to_owned()
}

const fn default_remote_timeout_secs() -> u64 {
    30
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            url: default_remote_url(),
            timeout_secs: default_remote_timeout_secs(),
        }
    }
}

/// Pipeline controller client configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Base URL for the pipeline controller HTTP API.
    #[serde(default = "default_pipeline_url")]
    pub url: String,

    /// Request timeout in seconds.
    #[serde(default = "default_pipeline_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_pipeline_url() -> String {
    "http://localhost:8086".to_owned()
}

const fn default_pipeline_timeout_secs() -> u64 {
    10
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            url: default_pipeline_url(),
            timeout_secs: default_pipeline_timeout_secs(),
        }
    }
}

/// Instance readiness polling configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ReadinessConfig {
    /// Seconds between connection status polls.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Overall budget for the instance to become connected, in seconds.
    #[serde(default = "default_readiness_timeout_secs")]
    pub timeout_secs: u64,
}

const fn default_poll_interval_secs() -> u64 {
    10
}

const fn default_readiness_timeout_secs() -> u64 {
    300 // 5 minutes
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            timeout_secs: default_readiness_timeout_secs(),
        }
    }
}

/// Build command dispatch configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DispatchConfig {
    /// URL of the build script the instance downloads and runs. The script
    /// name on the command line is the last path segment of this URL.
    #[serde(default = "default_script_url")]
    pub script_url: String,
}

fn default_script_url() -> String {
    "https://s3.amazonaws.com/stagehand-scripts/build_ssm.bat".to_owned()
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            script_url: default_script_url(),
        }
    }
}
