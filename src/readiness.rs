//! Instance readiness polling.
//!
//! A freshly launched instance takes a while to boot and register its
//! management agent; commands sent before that are lost. The wait is bounded:
//! a hung or misconfigured instance fails the job instead of pinning the
//! worker forever.

use std::time::Duration;

use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::compute::ComputeProvider;
use crate::config::ReadinessConfig;
use crate::error::{TriggerError, TriggerResult};
use crate::types::InstanceId;

/// Poll the compute provider until the instance reports connected.
///
/// At least one poll always happens, even with a zero budget. Between polls
/// the wait can be interrupted by `cancel`; a poll already in flight is
/// allowed to finish first.
pub async fn wait_until_connected(
    compute: &dyn ComputeProvider,
    instance_id: &InstanceId,
    config: &ReadinessConfig,
    cancel: &CancellationToken,
) -> TriggerResult<()> {
    let start = std::time::Instant::now();
    let budget = Duration::from_secs(config.timeout_secs);
    let interval = Duration::from_secs(config.poll_interval_secs);
    let mut attempt: u32 = 0;

    loop {
        attempt += 1;
        let status = compute.connection_status(instance_id).await?;

        if status.is_connected() {
            info!(instance = %instance_id, attempt, "instance connected");
            return Ok(());
        }

        if start.elapsed() >= budget {
            return Err(TriggerError::ReadinessTimeout {
                instance_id: instance_id.to_string(),
                budget_secs: config.timeout_secs,
                last_status: status.to_string(),
            });
        }

        debug!(instance = %instance_id, status = %status, attempt, "instance not connected yet");

        tokio::select! {
            () = cancel.cancelled() => return Err(TriggerError::Cancelled),
            () = sleep(interval) => {}
        }
    }
}
