//! Remote command execution on provisioned instances.

mod http;

pub use http::HttpRemoteExecutor;

use std::sync::Mutex;

use async_trait::async_trait;

use crate::dispatch::DispatchRequest;
use crate::error::{TriggerError, TriggerResult};

/// Trait for remote command executor implementations.
#[async_trait]
pub trait RemoteExecutor: Send + Sync {
    /// Submit a command to an instance.
    ///
    /// Returns once the command is accepted; the command itself runs
    /// asynchronously on the instance.
    async fn send_command(&self, request: &DispatchRequest) -> TriggerResult<()>;
}

/// Mock remote executor for testing.
#[derive(Debug, Default)]
pub struct MockRemoteExecutor {
    sent: Mutex<Vec<DispatchRequest>>,
    error: Mutex<Option<String>>,
}

impl MockRemoteExecutor {
    /// Create a mock that accepts every command.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make command submission fail with the given message.
    #[must_use]
    pub fn fail_with(self, msg: impl Into<String>) -> Self {
        Self {
            error: Mutex::new(Some(msg.into())),
            ..self
        }
    }

    /// Commands submitted so far.
    #[must_use]
    pub fn sent(&self) -> Vec<DispatchRequest> {
        self.sent.lock().map(|sent| sent.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl RemoteExecutor for MockRemoteExecutor {
    async fn send_command(&self, request: &DispatchRequest) -> TriggerResult<()> {
        if let Some(msg) = self
            .error
            .lock()
            .map_err(|_| TriggerError::internal("lock poisoned"))?
            .as_ref()
        {
            return Err(TriggerError::dispatch(msg.clone()));
        }

        self.sent
            .lock()
            .map_err(|_| TriggerError::internal("lock poisoned"))?
            .push(request.clone());
        Ok(())
    }
}
