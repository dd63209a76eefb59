//! Object store handles for the two credential domains.
//!
//! Staging reads with the pipeline's short-lived credentials and writes with
//! the worker's own ambient credentials. A [`StoreFactory`] hands out one
//! handle per domain so neither set of credentials can leak into the other
//! side of the copy.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use object_store::aws::AmazonS3Builder;
use object_store::memory::InMemory;
use object_store::ObjectStore;

use crate::config::StoreConfig;
use crate::error::{TriggerError, TriggerResult};
use crate::types::ArtifactCredentials;

/// Produces object store handles scoped to a credential domain.
pub trait StoreFactory: Send + Sync {
    /// Handle authenticated with the job's short-lived pipeline credentials.
    fn scoped(
        &self,
        bucket: &str,
        credentials: &ArtifactCredentials,
    ) -> TriggerResult<Arc<dyn ObjectStore>>;

    /// Handle authenticated from the worker's own environment.
    fn ambient(&self, bucket: &str) -> TriggerResult<Arc<dyn ObjectStore>>;
}

/// S3-backed store factory.
#[derive(Debug, Clone)]
pub struct S3StoreFactory {
    config: StoreConfig,
}

impl S3StoreFactory {
    /// Create a new factory with the given store configuration.
    #[must_use]
    pub const fn new(config: StoreConfig) -> Self {
        Self { config }
    }

    fn apply_shared(&self, mut builder: AmazonS3Builder) -> AmazonS3Builder {
        if let Some(endpoint) = &self.config.endpoint {
            builder = builder.with_endpoint(endpoint);
            if endpoint.starts_with("http://") {
                builder = builder.with_allow_http(true);
            }
        }
        if let Some(region) = &self.config.region {
            builder = builder.with_region(region);
        }
        builder
    }
}

impl StoreFactory for S3StoreFactory {
    fn scoped(
        &self,
        bucket: &str,
        credentials: &ArtifactCredentials,
    ) -> TriggerResult<Arc<dyn ObjectStore>> {
        let builder = AmazonS3Builder::new()
            .with_bucket_name(bucket)
            .with_access_key_id(&credentials.access_key_id)
            .with_secret_access_key(&credentials.secret_access_key)
            .with_token(&credentials.session_token);

        let store = self
            .apply_shared(builder)
            .build()
            .map_err(|e| TriggerError::staging(format!("failed to create scoped store: {e}")))?;
        Ok(Arc::new(store))
    }

    fn ambient(&self, bucket: &str) -> TriggerResult<Arc<dyn ObjectStore>> {
        let builder = AmazonS3Builder::from_env().with_bucket_name(bucket);

        let store = self
            .apply_shared(builder)
            .build()
            .map_err(|e| TriggerError::staging(format!("failed to create ambient store: {e}")))?;
        Ok(Arc::new(store))
    }
}

/// In-memory store factory for tests.
///
/// Buckets are created on first use and shared between the scoped and ambient
/// sides, so a test can seed the source bucket and then inspect what staging
/// wrote to the destination bucket.
#[derive(Debug, Default)]
pub struct MemoryStoreFactory {
    buckets: Mutex<HashMap<String, Arc<InMemory>>>,
    scoped_requests: Mutex<Vec<String>>,
    ambient_requests: Mutex<Vec<String>>,
}

impl MemoryStoreFactory {
    /// Create an empty factory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or create the named bucket.
    pub fn bucket(&self, name: &str) -> TriggerResult<Arc<InMemory>> {
        let mut buckets = self
            .buckets
            .lock()
            .map_err(|_| TriggerError::internal("lock poisoned"))?;
        Ok(Arc::clone(
            buckets
                .entry(name.to_owned())
                .or_insert_with(|| Arc::new(InMemory::new())),
        ))
    }

    /// Bucket names requested through the scoped (pipeline-credential) side.
    #[must_use]
    pub fn scoped_requests(&self) -> Vec<String> {
        self.scoped_requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }

    /// Bucket names requested through the ambient (worker-credential) side.
    #[must_use]
    pub fn ambient_requests(&self) -> Vec<String> {
        self.ambient_requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }
}

impl StoreFactory for MemoryStoreFactory {
    fn scoped(
        &self,
        bucket: &str,
        _credentials: &ArtifactCredentials,
    ) -> TriggerResult<Arc<dyn ObjectStore>> {
        self.scoped_requests
            .lock()
            .map_err(|_| TriggerError::internal("lock poisoned"))?
            .push(bucket.to_owned());
        Ok(self.bucket(bucket)?)
    }

    fn ambient(&self, bucket: &str) -> TriggerResult<Arc<dyn ObjectStore>> {
        self.ambient_requests
            .lock()
            .map_err(|_| TriggerError::internal("lock poisoned"))?
            .push(bucket.to_owned());
        Ok(self.bucket(bucket)?)
    }
}
