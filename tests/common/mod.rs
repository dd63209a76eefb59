//! Common test utilities for trigger integration tests.
//!
//! Every provider seam gets a recording implementation that appends to one
//! shared [`CallLog`], so tests can assert the exact order of external calls
//! a job made, across stores, compute, remote execution, and the pipeline.

pub mod fixtures;

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use object_store::memory::InMemory;
use object_store::path::Path as ObjectPath;
use object_store::{
    GetOptions, GetResult, ListResult, MultipartUpload, ObjectMeta, ObjectStore, PutMultipartOpts,
    PutOptions, PutPayload, PutResult,
};

use stagehand::{
    ArtifactCredentials, ComputeProvider, ConnectionStatus, DispatchRequest, InstanceId,
    InstanceRequest, JobId, JobRunner, PipelineController, ProvisionedInstance, RemoteExecutor,
    StoreFactory, TriggerError, TriggerResult, WorkerConfig,
};

/// Shared, ordered log of external calls made during a test run.
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    entries: Arc<Mutex<Vec<String>>>,
}

impl CallLog {
    /// Appends an entry.
    pub fn push(&self, entry: impl Into<String>) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(entry.into());
        }
    }

    /// Full entries, in call order.
    pub fn entries(&self) -> Vec<String> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }

    /// The kind of each entry (its first word), in call order.
    pub fn kinds(&self) -> Vec<String> {
        self.entries()
            .iter()
            .map(|entry| entry.split(' ').next().unwrap_or(entry).to_owned())
            .collect()
    }
}

/// Store factory serving in-memory buckets wrapped with call logging.
pub struct RecordingStoreFactory {
    buckets: Mutex<HashMap<String, Arc<InMemory>>>,
    scoped: Mutex<Vec<String>>,
    ambient: Mutex<Vec<String>>,
    put_error: Option<String>,
    log: CallLog,
}

impl RecordingStoreFactory {
    /// Direct (unlogged) handle to a bucket, for seeding and inspection.
    pub fn raw_bucket(&self, name: &str) -> Arc<InMemory> {
        let mut buckets = self.buckets.lock().unwrap();
        Arc::clone(
            buckets
                .entry(name.to_owned())
                .or_insert_with(|| Arc::new(InMemory::new())),
        )
    }

    /// Bucket names requested with the job's credentials.
    pub fn scoped_buckets(&self) -> Vec<String> {
        self.scoped.lock().unwrap().clone()
    }

    /// Bucket names requested with the worker's own credentials.
    pub fn ambient_buckets(&self) -> Vec<String> {
        self.ambient.lock().unwrap().clone()
    }

    fn handle(&self, bucket: &str) -> Arc<dyn ObjectStore> {
        Arc::new(RecordingStore {
            inner: self.raw_bucket(bucket),
            bucket: bucket.to_owned(),
            put_error: self.put_error.clone(),
            log: self.log.clone(),
        })
    }
}

impl StoreFactory for RecordingStoreFactory {
    fn scoped(
        &self,
        bucket: &str,
        _credentials: &ArtifactCredentials,
    ) -> TriggerResult<Arc<dyn ObjectStore>> {
        self.scoped.lock().unwrap().push(bucket.to_owned());
        Ok(self.handle(bucket))
    }

    fn ambient(&self, bucket: &str) -> TriggerResult<Arc<dyn ObjectStore>> {
        self.ambient.lock().unwrap().push(bucket.to_owned());
        Ok(self.handle(bucket))
    }
}

/// In-memory object store that logs gets, puts, and deletes with its bucket
/// name.
#[derive(Debug)]
struct RecordingStore {
    inner: Arc<InMemory>,
    bucket: String,
    put_error: Option<String>,
    log: CallLog,
}

impl fmt::Display for RecordingStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecordingStore({})", self.bucket)
    }
}

#[async_trait]
impl ObjectStore for RecordingStore {
    async fn put_opts(
        &self,
        location: &ObjectPath,
        payload: PutPayload,
        opts: PutOptions,
    ) -> object_store::Result<PutResult> {
        self.log.push(format!("put-object {} {}", self.bucket, location));

        if let Some(msg) = &self.put_error {
            return Err(object_store::Error::Generic {
                store: "recording",
                source: msg.clone().into(),
            });
        }
        self.inner.put_opts(location, payload, opts).await
    }

    async fn put_multipart_opts(
        &self,
        location: &ObjectPath,
        opts: PutMultipartOpts,
    ) -> object_store::Result<Box<dyn MultipartUpload>> {
        self.inner.put_multipart_opts(location, opts).await
    }

    async fn get_opts(
        &self,
        location: &ObjectPath,
        options: GetOptions,
    ) -> object_store::Result<GetResult> {
        self.log.push(format!("get-object {} {}", self.bucket, location));
        self.inner.get_opts(location, options).await
    }

    async fn delete(&self, location: &ObjectPath) -> object_store::Result<()> {
        self.log.push(format!("delete-object {} {}", self.bucket, location));
        self.inner.delete(location).await
    }

    fn list(&self, prefix: Option<&ObjectPath>) -> BoxStream<'_, object_store::Result<ObjectMeta>> {
        self.inner.list(prefix)
    }

    async fn list_with_delimiter(
        &self,
        prefix: Option<&ObjectPath>,
    ) -> object_store::Result<ListResult> {
        self.inner.list_with_delimiter(prefix).await
    }

    async fn copy(&self, from: &ObjectPath, to: &ObjectPath) -> object_store::Result<()> {
        self.inner.copy(from, to).await
    }

    async fn copy_if_not_exists(
        &self,
        from: &ObjectPath,
        to: &ObjectPath,
    ) -> object_store::Result<()> {
        self.inner.copy_if_not_exists(from, to).await
    }
}

/// Compute provider that logs calls and replays a scripted status sequence.
///
/// Once the script runs out, every further poll reports connected.
pub struct RecordingCompute {
    log: CallLog,
    statuses: Mutex<VecDeque<ConnectionStatus>>,
    provision_error: Option<String>,
    status_error: Option<String>,
}

#[async_trait]
impl ComputeProvider for RecordingCompute {
    async fn run_from_template(
        &self,
        request: &InstanceRequest,
    ) -> TriggerResult<ProvisionedInstance> {
        self.log.push(format!("run-instance {}", request.template));

        if let Some(msg) = &self.provision_error {
            return Err(TriggerError::provisioning(msg.clone()));
        }
        Ok(fixtures::provisioned_instance())
    }

    async fn connection_status(
        &self,
        instance_id: &InstanceId,
    ) -> TriggerResult<ConnectionStatus> {
        self.log.push(format!("poll-status {instance_id}"));

        if let Some(msg) = &self.status_error {
            return Err(TriggerError::status_check(msg.clone()));
        }
        let next = self.statuses.lock().unwrap().pop_front();
        Ok(next.unwrap_or(ConnectionStatus::Connected))
    }
}

/// Remote executor that logs submissions and keeps the accepted requests.
pub struct RecordingRemote {
    log: CallLog,
    sent: Mutex<Vec<DispatchRequest>>,
    error: Option<String>,
}

impl RecordingRemote {
    /// Commands accepted so far.
    pub fn sent(&self) -> Vec<DispatchRequest> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl RemoteExecutor for RecordingRemote {
    async fn send_command(&self, request: &DispatchRequest) -> TriggerResult<()> {
        self.log.push(format!("send-command {}", request.instance_id));

        if let Some(msg) = &self.error {
            return Err(TriggerError::dispatch(msg.clone()));
        }
        self.sent.lock().unwrap().push(request.clone());
        Ok(())
    }
}

/// Pipeline controller that logs report attempts and keeps delivered reports.
pub struct RecordingPipeline {
    log: CallLog,
    reports: Mutex<Vec<(JobId, String)>>,
    error: Option<String>,
}

impl RecordingPipeline {
    /// Failure reports delivered so far.
    pub fn reports(&self) -> Vec<(JobId, String)> {
        self.reports.lock().unwrap().clone()
    }

    /// Number of failure reports delivered so far.
    pub fn report_count(&self) -> usize {
        self.reports.lock().unwrap().len()
    }
}

#[async_trait]
impl PipelineController for RecordingPipeline {
    async fn report_failure(&self, job_id: &JobId, message: &str) -> TriggerResult<()> {
        self.log.push(format!("report-failure {job_id}"));

        if let Some(msg) = &self.error {
            return Err(TriggerError::report(msg.clone()));
        }
        self.reports
            .lock()
            .unwrap()
            .push((job_id.clone(), message.to_owned()));
        Ok(())
    }
}

/// Complete trigger worker setup with recording providers wired together.
pub struct TestHarness {
    pub log: CallLog,
    pub stores: Arc<RecordingStoreFactory>,
    pub remote: Arc<RecordingRemote>,
    pub pipeline: Arc<RecordingPipeline>,
    pub runner: JobRunner,
}

impl TestHarness {
    /// Creates a harness with default wiring: instant polling, first poll
    /// connected, every provider succeeding.
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Starts configuring a harness.
    pub fn builder() -> HarnessBuilder {
        HarnessBuilder::default()
    }

    /// Seeds an object into a bucket without touching the call log.
    pub async fn seed_source(&self, bucket: &str, key: &str, data: &'static [u8]) {
        self.stores
            .raw_bucket(bucket)
            .put(&ObjectPath::from(key), Bytes::from_static(data).into())
            .await
            .unwrap();
    }

    /// Bytes currently stored at a key, read without touching the call log.
    pub async fn stored_bytes(&self, bucket: &str, key: &str) -> Bytes {
        self.stores
            .raw_bucket(bucket)
            .get(&ObjectPath::from(key))
            .await
            .unwrap()
            .bytes()
            .await
            .unwrap()
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for a [`TestHarness`] with scripted provider behaviour.
pub struct HarnessBuilder {
    statuses: Vec<ConnectionStatus>,
    staging_write_error: Option<String>,
    provision_error: Option<String>,
    status_error: Option<String>,
    dispatch_error: Option<String>,
    report_error: Option<String>,
    poll_interval_secs: u64,
    timeout_secs: u64,
}

impl Default for HarnessBuilder {
    fn default() -> Self {
        Self {
            statuses: Vec::new(),
            staging_write_error: None,
            provision_error: None,
            status_error: None,
            dispatch_error: None,
            report_error: None,
            poll_interval_secs: 0,
            timeout_secs: 5,
        }
    }
}

impl HarnessBuilder {
    /// Scripts the connection status sequence returned by successive polls.
    pub fn with_statuses(mut self, statuses: impl IntoIterator<Item = ConnectionStatus>) -> Self {
        self.statuses = statuses.into_iter().collect();
        self
    }

    /// Makes the staged upload fail.
    pub fn fail_staging_writes(mut self, msg: &str) -> Self {
        self.staging_write_error = Some(msg.to_owned());
        self
    }

    /// Makes instance provisioning fail.
    pub fn fail_provisioning(mut self, msg: &str) -> Self {
        self.provision_error = Some(msg.to_owned());
        self
    }

    /// Makes status polls fail.
    pub fn fail_status_checks(mut self, msg: &str) -> Self {
        self.status_error = Some(msg.to_owned());
        self
    }

    /// Makes command submission fail.
    pub fn fail_dispatch(mut self, msg: &str) -> Self {
        self.dispatch_error = Some(msg.to_owned());
        self
    }

    /// Makes failure report delivery fail.
    pub fn fail_reporting(mut self, msg: &str) -> Self {
        self.report_error = Some(msg.to_owned());
        self
    }

    /// Overrides the readiness polling budget.
    pub fn with_readiness(mut self, poll_interval_secs: u64, timeout_secs: u64) -> Self {
        self.poll_interval_secs = poll_interval_secs;
        self.timeout_secs = timeout_secs;
        self
    }

    /// Wires everything together.
    pub fn build(self) -> TestHarness {
        let log = CallLog::default();

        let stores = Arc::new(RecordingStoreFactory {
            buckets: Mutex::new(HashMap::new()),
            scoped: Mutex::new(Vec::new()),
            ambient: Mutex::new(Vec::new()),
            put_error: self.staging_write_error,
            log: log.clone(),
        });
        let compute = Arc::new(RecordingCompute {
            log: log.clone(),
            statuses: Mutex::new(self.statuses.into()),
            provision_error: self.provision_error,
            status_error: self.status_error,
        });
        let remote = Arc::new(RecordingRemote {
            log: log.clone(),
            sent: Mutex::new(Vec::new()),
            error: self.dispatch_error,
        });
        let pipeline = Arc::new(RecordingPipeline {
            log: log.clone(),
            reports: Mutex::new(Vec::new()),
            error: self.report_error,
        });

        let mut config = WorkerConfig::default();
        config.readiness.poll_interval_secs = self.poll_interval_secs;
        config.readiness.timeout_secs = self.timeout_secs;

        let runner = JobRunner::new(
            Arc::clone(&stores) as Arc<dyn StoreFactory>,
            compute as Arc<dyn ComputeProvider>,
            Arc::clone(&remote) as Arc<dyn RemoteExecutor>,
            Arc::clone(&pipeline) as Arc<dyn PipelineController>,
            config,
        );

        TestHarness {
            log,
            stores,
            remote,
            pipeline,
            runner,
        }
    }
}
