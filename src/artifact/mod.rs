//! Artifact location and staging.
//!
//! The delivery pipeline hands the worker a list of input artifacts; exactly
//! one of them (named [`SOURCE_ARTIFACT_NAME`]) carries the source bundle the
//! build instance needs. Staging copies that bundle, as an opaque blob, from
//! the pipeline's bucket into the worker's own bucket under a job-scoped key
//! so the instance can fetch it without pipeline credentials.

mod store;

pub use store::{MemoryStoreFactory, S3StoreFactory, StoreFactory};

use object_store::path::Path as ObjectPath;
use object_store::ObjectStore;
use tracing::{debug, info};

use crate::error::{TriggerError, TriggerResult};
use crate::types::{Artifact, JobId};

/// Name of the pipeline input artifact that carries the source bundle.
pub const SOURCE_ARTIFACT_NAME: &str = "SourceArtifact";

/// Object name the staged bundle is stored under, inside the job's prefix.
pub const STAGED_OBJECT_NAME: &str = "artifacts.zip";

/// Key the staged bundle lands at in the worker's bucket.
#[must_use]
pub fn staged_key(job_id: &JobId) -> String {
    format!("{job_id}/{STAGED_OBJECT_NAME}")
}

/// A staged artifact in the worker's bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedArtifact {
    /// Bucket the bundle was copied into.
    pub bucket: String,
    /// Key within the bucket.
    pub key: String,
    /// Size of the copied bundle in bytes.
    pub size: usize,
}

/// Find a named artifact in the job's input list.
///
/// The first artifact with a matching name wins; the pipeline never sends
/// duplicates.
pub fn find_artifact<'a>(artifacts: &'a [Artifact], name: &str) -> TriggerResult<&'a Artifact> {
    artifacts
        .iter()
        .find(|artifact| artifact.name == name)
        .ok_or_else(|| TriggerError::ArtifactNotFound(name.to_owned()))
}

/// Copy an artifact from the pipeline's bucket into the worker's bucket.
///
/// The copy is byte-for-byte; the bundle is never unpacked or inspected. The
/// two store handles carry different credentials, which is why this takes a
/// source and a destination rather than a single store.
///
/// A failed upload can leave a partial object at the destination; there is
/// no cleanup or rollback. A re-run of the same job overwrites the key.
pub async fn stage(
    source: &dyn ObjectStore,
    destination: &dyn ObjectStore,
    artifact: &Artifact,
    destination_bucket: &str,
    job_id: &JobId,
) -> TriggerResult<StagedArtifact> {
    let source_path = ObjectPath::from(artifact.location.key.as_str());

    let result = source
        .get(&source_path)
        .await
        .map_err(|e| TriggerError::staging(format!("failed to fetch source artifact: {e}")))?;

    let data = result
        .bytes()
        .await
        .map_err(|e| TriggerError::staging(format!("failed to read source artifact: {e}")))?;

    let key = staged_key(job_id);
    let destination_path = ObjectPath::from(key.as_str());

    debug!(
        source = %source_path,
        destination = %destination_path,
        size = data.len(),
        "copying artifact"
    );

    let size = data.len();
    destination
        .put(&destination_path, data.into())
        .await
        .map_err(|e| TriggerError::staging(format!("failed to store staged artifact: {e}")))?;

    info!(
        job = %job_id,
        bucket = destination_bucket,
        key = %key,
        size,
        "artifact staged"
    );

    Ok(StagedArtifact {
        bucket: destination_bucket.to_owned(),
        key,
        size,
    })
}
