use crate::{Error, JobHandle, JobRequest, JobStatus};

/// A remote service that runs Text-to-CAD jobs asynchronously.
/// Submission returns immediately with a handle; progress is observed by polling.
#[async_trait::async_trait]
pub trait JobProvider: Send + Sync + 'static {
    /// Submit a job and return its handle.
    async fn submit(&self, request: &JobRequest) -> Result<JobHandle, Error>;

    /// Fetch a fresh status snapshot for a previously submitted job.
    async fn status(&self, handle: &JobHandle) -> Result<JobStatus, Error>;
}
