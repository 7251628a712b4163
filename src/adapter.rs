//! Turns an asynchronous remote Text-to-CAD job into a single bounded-wait call.
//!
//! A call validates its input locally, submits exactly one job, then polls the
//! job's status on a fixed interval until it completes, fails, or the deadline
//! passes. Transient polling errors are retried with exponential backoff.
//! Every outcome is returned as an [`AdapterResult`]; nothing escapes as an
//! error. Dropping the returned future stops polling immediately.

use std::sync::Arc;

use tokio::time::{sleep, timeout_at, Instant};
use tracing::{debug, info, warn};

use crate::config::PollConfig;
use crate::provider::JobProvider;
use crate::types::{
    GenerationRequest, IterationRequest, JobHandle, JobRequest, JobStatus, KclSource, SourceRange,
};
use crate::Error;

/// Prefix that marks a flattened failure message.
pub const ERROR_PREFIX: &str = "Error: ";

/// Outcome of a single adapter call.
#[derive(Debug)]
pub enum AdapterResult {
    /// The generated KCL source.
    Completed(String),
    Failed(Error),
}

impl AdapterResult {
    pub fn code(&self) -> Option<&str> {
        match self {
            AdapterResult::Completed(code) => Some(code),
            AdapterResult::Failed(_) => None,
        }
    }

    pub fn error(&self) -> Option<&Error> {
        match self {
            AdapterResult::Completed(_) => None,
            AdapterResult::Failed(err) => Some(err),
        }
    }

    /// Flatten into the tool-facing text: the code verbatim, or the error
    /// message prefixed with [`ERROR_PREFIX`].
    pub fn into_text(self) -> String {
        match self {
            AdapterResult::Completed(code) => code,
            AdapterResult::Failed(err) => format!("{ERROR_PREFIX}{err}"),
        }
    }
}

impl From<Result<String, Error>> for AdapterResult {
    fn from(result: Result<String, Error>) -> Self {
        match result {
            Ok(code) => AdapterResult::Completed(code),
            Err(err) => AdapterResult::Failed(err),
        }
    }
}

/// Text-to-CAD adapter over any [`JobProvider`].
#[derive(Clone)]
pub struct TextToCad {
    provider: Arc<dyn JobProvider>,
    poll: PollConfig,
}

impl TextToCad {
    pub fn new(provider: Arc<dyn JobProvider>, poll: PollConfig) -> Self {
        Self { provider, poll }
    }

    /// Generate KCL for a new model described by `prompt`.
    pub async fn generate(&self, prompt: &str) -> AdapterResult {
        info!("Sending prompt to Text-To-CAD");
        let result = match GenerationRequest::new(prompt) {
            Ok(request) => self.run(request.into()).await,
            Err(err) => Err(err),
        };
        Self::finish(result)
    }

    /// Modify existing KCL with a prompt scoped to `range`.
    pub async fn iterate(&self, source: KclSource, prompt: &str, range: SourceRange) -> AdapterResult {
        info!("Sending KCL code prompt to Text-To-CAD iteration");
        let result = async {
            let source = source.load().await?;
            let request = IterationRequest::new(source, prompt, range)?;
            self.run(request.into()).await
        }
        .await;
        Self::finish(result)
    }

    fn finish(result: Result<String, Error>) -> AdapterResult {
        match &result {
            Ok(_) => info!("Received response from Text-To-CAD"),
            Err(err) => warn!(error = %err, "Text-To-CAD request did not produce code"),
        }
        result.into()
    }

    /// Submit one job and wait for its terminal status.
    async fn run(&self, request: JobRequest) -> Result<String, Error> {
        let handle = self.provider.submit(&request).await?;
        info!(job_id = %handle, kind = %handle.kind, "Submitted Text-To-CAD job");
        self.await_completion(&handle).await
    }

    async fn await_completion(&self, handle: &JobHandle) -> Result<String, Error> {
        let started = Instant::now();
        let deadline = started + self.poll.deadline;
        let mut polls = 0u32;

        loop {
            let now = Instant::now();
            if now >= deadline {
                return Err(Error::Timeout {
                    job_id: handle.to_string(),
                    waited: now - started,
                });
            }

            sleep(self.poll.interval.min(deadline - now)).await;

            let status = self.poll_status(handle, started, deadline).await?;
            polls += 1;
            debug!(job_id = %handle, polls, status = %status, "Polled job status");

            match status {
                JobStatus::Completed(code) => return Ok(code),
                JobStatus::Failed(reason) => {
                    return Err(Error::RemoteFailure {
                        job_id: handle.to_string(),
                        reason,
                    })
                }
                JobStatus::Queued | JobStatus::InProgress => {}
            }
        }
    }

    /// Query status once, retrying transient failures while the deadline allows.
    /// A request still in flight at the deadline is abandoned.
    async fn poll_status(
        &self,
        handle: &JobHandle,
        started: Instant,
        deadline: Instant,
    ) -> Result<JobStatus, Error> {
        let mut attempt = 0;
        loop {
            let Ok(result) = timeout_at(deadline, self.provider.status(handle)).await else {
                return Err(Error::Timeout {
                    job_id: handle.to_string(),
                    waited: Instant::now() - started,
                });
            };
            match result {
                Err(err) if err.is_transient() && attempt < self.poll.max_retries => {
                    attempt += 1;
                    let backoff = self.poll.backoff_for(attempt);
                    if Instant::now() + backoff > deadline {
                        return Err(err);
                    }
                    warn!(job_id = %handle, attempt, ?backoff, error = %err, "Retrying job status");
                    sleep(backoff).await;
                }
                result => return result,
            }
        }
    }
}
