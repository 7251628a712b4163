use reqwest::{Client, Response, StatusCode};
use tracing::debug;

use super::types::{
    error_message, CreatedJob, SourceRangePrompt, TextToCadCreateBody, TextToCadIterationBody,
    TextToCadResponse,
};
use crate::config::ZooConfig;
use crate::provider::JobProvider;
use crate::types::{GenerationRequest, IterationRequest, JobKind};
use crate::{Error, JobHandle, JobRequest, JobStatus};

/// Zoo API provider implementation.
pub struct ZooProvider {
    client: Client,
    api_token: String,
    base_url: String,
}

impl ZooProvider {
    /// Create a new Zoo provider against the public API.
    pub fn new(api_token: String) -> Result<Self, Error> {
        Self::from_config(&ZooConfig::new(api_token))
    }

    /// Create a new Zoo provider with custom base URL.
    pub fn new_with_base_url(api_token: String, base_url: String) -> Result<Self, Error> {
        let mut config = ZooConfig::new(api_token);
        config.base_url = base_url;
        Self::from_config(&config)
    }

    /// Create a new Zoo provider from configuration.
    pub fn from_config(config: &ZooConfig) -> Result<Self, Error> {
        if config.api_token.trim().is_empty() {
            return Err(Error::auth("no Zoo API token configured"));
        }

        let client = Client::builder().timeout(config.request_timeout).build()?;

        Ok(Self {
            client,
            api_token: config.api_token.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn create_url(&self, request: &GenerationRequest) -> String {
        format!(
            "{}/ai/text-to-cad/{}?kcl={}",
            self.base_url,
            request.output_format().as_str(),
            request.kcl()
        )
    }

    fn iteration_url(&self) -> String {
        format!("{}/ml/text-to-cad/iteration", self.base_url)
    }

    fn status_url(&self, handle: &JobHandle) -> String {
        format!("{}/user/text-to-cad/{}", self.base_url, handle.id)
    }

    async fn post_create(&self, request: &GenerationRequest) -> Result<Response, reqwest::Error> {
        self.client
            .post(self.create_url(request))
            .bearer_auth(&self.api_token)
            .json(&TextToCadCreateBody {
                prompt: request.prompt(),
            })
            .send()
            .await
    }

    async fn post_iteration(&self, request: &IterationRequest) -> Result<Response, reqwest::Error> {
        let body = TextToCadIterationBody {
            original_source_code: request.source(),
            source_ranges: vec![SourceRangePrompt {
                prompt: request.prompt(),
                range: request.range(),
            }],
        };

        self.client
            .post(self.iteration_url())
            .bearer_auth(&self.api_token)
            .json(&body)
            .send()
            .await
    }
}

/// Map a non-success submission response to an error.
fn submission_error(status: StatusCode, body: &str) -> Error {
    let message = error_message(body);
    if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
        Error::auth(message)
    } else {
        Error::submission(format!("HTTP {status}: {message}"))
    }
}

#[async_trait::async_trait]
impl JobProvider for ZooProvider {
    async fn submit(&self, request: &JobRequest) -> Result<JobHandle, Error> {
        let (kind, sent) = match request {
            JobRequest::Generate(request) => (JobKind::TextToCad, self.post_create(request).await),
            JobRequest::Iterate(request) => {
                (JobKind::TextToCadIteration, self.post_iteration(request).await)
            }
        };
        let response = sent.map_err(|e| Error::submission(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| Error::submission(e.to_string()))?;

        if !status.is_success() {
            return Err(submission_error(status, &text));
        }

        let created: CreatedJob = serde_json::from_str(&text)
            .map_err(|e| Error::submission(format!("malformed response: {e}")))?;
        debug!(job_id = %created.id, status = ?created.status, "Job accepted");

        Ok(JobHandle::new(created.id, kind))
    }

    async fn status(&self, handle: &JobHandle) -> Result<JobStatus, Error> {
        let response = self
            .client
            .get(self.status_url(handle))
            .bearer_auth(&self.api_token)
            .send()
            .await
            .map_err(|e| Error::polling_transport(handle, e))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| Error::polling_transport(handle, e))?;

        if !status.is_success() {
            return Err(Error::polling_status(handle, status, &error_message(&text)));
        }

        let record: TextToCadResponse = serde_json::from_str(&text)
            .map_err(|e| Error::unexpected(format!("malformed status for job {handle}: {e}")))?;
        record.into_status(handle.kind)
    }
}
