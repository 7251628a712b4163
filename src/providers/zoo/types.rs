use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{JobKind, JobStatus, SourceRange};
use crate::Error;

/// Body of the Text-to-CAD create endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct TextToCadCreateBody<'a> {
    pub prompt: &'a str,
}

/// A prompt scoped to a range of the original source.
#[derive(Debug, Clone, Serialize)]
pub struct SourceRangePrompt<'a> {
    pub prompt: &'a str,
    pub range: SourceRange,
}

/// Body of the Text-to-CAD iteration endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct TextToCadIterationBody<'a> {
    pub original_source_code: &'a str,
    pub source_ranges: Vec<SourceRangePrompt<'a>>,
}

/// Status of an asynchronous API call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiCallStatus {
    Queued,
    Uploaded,
    InProgress,
    Completed,
    Failed,
}

/// Response of the create endpoints; only the id is needed.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatedJob {
    pub id: Uuid,
    #[serde(default)]
    pub status: Option<ApiCallStatus>,
}

/// Response of the job status endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct TextToCadResponse {
    #[serde(rename = "type")]
    pub kind: Option<JobKind>,
    pub id: Uuid,
    pub status: ApiCallStatus,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl TextToCadResponse {
    /// Convert the wire record into a status snapshot for the expected job kind.
    pub fn into_status(self, expected: JobKind) -> Result<JobStatus, Error> {
        if let Some(kind) = self.kind {
            if kind != expected {
                return Err(Error::unexpected(format!(
                    "job {} is of type {kind}, expected {expected}",
                    self.id
                )));
            }
        }

        match self.status {
            ApiCallStatus::Queued | ApiCallStatus::Uploaded => Ok(JobStatus::Queued),
            ApiCallStatus::InProgress => Ok(JobStatus::InProgress),
            ApiCallStatus::Completed => self.code.map(JobStatus::Completed).ok_or_else(|| {
                Error::unexpected(format!("job {} completed without any code", self.id))
            }),
            ApiCallStatus::Failed => Ok(JobStatus::Failed(
                self.error
                    .unwrap_or_else(|| "the service did not report a reason".to_string()),
            )),
        }
    }
}

/// Error body returned by the API on non-success responses.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    pub error_code: Option<String>,
    pub message: Option<String>,
}

/// Extract the most useful message from an error response body.
/// Falls back to the error code, then to the raw body.
pub fn error_message(body: &str) -> String {
    match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(ApiErrorBody {
            message: Some(message),
            ..
        }) => message,
        Ok(ApiErrorBody {
            error_code: Some(code),
            ..
        }) => code,
        _ => body.to_string(),
    }
}
