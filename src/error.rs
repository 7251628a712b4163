use std::time::Duration;

use reqwest::StatusCode;
use thiserror::Error;

/// Errors that can occur while submitting or awaiting a Text-to-CAD job.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Job submission failed: {0}")]
    Submission(String),

    #[error("Polling job {job_id} failed: {message}")]
    Polling {
        job_id: String,
        message: String,
        transient: bool,
    },

    #[error("Text-to-CAD job {job_id} failed: {reason}")]
    RemoteFailure { job_id: String, reason: String },

    #[error("Timed out after {waited:?} waiting for job {job_id}; it may still complete on the server")]
    Timeout { job_id: String, waited: Duration },

    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation(message.into())
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Error::Auth(message.into())
    }

    pub fn submission(message: impl Into<String>) -> Self {
        Error::Submission(message.into())
    }

    pub fn config(message: impl Into<String>) -> Self {
        Error::Config(message.into())
    }

    pub fn unexpected(message: impl Into<String>) -> Self {
        Error::UnexpectedResponse(message.into())
    }

    pub fn polling(job_id: impl ToString, message: impl Into<String>, transient: bool) -> Self {
        Error::Polling {
            job_id: job_id.to_string(),
            message: message.into(),
            transient,
        }
    }

    /// Classify a transport error raised while polling.
    pub fn polling_transport(job_id: impl ToString, err: reqwest::Error) -> Self {
        let transient = err.is_timeout() || err.is_connect() || err.is_request();
        Self::polling(job_id, err.to_string(), transient)
    }

    /// Classify a non-success HTTP status returned while polling.
    pub fn polling_status(job_id: impl ToString, status: StatusCode, body: &str) -> Self {
        if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            return Error::auth(body.to_string());
        }
        let transient = status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error();
        Self::polling(job_id, format!("HTTP {status}: {body}"), transient)
    }

    /// Whether a failed poll may be retried.
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::Polling { transient: true, .. })
    }
}
