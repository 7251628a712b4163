use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The kind of Text-to-CAD job, as tagged by the remote service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    TextToCad,
    TextToCadIteration,
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobKind::TextToCad => write!(f, "text_to_cad"),
            JobKind::TextToCadIteration => write!(f, "text_to_cad_iteration"),
        }
    }
}

/// Identifier of a submitted job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JobHandle {
    pub id: Uuid,
    pub kind: JobKind,
}

impl JobHandle {
    pub fn new(id: Uuid, kind: JobKind) -> Self {
        Self { id, kind }
    }
}

impl fmt::Display for JobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

/// A snapshot of a job's progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    Queued,
    InProgress,
    /// Carries the generated KCL source.
    Completed(String),
    /// Carries the reason reported by the service.
    Failed(String),
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::Queued => write!(f, "queued"),
            JobStatus::InProgress => write!(f, "in_progress"),
            JobStatus::Completed(_) => write!(f, "completed"),
            JobStatus::Failed(_) => write!(f, "failed"),
        }
    }
}
