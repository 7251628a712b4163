use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::Error;

/// CAD export format requested alongside the generated KCL.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Fbx,
    Glb,
    Gltf,
    Obj,
    Ply,
    #[default]
    Step,
    Stl,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Fbx => "fbx",
            OutputFormat::Glb => "glb",
            OutputFormat::Gltf => "gltf",
            OutputFormat::Obj => "obj",
            OutputFormat::Ply => "ply",
            OutputFormat::Step => "step",
            OutputFormat::Stl => "stl",
        }
    }
}

/// A request to generate a new model from a free-text prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    prompt: String,
    output_format: OutputFormat,
    kcl: bool,
}

impl GenerationRequest {
    /// Create a request, rejecting empty or whitespace-only prompts.
    pub fn new(prompt: impl Into<String>) -> Result<Self, Error> {
        let prompt = prompt.into();
        if prompt.trim().is_empty() {
            return Err(Error::validation("prompt must not be empty"));
        }

        Ok(Self {
            prompt,
            output_format: OutputFormat::Step,
            kcl: true,
        })
    }

    /// Export format produced alongside the KCL. Defaults to STEP.
    pub fn with_output_format(mut self, output_format: OutputFormat) -> Self {
        self.output_format = output_format;
        self
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn output_format(&self) -> OutputFormat {
        self.output_format
    }

    pub fn kcl(&self) -> bool {
        self.kcl
    }
}

/// A 1-based line/column position in KCL source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourcePosition {
    pub line: u32,
    pub column: u32,
}

impl SourcePosition {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl Default for SourcePosition {
    fn default() -> Self {
        Self { line: 1, column: 1 }
    }
}

/// The span of source an iteration prompt applies to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRange {
    pub start: SourcePosition,
    pub end: SourcePosition,
}

/// A request to modify existing KCL source with a prompt scoped to a range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IterationRequest {
    source: String,
    prompt: String,
    range: SourceRange,
}

impl IterationRequest {
    /// Create an iteration request.
    ///
    /// The source and prompt must be non-empty and every position must be
    /// at least 1.
    pub fn new(
        source: impl Into<String>,
        prompt: impl Into<String>,
        range: SourceRange,
    ) -> Result<Self, Error> {
        let source = source.into();
        let prompt = prompt.into();

        if prompt.trim().is_empty() {
            return Err(Error::validation("prompt must not be empty"));
        }
        if source.trim().is_empty() {
            return Err(Error::validation("KCL source must not be empty"));
        }
        let positions = [range.start, range.end];
        if positions.iter().any(|p| p.line < 1 || p.column < 1) {
            return Err(Error::validation(
                "start_line, start_column, end_line and end_column must be greater than or equal to 1",
            ));
        }

        Ok(Self {
            source,
            prompt,
            range,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn range(&self) -> SourceRange {
        self.range
    }
}

/// Where the KCL source for an iteration comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KclSource {
    Code(String),
    Path(PathBuf),
}

impl KclSource {
    /// Pick a source from optional inline code and an optional file path.
    /// Inline code wins when both are given.
    pub fn from_args(code: Option<String>, path: Option<PathBuf>) -> Result<Self, Error> {
        let code = code.filter(|c| !c.is_empty());
        match (code, path) {
            (Some(code), Some(path)) => {
                warn!(path = %path.display(), "Both code and kcl_path provided, using code");
                Ok(KclSource::Code(code))
            }
            (Some(code), None) => Ok(KclSource::Code(code)),
            (None, Some(path)) => Ok(KclSource::Path(path)),
            (None, None) => Err(Error::validation("neither kcl_code nor kcl_path provided")),
        }
    }

    /// Resolve to source text, reading the file if needed.
    pub async fn load(self) -> Result<String, Error> {
        let path = match self {
            KclSource::Code(code) => return Ok(code),
            KclSource::Path(path) => path,
        };

        let metadata = tokio::fs::metadata(&path).await?;
        if metadata.is_dir() {
            return Err(Error::validation(format!(
                "{} is a directory, not a .kcl file",
                path.display()
            )));
        }
        if path.extension().and_then(|ext| ext.to_str()) != Some("kcl") {
            return Err(Error::validation(format!(
                "{} is not a .kcl file",
                path.display()
            )));
        }

        Ok(tokio::fs::read_to_string(&path).await?)
    }
}

/// Any job the adapter knows how to submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobRequest {
    Generate(GenerationRequest),
    Iterate(IterationRequest),
}

impl From<GenerationRequest> for JobRequest {
    fn from(request: GenerationRequest) -> Self {
        JobRequest::Generate(request)
    }
}

impl From<IterationRequest> for JobRequest {
    fn from(request: IterationRequest) -> Self {
        JobRequest::Iterate(request)
    }
}
