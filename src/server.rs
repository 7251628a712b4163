//! MCP server exposing Text-to-CAD as assistant tools.
//!
//! Tools always answer with text: generated KCL on success, or a message
//! starting with `Error: ` on failure.

use std::path::PathBuf;

use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{CallToolResult, Content, Implementation, ServerCapabilities, ServerInfo},
    schemars, tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler,
};
use serde::Deserialize;
use tracing::info;

use crate::adapter::{AdapterResult, TextToCad};
use crate::types::{KclSource, SourcePosition, SourceRange};

/// Arguments of the `text_to_cad` tool.
#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct TextToCadParams {
    /// The text prompt to be realized as KCL code.
    pub prompt: String,
}

fn first_position() -> u32 {
    1
}

/// Arguments of the `text_to_cad_iteration` tool.
#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct TextToCadIterationParams {
    /// The existing KCL code to be modified.
    #[serde(default)]
    pub kcl_code: Option<String>,
    /// Path to a .kcl file to modify. Ignored when kcl_code is given.
    #[serde(default)]
    pub kcl_path: Option<String>,
    /// A description of the changes to be made to the CAD model.
    pub prompt: String,
    /// Starting line of the range to modify (>= 1).
    #[serde(default = "first_position")]
    pub start_line: u32,
    /// Starting column of the range to modify (>= 1).
    #[serde(default = "first_position")]
    pub start_column: u32,
    /// Ending line of the range to modify (>= 1).
    #[serde(default = "first_position")]
    pub end_line: u32,
    /// Ending column of the range to modify (>= 1).
    #[serde(default = "first_position")]
    pub end_column: u32,
}

impl TextToCadIterationParams {
    fn range(&self) -> SourceRange {
        SourceRange {
            start: SourcePosition::new(self.start_line, self.start_column),
            end: SourcePosition::new(self.end_line, self.end_column),
        }
    }
}

/// The Zoo MCP server.
#[derive(Clone)]
pub struct ZooMcpServer {
    adapter: TextToCad,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl ZooMcpServer {
    pub fn new(adapter: TextToCad) -> Self {
        Self {
            adapter,
            tool_router: Self::tool_router(),
        }
    }

    #[tool(
        description = "Generate a CAD model as KCL code from a text prompt.\n\n\
# General Tips\n\
- Verbs like \"design a...\" or \"create a...\" are optional; \"A gear\" works as well as \"Create a gear\".\n\
- If the prompt omits important dimensions, Text-to-CAD will make its best guess.\n\
- Simple mechanical parts such as fasteners, bearings and connectors work best.\n\
- Shorter prompts of one or two sentences succeed more often and resolve faster.\n\
- The same prompt can give different results on different attempts; a failing prompt may succeed on retry.\n\n\
# Examples\n\
- \"A 21-tooth involute helical gear.\"\n\
- \"A plate with a hole in each corner for a #10 bolt. The plate is 4\" wide, 6\" tall.\"\n\
- \"A dodecahedron.\"\n\
- \"A 3x6 lego.\"\n\n\
Returns the generated KCL code, or a message starting with \"Error: \" if generation did not succeed."
    )]
    pub async fn text_to_cad(
        &self,
        Parameters(params): Parameters<TextToCadParams>,
    ) -> Result<CallToolResult, McpError> {
        info!(prompt = %params.prompt, "Received Text-To-CAD prompt");
        let text = self.adapter.generate(&params.prompt).await.into_text();
        Ok(CallToolResult::success(vec![Content::text(text)]))
    }

    #[tool(
        description = "Modify existing KCL code with Text-to-CAD iteration. Provide either kcl_code or kcl_path \
(a path to a .kcl file); if both are given kcl_code is used. The prompt applies to the range \
start_line:start_column to end_line:end_column (1-based, default 1). Returns the complete updated \
KCL code, or a message starting with \"Error: \" if the iteration did not succeed."
    )]
    pub async fn text_to_cad_iteration(
        &self,
        Parameters(params): Parameters<TextToCadIterationParams>,
    ) -> Result<CallToolResult, McpError> {
        info!(prompt = %params.prompt, "Received Text-To-CAD iteration prompt");
        let range = params.range();
        let text = match KclSource::from_args(params.kcl_code, params.kcl_path.map(PathBuf::from)) {
            Ok(source) => self.adapter.iterate(source, &params.prompt, range).await,
            Err(err) => AdapterResult::Failed(err),
        }
        .into_text();
        Ok(CallToolResult::success(vec![Content::text(text)]))
    }
}

#[tool_handler]
impl ServerHandler for ZooMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "zoo-mcp".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                ..Default::default()
            },
            instructions: Some(
                "Generate and modify CAD models as KCL code with Zoo Text-to-CAD. \
                 Tool results are KCL source, or a message starting with \"Error: \"."
                    .to_string(),
            ),
            ..Default::default()
        }
    }
}
