//! An MCP server that exposes Zoo Text-to-CAD as assistant tools.
//!
//! Text-to-CAD jobs run asynchronously on the remote service. The
//! [`TextToCad`] adapter submits a job, polls it until it reaches a terminal
//! state or a deadline passes, and flattens the outcome into text for the
//! tool-invocation layer in [`server`].

pub mod adapter;
pub mod config;
pub mod error;
pub mod provider;
pub mod providers;
pub mod server;
pub mod types;

// Re-export core types for easy usage
pub use adapter::{AdapterResult, TextToCad, ERROR_PREFIX};
pub use config::{Config, PollConfig, ZooConfig};
pub use error::Error;
pub use provider::JobProvider;
pub use providers::*;
pub use server::ZooMcpServer;
pub use types::*;
