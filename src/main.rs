//! Zoo MCP Server - Text-to-CAD for AI assistants
//!
//! Serves the Model Context Protocol over stdio.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use rmcp::{transport::stdio, ServiceExt};
use tracing::info;
use tracing_subscriber::EnvFilter;

use zoo_mcp::{Config, TextToCad, ZooMcpServer, ZooProvider};

#[derive(Parser)]
#[command(name = "zoo-mcp")]
#[command(about = "MCP server for Zoo Text-to-CAD", long_about = None)]
struct Cli {
    /// Zoo API base URL (overrides ZOO_HOST)
    #[arg(long)]
    base_url: Option<String>,

    /// Seconds between job status polls
    #[arg(long)]
    poll_interval: Option<f64>,

    /// Seconds to wait for a job before giving up
    #[arg(long)]
    deadline: Option<f64>,
}

fn init_logging() {
    // stdout carries the MCP transport, so logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    dotenvy::dotenv().ok();
    init_logging();

    let mut config = Config::from_env()?;
    if let Some(base_url) = cli.base_url {
        config.zoo.base_url = base_url;
    }
    if let Some(secs) = cli.poll_interval {
        config.poll.interval = Duration::try_from_secs_f64(secs)?;
    }
    if let Some(secs) = cli.deadline {
        config.poll.deadline = Duration::try_from_secs_f64(secs)?;
    }
    config.poll.validate()?;

    let provider = ZooProvider::from_config(&config.zoo)?;
    let adapter = TextToCad::new(Arc::new(provider), config.poll);

    info!(base_url = %config.zoo.base_url, "Starting Zoo MCP Server (stdio mode)");
    let service = ZooMcpServer::new(adapter).serve(stdio()).await?;
    service.waiting().await?;
    info!("Shutting down");

    Ok(())
}
