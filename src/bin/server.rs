//! formae MCP server
//!
//! Run with: formae-mcp

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use formae_mcp::cli::{FormaeCli, SystemRunner};
use formae_mcp::client::{AgentClient, HttpTransport};
use formae_mcp::config::{AgentEndpoint, EndpointOverrides, PORT_ENV, URL_ENV};
use formae_mcp::error::Result;
use formae_mcp::mcp::McpServer;
use formae_mcp::FormaeHandler;

#[derive(Parser, Debug)]
#[command(name = "formae-mcp")]
#[command(about = "MCP server exposing the formae infrastructure agent", version)]
struct Args {
    /// Agent base URL (overrides the formae config file)
    #[arg(long, env = URL_ENV)]
    agent_url: Option<String>,

    /// Agent port (overrides the formae config file)
    #[arg(long, env = PORT_ENV)]
    agent_port: Option<String>,

    /// Per-request timeout for agent calls in seconds
    #[arg(long, env = "FORMAE_MCP_TIMEOUT_SECS", default_value = "30")]
    timeout_secs: u64,

    /// formae executable used for eval, extract and plugin listing
    #[arg(long, env = "FORMAE_BIN", default_value = "formae")]
    formae_bin: String,

    /// Emit logs as JSON lines
    #[arg(long, env = "FORMAE_MCP_LOG_JSON")]
    log_json: bool,
}

/// Logs go to stderr; stdout carries the protocol
fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(false),
            )
            .init();
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.log_json);

    let endpoint = AgentEndpoint::resolve(&EndpointOverrides {
        url: args.agent_url,
        port: args.agent_port,
    });
    let transport = HttpTransport::new(&endpoint, Duration::from_secs(args.timeout_secs))?;

    let handler = FormaeHandler::new(
        AgentClient::new(Arc::new(transport)),
        FormaeCli::new(Arc::new(SystemRunner), args.formae_bin),
    );
    let server = McpServer::new(handler);

    tracing::info!(
        "formae MCP server {} starting (agent: {})",
        formae_mcp::VERSION,
        endpoint
    );
    server.run()?;

    Ok(())
}
