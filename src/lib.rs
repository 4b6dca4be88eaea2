//! formae MCP - Model Context Protocol adapter for the formae agent
//!
//! Exposes the formae infrastructure agent's REST API as MCP tools,
//! documentation resources and guided prompts over stdio.

pub mod aggregate;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod handler;
pub mod mcp;
pub mod types;

pub use error::{FormaeError, Result};
pub use handler::FormaeHandler;
pub use types::*;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
