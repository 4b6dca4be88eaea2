//! MCP (Model Context Protocol) server implementation
//!
//! JSON-RPC over stdio exposing the formae agent as tools, resources and prompts.

pub mod instructions;
pub mod prompts;
pub mod protocol;
pub mod resources;
pub mod tools;

pub use protocol::{
    codes, methods, InitializeResult, McpHandler, McpRequest, McpResponse, McpServer,
    ToolCallResult,
};
pub use tools::{get_tool_definitions, validate_arguments, TOOL_DEFINITIONS};
