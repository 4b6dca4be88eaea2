//! Error types for formae-mcp

use thiserror::Error;

/// Result type alias for adapter operations
pub type Result<T> = std::result::Result<T, FormaeError>;

/// Main error type for formae-mcp
#[derive(Error, Debug)]
pub enum FormaeError {
    /// The agent could not be reached or the exchange broke off
    #[error("{0}")]
    Transport(String),

    #[error("agent returned status {status}: {body}")]
    Agent { status: u16, body: String },

    #[error("agent returned unhealthy status: {0}")]
    Unhealthy(u16),

    #[error("{0} not found")]
    NotFound(String),

    #[error("{0}")]
    InvalidInput(String),

    /// A local `formae` invocation failed; carries its diagnostic output
    #[error("{0}")]
    Process(String),

    #[error("failed to parse {0}")]
    Parse(String),

    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<FormaeError>,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<reqwest::Error> for FormaeError {
    fn from(e: reqwest::Error) -> Self {
        FormaeError::Transport(format!("request failed: {}", e))
    }
}

impl FormaeError {
    /// Wrap this error with a leading description
    pub fn context(self, context: impl Into<String>) -> Self {
        FormaeError::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Get error code for MCP protocol
    pub fn code(&self) -> i64 {
        match self {
            FormaeError::NotFound(_) => -32001,
            FormaeError::InvalidInput(_) => -32602,
            FormaeError::Context { source, .. } => source.code(),
            _ => -32000,
        }
    }

    /// True when the agent could not be reached at all
    pub fn is_unreachable(&self) -> bool {
        match self {
            FormaeError::Transport(_) => true,
            FormaeError::Context { source, .. } => source.is_unreachable(),
            _ => false,
        }
    }
}
