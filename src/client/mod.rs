//! Lightweight client for the formae agent REST API
//!
//! Each call maps the agent's status codes onto an [`Outcome`] and then onto
//! the operation's contract: list-style calls treat 404 as an empty
//! collection, single-entity lookups treat it as not found, and everything
//! else outside the expected success code is an error carrying the body.

mod transport;

pub use transport::{
    AgentRequest, AgentResponse, FilePart, HttpTransport, Method, MultipartForm, Transport,
    DEFAULT_TIMEOUT,
};

use std::sync::Arc;

use reqwest::StatusCode;

use crate::error::{FormaeError, Result};
use crate::types::{CommandSubmission, DriftKind};

/// Value of the `Client-ID` header on command endpoints
pub const CLIENT_ID: &str = "formae-mcp";

pub const EMPTY_LIST: &str = "[]";
pub const EMPTY_COMMANDS: &str = r#"{"Commands":[]}"#;
pub const EMPTY_CANCELLED: &str = r#"{"CommandIds":[]}"#;

/// How a 404 should be read for a given call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnMissing {
    /// List-style call: no results
    Empty,
    /// Single-entity lookup: the entity does not exist
    NotFound,
    /// 404 is just another failure
    Fail,
}

/// Classified agent response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Ok(String),
    Empty,
    NotFound,
    Failed { status: u16, body: String },
}

impl Outcome {
    pub fn classify(response: AgentResponse, success: StatusCode, on_missing: OnMissing) -> Self {
        if response.status == success.as_u16() {
            return Outcome::Ok(response.body);
        }
        if response.status == StatusCode::NOT_FOUND.as_u16() {
            match on_missing {
                OnMissing::Empty => return Outcome::Empty,
                OnMissing::NotFound => return Outcome::NotFound,
                OnMissing::Fail => {}
            }
        }
        Outcome::Failed {
            status: response.status,
            body: response.body,
        }
    }

    /// Payload, with `empty` standing in for an empty result
    pub fn or_empty(self, empty: &str) -> Result<String> {
        match self {
            Outcome::Ok(body) => Ok(body),
            Outcome::Empty | Outcome::NotFound => Ok(empty.to_string()),
            Outcome::Failed { status, body } => Err(FormaeError::Agent { status, body }),
        }
    }

    /// Payload, or a not-found error naming `entity`
    pub fn or_not_found(self, entity: impl Into<String>) -> Result<String> {
        match self {
            Outcome::Ok(body) => Ok(body),
            Outcome::Empty | Outcome::NotFound => Err(FormaeError::NotFound(entity.into())),
            Outcome::Failed { status, body } => Err(FormaeError::Agent { status, body }),
        }
    }

    /// Payload; anything but success is an error
    pub fn into_body(self) -> Result<String> {
        match self {
            Outcome::Ok(body) => Ok(body),
            Outcome::Empty | Outcome::NotFound => Err(FormaeError::Agent {
                status: StatusCode::NOT_FOUND.as_u16(),
                body: String::new(),
            }),
            Outcome::Failed { status, body } => Err(FormaeError::Agent { status, body }),
        }
    }
}

/// Client for the formae agent
#[derive(Clone)]
pub struct AgentClient {
    transport: Arc<dyn Transport>,
}

impl AgentClient {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    fn call(
        &self,
        request: &AgentRequest,
        success: StatusCode,
        on_missing: OnMissing,
    ) -> Result<Outcome> {
        tracing::debug!("{} {}", request.method, request.path());
        let response = self.transport.send(request)?;
        if response.status != success.as_u16() {
            tracing::debug!(
                "{} {} returned status {}",
                request.method,
                request.path(),
                response.status
            );
        }
        Ok(Outcome::classify(response, success, on_missing))
    }

    /// Query resources; `query` is forwarded verbatim
    pub fn list_resources(&self, query: &str) -> Result<String> {
        let request = AgentRequest::get(&["api", "v1", "resources"]).query("query", query);
        self.call(&request, StatusCode::OK, OnMissing::Empty)?
            .or_empty(EMPTY_LIST)
    }

    pub fn list_stacks(&self) -> Result<String> {
        let request = AgentRequest::get(&["api", "v1", "stacks"]);
        self.call(&request, StatusCode::OK, OnMissing::Empty)?
            .or_empty(EMPTY_LIST)
    }

    pub fn list_targets(&self, query: &str) -> Result<String> {
        let request = AgentRequest::get(&["api", "v1", "targets"]).query("query", query);
        self.call(&request, StatusCode::OK, OnMissing::Empty)?
            .or_empty(EMPTY_LIST)
    }

    pub fn get_command_status(&self, command_id: &str) -> Result<String> {
        let request = AgentRequest::get(&["api", "v1", "commands", "status"])
            .query("id", command_id)
            .header("Client-ID", CLIENT_ID);
        self.call(&request, StatusCode::OK, OnMissing::NotFound)?
            .or_not_found(format!("command {}", command_id))
    }

    pub fn list_commands(&self, query: &str, max_results: &str) -> Result<String> {
        let request = AgentRequest::get(&["api", "v1", "commands", "status"])
            .query("query", query)
            .query("max_results", max_results)
            .header("Client-ID", CLIENT_ID);
        self.call(&request, StatusCode::OK, OnMissing::Empty)?
            .or_empty(EMPTY_COMMANDS)
    }

    pub fn get_agent_stats(&self) -> Result<String> {
        let request = AgentRequest::get(&["api", "v1", "stats"]);
        self.call(&request, StatusCode::OK, OnMissing::Fail)?
            .into_body()
    }

    pub fn check_health(&self) -> Result<()> {
        let request = AgentRequest::get(&["api", "v1", "health"]);
        let response = self
            .transport
            .send(&request)
            .map_err(|e| FormaeError::Transport(format!("agent is not reachable: {}", e)))?;
        if response.status != StatusCode::OK.as_u16() {
            return Err(FormaeError::Unhealthy(response.status));
        }
        Ok(())
    }

    /// Submit an apply or destroy command; the agent answers 202
    pub fn submit_command(&self, submission: &CommandSubmission) -> Result<String> {
        let form = MultipartForm {
            fields: submission.fields(),
            file: submission.forma.as_ref().map(|content| FilePart {
                field: "file".to_string(),
                file_name: "forma.json".to_string(),
                content: content.clone(),
            }),
        };
        let request = AgentRequest::post(&["api", "v1", "commands"])
            .header("Client-ID", CLIENT_ID)
            .form(form);
        self.call(&request, StatusCode::ACCEPTED, OnMissing::Fail)?
            .into_body()
    }

    pub fn destroy_by_query(&self, query: &str, simulate: bool) -> Result<String> {
        self.submit_command(&CommandSubmission::destroy_by_query(query, simulate))
    }

    /// Cancel in-progress commands; with no query the agent cancels the most recent one
    pub fn cancel_commands(&self, query: &str) -> Result<String> {
        let request = AgentRequest::post(&["api", "v1", "commands", "cancel"])
            .query("query", query)
            .header("Client-ID", CLIENT_ID);
        self.call(&request, StatusCode::ACCEPTED, OnMissing::Empty)?
            .or_empty(EMPTY_CANCELLED)
    }

    /// Modification report for a single stack
    pub fn stack_drift(&self, stack: &str, kind: DriftKind) -> Result<String> {
        let request =
            AgentRequest::get(&["api", "v1", "stacks", stack, kind.path_segment()]);
        self.call(&request, StatusCode::OK, OnMissing::Fail)?
            .into_body()
    }

    pub fn list_drift(&self, stack: &str) -> Result<String> {
        self.stack_drift(stack, DriftKind::Drift)
    }

    pub fn list_changes_since_last_reconcile(&self, stack: &str) -> Result<String> {
        self.stack_drift(stack, DriftKind::ChangesSinceLastReconcile)
    }

    pub fn force_sync(&self) -> Result<()> {
        let request = AgentRequest::post(&["api", "v1", "admin", "synchronize"]);
        self.call(&request, StatusCode::OK, OnMissing::Fail)?
            .into_body()
            .map(|_| ())
    }

    pub fn force_discover(&self) -> Result<()> {
        let request = AgentRequest::post(&["api", "v1", "admin", "discover"]);
        self.call(&request, StatusCode::OK, OnMissing::Fail)?
            .into_body()
            .map(|_| ())
    }
}
