//! HTTP transport to the formae agent
//!
//! `Transport` is the narrow seam every agent call goes through. The
//! production implementation drives an async reqwest client on a private
//! current-thread runtime so the synchronous MCP loop can block on it.

use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use reqwest::Url;

use crate::config::AgentEndpoint;
use crate::error::{FormaeError, Result};

/// Default per-call timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Method::Get => write!(f, "GET"),
            Method::Post => write!(f, "POST"),
        }
    }
}

/// File part of a multipart form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePart {
    pub field: String,
    pub file_name: String,
    pub content: Vec<u8>,
}

/// Multipart form body
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultipartForm {
    pub fields: Vec<(String, String)>,
    pub file: Option<FilePart>,
}

impl MultipartForm {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    fn to_reqwest(&self) -> reqwest::multipart::Form {
        let mut form = reqwest::multipart::Form::new();
        for (name, value) in &self.fields {
            form = form.text(name.clone(), value.clone());
        }
        if let Some(ref file) = self.file {
            let part = reqwest::multipart::Part::bytes(file.content.clone())
                .file_name(file.file_name.clone());
            form = form.part(file.field.clone(), part);
        }
        form
    }
}

/// A request against the agent API, independent of any HTTP library
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentRequest {
    pub method: Method,
    /// Unescaped path segments, e.g. `["api", "v1", "stacks", "prod", "drift"]`
    pub segments: Vec<String>,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub form: Option<MultipartForm>,
}

impl AgentRequest {
    fn new(method: Method, segments: &[&str]) -> Self {
        Self {
            method,
            segments: segments.iter().map(|s| s.to_string()).collect(),
            query: Vec::new(),
            headers: Vec::new(),
            form: None,
        }
    }

    pub fn get(segments: &[&str]) -> Self {
        Self::new(Method::Get, segments)
    }

    pub fn post(segments: &[&str]) -> Self {
        Self::new(Method::Post, segments)
    }

    /// Add a query parameter; empty values are left out
    pub fn query(mut self, name: &str, value: &str) -> Self {
        if !value.is_empty() {
            self.query.push((name.to_string(), value.to_string()));
        }
        self
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn form(mut self, form: MultipartForm) -> Self {
        self.form = Some(form);
        self
    }

    /// Unescaped path, for logging and matching
    pub fn path(&self) -> String {
        format!("/{}", self.segments.join("/"))
    }

    pub fn query_value(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Raw agent response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentResponse {
    pub status: u16,
    pub body: String,
}

impl AgentResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Sends agent requests
pub trait Transport: Send + Sync {
    fn send(&self, request: &AgentRequest) -> Result<AgentResponse>;
}

/// reqwest-backed transport with a bounded per-call timeout
pub struct HttpTransport {
    client: reqwest::Client,
    base: Url,
    runtime: tokio::runtime::Runtime,
}

impl HttpTransport {
    pub fn new(endpoint: &AgentEndpoint, timeout: Duration) -> Result<Self> {
        let base = Url::parse(&endpoint.to_string()).map_err(|e| {
            FormaeError::Config(format!("invalid agent endpoint '{}': {}", endpoint, e))
        })?;
        if base.cannot_be_a_base() {
            return Err(FormaeError::Config(format!(
                "invalid agent endpoint '{}': not a base URL",
                endpoint
            )));
        }

        let client = reqwest::Client::builder().timeout(timeout).build()?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        Ok(Self {
            client,
            base,
            runtime,
        })
    }

    /// Build the full URL, escaping each path segment
    pub fn url_for(&self, request: &AgentRequest) -> Result<Url> {
        let mut url = self.base.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| FormaeError::Config(format!("invalid agent endpoint '{}'", self.base)))?;
            segments.pop_if_empty().extend(&request.segments);
        }
        if !request.query.is_empty() {
            url.query_pairs_mut().extend_pairs(&request.query);
        }
        Ok(url)
    }

    async fn send_async(&self, request: &AgentRequest) -> Result<AgentResponse> {
        let url = self.url_for(request)?;

        let mut builder = match request.method {
            Method::Get => self.client.get(url),
            Method::Post => self.client.post(url),
        };
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder = match request.form {
            Some(ref form) => builder.multipart(form.to_reqwest()),
            None if request.method == Method::Post => {
                builder.header(CONTENT_TYPE, "application/json")
            }
            None => builder,
        };

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| {
            FormaeError::Transport(format!("failed to read response: {}", e))
        })?;

        Ok(AgentResponse { status, body })
    }
}

impl Transport for HttpTransport {
    fn send(&self, request: &AgentRequest) -> Result<AgentResponse> {
        self.runtime.block_on(self.send_async(request))
    }
}
