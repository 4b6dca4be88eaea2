//! Agent endpoint resolution
//!
//! Precedence, highest first:
//! 1. Environment variables (`FORMAE_AGENT_URL`, `FORMAE_AGENT_PORT`) or
//!    the equivalent command-line flags
//! 2. The formae CLI config file (`~/.config/formae/formae.conf.pkl`)
//! 3. Hardcoded defaults (`http://localhost:49684`)
//!
//! URL and port are resolved independently.

use std::fmt;
use std::path::PathBuf;

use once_cell::sync::Lazy;
use regex::Regex;

pub const DEFAULT_URL: &str = "http://localhost";
pub const DEFAULT_PORT: &str = "49684";
pub const URL_ENV: &str = "FORMAE_AGENT_URL";
pub const PORT_ENV: &str = "FORMAE_AGENT_PORT";

const CONFIG_DIR: &str = ".config/formae";
const CONFIG_FILE_NAME: &str = "formae.conf.pkl";

static URL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"url\s*=\s*"([^"]+)""#).expect("valid url pattern"));
static PORT_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"port\s*=\s*(\d+)").expect("valid port pattern"));

/// Resolved agent endpoint. Computed once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentEndpoint {
    pub url: String,
    pub port: String,
}

impl Default for AgentEndpoint {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            port: DEFAULT_PORT.to_string(),
        }
    }
}

impl fmt::Display for AgentEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.url, self.port)
    }
}

/// Highest-precedence overrides, from the command line or
/// `FORMAE_AGENT_URL` / `FORMAE_AGENT_PORT`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EndpointOverrides {
    pub url: Option<String>,
    pub port: Option<String>,
}

/// Values found inside the `cli { api { ... } }` block of a config file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliApi {
    pub url: Option<String>,
    pub port: Option<String>,
}

impl AgentEndpoint {
    /// Resolve from the user's config file and the given overrides.
    ///
    /// A missing home directory or unreadable config file is not an error;
    /// it simply contributes nothing.
    pub fn resolve(overrides: &EndpointOverrides) -> Self {
        let file = config_path().and_then(|path| match std::fs::read_to_string(&path) {
            Ok(content) => {
                tracing::debug!("Read formae config from {}", path.display());
                Some(content)
            }
            Err(e) => {
                tracing::debug!("No formae config at {}: {}", path.display(), e);
                None
            }
        });

        Self::resolve_from(file.as_deref(), overrides)
    }

    /// Pure resolution: defaults, then config file content, then overrides.
    pub fn resolve_from(config_content: Option<&str>, overrides: &EndpointOverrides) -> Self {
        let mut endpoint = Self::default();

        if let Some(content) = config_content {
            let api = parse_cli_api(content);
            if let Some(url) = api.url {
                endpoint.url = url;
            }
            if let Some(port) = api.port {
                endpoint.port = port;
            }
        }

        if let Some(url) = non_empty(overrides.url.as_deref()) {
            endpoint.url = url.to_string();
        }
        if let Some(port) = non_empty(overrides.port.as_deref()) {
            endpoint.port = port.to_string();
        }

        endpoint
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Location of the formae CLI config file, if a home directory exists
pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(CONFIG_DIR).join(CONFIG_FILE_NAME))
}

/// Extract `url` and `port` from within the `cli { api { ... } }` block of a
/// PKL config file using line-based brace-depth tracking.
pub fn parse_cli_api(content: &str) -> CliApi {
    let mut api = CliApi::default();

    let mut in_cli = false;
    let mut in_api = false;
    let mut depth: i32 = 0;
    let mut cli_depth: i32 = 0;
    let mut api_depth: i32 = 0;

    for line in content.lines() {
        let trimmed = line.trim();

        if trimmed.starts_with("//") {
            continue;
        }

        if !in_cli && trimmed.starts_with("cli") && trimmed.contains('{') {
            in_cli = true;
            cli_depth = depth;
            depth += 1;
            continue;
        }

        if in_cli && !in_api && trimmed.starts_with("api") && trimmed.contains('{') {
            in_api = true;
            api_depth = depth;
            depth += 1;
            continue;
        }

        for ch in trimmed.chars() {
            match ch {
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if in_api && depth == api_depth {
                        in_api = false;
                    }
                    if in_cli && depth == cli_depth {
                        in_cli = false;
                    }
                }
                _ => {}
            }
        }

        if in_cli && in_api {
            if let Some(caps) = URL_PATTERN.captures(trimmed) {
                api.url = Some(caps[1].to_string());
            }
            if let Some(caps) = PORT_PATTERN.captures(trimmed) {
                api.port = Some(caps[1].to_string());
            }
        }
    }

    api
}
