//! Core types for formae-mcp
//!
//! Tool inputs, command submissions and the aggregated drift payload. All of
//! these live for a single request only.

use serde::{Deserialize, Serialize};

/// Kind of command submitted to the agent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    Apply,
    Destroy,
}

impl std::fmt::Display for CommandKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommandKind::Apply => write!(f, "apply"),
            CommandKind::Destroy => write!(f, "destroy"),
        }
    }
}

/// Apply mode for `apply` commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyMode {
    /// Infrastructure must match the forma exactly
    Reconcile,
    /// Only the declared changes are applied
    Patch,
}

impl std::fmt::Display for ApplyMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApplyMode::Reconcile => write!(f, "reconcile"),
            ApplyMode::Patch => write!(f, "patch"),
        }
    }
}

impl std::str::FromStr for ApplyMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "reconcile" => Ok(ApplyMode::Reconcile),
            "patch" => Ok(ApplyMode::Patch),
            "" => Err("mode is required (reconcile or patch)".to_string()),
            other => Err(format!(
                "mode must be 'reconcile' or 'patch', got '{}'",
                other
            )),
        }
    }
}

/// A command submission, sent to the agent as multipart form data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSubmission {
    pub command: CommandKind,
    pub mode: Option<ApplyMode>,
    pub simulate: bool,
    pub force: bool,
    /// Destroy-by-query selector; mutually exclusive with `forma`
    pub query: Option<String>,
    /// Evaluated forma JSON, uploaded as `forma.json`
    pub forma: Option<Vec<u8>>,
}

impl CommandSubmission {
    pub fn apply(mode: ApplyMode, simulate: bool, force: bool, forma: Vec<u8>) -> Self {
        Self {
            command: CommandKind::Apply,
            mode: Some(mode),
            simulate,
            force,
            query: None,
            forma: Some(forma),
        }
    }

    pub fn destroy(simulate: bool, forma: Vec<u8>) -> Self {
        Self {
            command: CommandKind::Destroy,
            mode: None,
            simulate,
            force: false,
            query: None,
            forma: Some(forma),
        }
    }

    pub fn destroy_by_query(query: impl Into<String>, simulate: bool) -> Self {
        Self {
            command: CommandKind::Destroy,
            mode: None,
            simulate,
            force: false,
            query: Some(query.into()),
            forma: None,
        }
    }

    /// Form fields in submission order. `force` is only sent when set.
    pub fn fields(&self) -> Vec<(String, String)> {
        let mut fields = vec![("command".to_string(), self.command.to_string())];
        if let Some(mode) = self.mode {
            fields.push(("mode".to_string(), mode.to_string()));
        }
        if let Some(ref query) = self.query {
            fields.push(("query".to_string(), query.clone()));
        }
        fields.push(("simulate".to_string(), self.simulate.to_string()));
        if self.force {
            fields.push(("force".to_string(), "true".to_string()));
        }
        fields
    }
}

/// Which per-stack modification report to fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriftKind {
    /// `/stacks/{stack}/drift`
    Drift,
    /// `/stacks/{stack}/changes-since-last-reconcile`
    ChangesSinceLastReconcile,
}

impl DriftKind {
    /// Trailing path segment on the agent API
    pub fn path_segment(&self) -> &'static str {
        match self {
            DriftKind::Drift => "drift",
            DriftKind::ChangesSinceLastReconcile => "changes-since-last-reconcile",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DriftKind::Drift => "drift",
            DriftKind::ChangesSinceLastReconcile => "changes",
        }
    }
}

/// Modified resources for one stack, as returned by the aggregate queries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StackDrift {
    #[serde(rename = "Stack")]
    pub stack: String,
    #[serde(rename = "ModifiedResources")]
    pub modified_resources: serde_json::Value,
}

// Tool inputs

#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueryInput {
    #[serde(default)]
    pub query: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GetCommandStatusInput {
    #[serde(default)]
    pub command_id: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListCommandsInput {
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub max_results: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListDriftInput {
    #[serde(default)]
    pub stack: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApplyFormaInput {
    #[serde(default)]
    pub file_path: String,
    #[serde(default)]
    pub mode: String,
    #[serde(default)]
    pub simulate: bool,
    #[serde(default)]
    pub force: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DestroyFormaInput {
    #[serde(default)]
    pub file_path: String,
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub simulate: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_mode_from_str() {
        assert_eq!("reconcile".parse::<ApplyMode>(), Ok(ApplyMode::Reconcile));
        assert_eq!("patch".parse::<ApplyMode>(), Ok(ApplyMode::Patch));
        assert_eq!(
            "invalid".parse::<ApplyMode>(),
            Err("mode must be 'reconcile' or 'patch', got 'invalid'".to_string())
        );
        assert!("".parse::<ApplyMode>().unwrap_err().contains("required"));
    }

    #[test]
    fn test_apply_fields() {
        let submission = CommandSubmission::apply(ApplyMode::Patch, true, true, b"{}".to_vec());
        let fields = submission.fields();
        assert_eq!(
            fields,
            vec![
                ("command".to_string(), "apply".to_string()),
                ("mode".to_string(), "patch".to_string()),
                ("simulate".to_string(), "true".to_string()),
                ("force".to_string(), "true".to_string()),
            ]
        );
    }

    #[test]
    fn test_destroy_by_query_fields_omit_force_and_mode() {
        let fields = CommandSubmission::destroy_by_query("stack:staging", false).fields();
        assert_eq!(
            fields,
            vec![
                ("command".to_string(), "destroy".to_string()),
                ("query".to_string(), "stack:staging".to_string()),
                ("simulate".to_string(), "false".to_string()),
            ]
        );
    }

    #[test]
    fn test_stack_drift_serializes_agent_casing() {
        let drift = StackDrift {
            stack: "production".to_string(),
            modified_resources: serde_json::json!([]),
        };
        assert_eq!(
            serde_json::to_string(&drift).unwrap(),
            r#"{"Stack":"production","ModifiedResources":[]}"#
        );
    }
}
