//! Multi-stack fan-out
//!
//! Without a target stack, drift-style queries enumerate every stack and
//! issue one sub-request per stack. Results keep the agent's stack order.
//! The first failing stack aborts the whole aggregate; partial results are
//! never returned.

use serde::Deserialize;
use serde_json::Value;

use crate::client::AgentClient;
use crate::error::{FormaeError, Result};
use crate::types::{DriftKind, StackDrift};

#[derive(Debug, Deserialize)]
struct StackSummary {
    #[serde(rename = "Label")]
    label: String,
}

#[derive(Debug, Deserialize)]
struct DriftReport {
    #[serde(rename = "ModifiedResources", default)]
    modified_resources: Value,
}

/// Parse the agent's stack listing into stack labels. The agent encodes an
/// empty listing as `null`.
pub fn stack_labels(stacks_json: &str) -> Result<Vec<String>> {
    let stacks: Option<Vec<StackSummary>> = serde_json::from_str(stacks_json)
        .map_err(|e| FormaeError::Parse(format!("stacks: {}", e)))?;
    Ok(stacks
        .unwrap_or_default()
        .into_iter()
        .map(|s| s.label)
        .collect())
}

/// Modified resources of a single-stack report, passed through as-is;
/// a missing or `null` list becomes `[]`
pub fn modified_resources(report_json: &str) -> Result<Value> {
    let report: DriftReport = serde_json::from_str(report_json)
        .map_err(|e| FormaeError::Parse(format!("drift report: {}", e)))?;
    Ok(match report.modified_resources {
        Value::Null => Value::Array(Vec::new()),
        other => other,
    })
}

/// Fetch `kind` for every stack the agent knows about
pub fn collect_stack_drift(client: &AgentClient, kind: DriftKind) -> Result<Vec<StackDrift>> {
    let stacks_json = client
        .list_stacks()
        .map_err(|e| e.context("failed to list stacks"))?;
    let labels = stack_labels(&stacks_json)?;

    tracing::debug!("Collecting {} across {} stacks", kind.label(), labels.len());

    let mut results = Vec::with_capacity(labels.len());
    for stack in labels {
        let stack_context = || format!("failed to get {} for stack {}", kind.label(), stack);

        let report = client
            .stack_drift(&stack, kind)
            .map_err(|e| e.context(stack_context()))?;
        let modified = modified_resources(&report).map_err(|e| e.context(stack_context()))?;

        results.push(StackDrift {
            stack,
            modified_resources: modified,
        });
    }

    Ok(results)
}
