//! MCP tool definitions for formae

use serde_json::{json, Value};

use super::protocol::{ToolAnnotations, ToolDefinition};
use crate::error::{FormaeError, Result};

/// Behaviour class of a tool, rendered as MCP annotations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKind {
    ReadOnly,
    Destructive,
    Idempotent,
    Mutating,
}

impl ToolKind {
    pub fn annotations(self) -> ToolAnnotations {
        match self {
            ToolKind::ReadOnly => ToolAnnotations {
                read_only_hint: Some(true),
                ..Default::default()
            },
            ToolKind::Destructive => ToolAnnotations {
                destructive_hint: Some(true),
                ..Default::default()
            },
            ToolKind::Idempotent => ToolAnnotations {
                idempotent_hint: Some(true),
                ..Default::default()
            },
            ToolKind::Mutating => ToolAnnotations::default(),
        }
    }
}

const NO_ARGUMENTS: &str = r#"{"type": "object", "properties": {}}"#;

/// All tool definitions for formae: name, description, input schema, kind
pub const TOOL_DEFINITIONS: &[(&str, &str, &str, ToolKind)] = &[
    // Inventory
    (
        "list_resources",
        r#"Query infrastructure resources managed by the formae agent. Returns resources with their properties, stack assignment, type, label, and management status.

Use this tool when the user asks about deployed infrastructure, what resources exist, what's in a specific stack, or to find unmanaged resources discovered by the agent.

IMPORTANT: This endpoint returns ALL matching resources with full properties. On large environments a broad query can return hundreds of thousands of characters and overflow the context window. You MUST always combine 'managed:false' with a type filter (e.g., 'managed:false type:AWS::S3::Bucket'). Never use 'managed:false' alone. For broad questions like "what do we have?" or "what's unmanaged?", use get_agent_stats first for an overview of counts by provider, then drill down with type-filtered queries.

Query syntax uses field:value pairs. Supported fields:
- stack: filter by stack name (e.g., 'stack:production')
- type: filter by resource type (e.g., 'type:AWS::S3::Bucket')
- label: filter by resource label (e.g., 'label:my-bucket')
- managed: filter by management status (e.g., 'managed:false' for unmanaged/discovered resources)

Multiple filters can be combined: 'stack:production type:AWS::S3::Bucket'"#,
        r#"{
            "type": "object",
            "properties": {
                "query": {"type": "string", "description": "Query string to filter resources. Supported fields: stack, type, label, managed (boolean). Examples: 'managed:false type:AWS::S3::Bucket', 'type:AWS::S3::Bucket stack:production'. Leave empty to list all resources."}
            }
        }"#,
        ToolKind::ReadOnly,
    ),
    (
        "list_stacks",
        r#"List all infrastructure stacks known to the formae agent. Returns stack metadata including label, description, and resource count.

Use this tool when the user asks about their stacks, infrastructure organization, or needs an overview of what's deployed."#,
        NO_ARGUMENTS,
        ToolKind::ReadOnly,
    ),
    (
        "list_targets",
        r#"Query infrastructure targets (cloud accounts/regions) configured in the formae agent.

Use this tool when the user asks about their cloud targets, configured regions, or provider setup.

Query syntax uses field:value pairs. Supported fields:
- namespace: filter by cloud provider (e.g., 'namespace:AWS')
- discoverable: filter by discovery status (e.g., 'discoverable:true')
- label: filter by target label (e.g., 'label:prod-us-east-1')

Leave query empty to list all targets."#,
        r#"{
            "type": "object",
            "properties": {
                "query": {"type": "string", "description": "Query string to filter targets. Supported fields: namespace, discoverable, label. Leave empty to list all targets."}
            }
        }"#,
        ToolKind::ReadOnly,
    ),
    // Commands
    (
        "get_command_status",
        r#"Get the detailed status of a specific formae command by its ID. Returns the command's state, resource updates, and any errors.

Use this tool to check on the progress of a previously submitted apply or destroy command. Commands execute asynchronously in the formae agent."#,
        r#"{
            "type": "object",
            "properties": {
                "command_id": {"type": "string", "description": "The ID of the command to check status for."}
            },
            "required": ["command_id"]
        }"#,
        ToolKind::ReadOnly,
    ),
    (
        "list_commands",
        r#"List recent formae commands and their statuses. Returns command history with state, timestamps, and resource update summaries.

Use this tool when the user asks about running commands, recent deployments, command history, or what failed.

Query syntax uses field:value pairs. Supported fields:
- id: filter by command ID
- client: filter by client ('client:me' for this session's commands)
- command: filter by type ('command:apply' or 'command:destroy')
- status: filter by state ('status:in_progress', 'status:completed', 'status:failed')
- stack: filter by stack name
- managed: filter by managed status"#,
        r#"{
            "type": "object",
            "properties": {
                "query": {"type": "string", "description": "Query to filter commands. Use 'client:me' to filter to your own commands. Leave empty for most recent commands."},
                "max_results": {"type": "string", "description": "Maximum number of commands to return. Defaults to 10."}
            }
        }"#,
        ToolKind::ReadOnly,
    ),
    // Agent
    (
        "get_agent_stats",
        r#"Get statistics about the formae agent including version, managed/unmanaged resource counts by provider, active plugins, and command counts.

Use this tool to get an overview of the agent's state, check what plugins are loaded, or verify the agent version."#,
        NO_ARGUMENTS,
        ToolKind::ReadOnly,
    ),
    (
        "check_health",
        r#"Check if the formae agent is running and reachable. Returns a simple health status.

Use this tool to verify the agent is available before performing operations."#,
        NO_ARGUMENTS,
        ToolKind::ReadOnly,
    ),
    (
        "list_plugins",
        r#"List all active formae plugins including resource plugins, schema plugins, and network plugins. Shows plugin name, namespace, version, and capabilities.

Use this tool when the user asks about installed plugins, supported cloud providers, or available resource types."#,
        NO_ARGUMENTS,
        ToolKind::ReadOnly,
    ),
    // Drift
    (
        "list_drift",
        r#"List resources that drifted from their declared state, i.e. were modified outside of formae.

Use this tool when the user asks whether their infrastructure still matches the code, or which resources were changed by hand. Returns the modified resources grouped by stack, with resource type, label, and operation (update/delete).

If a stack is specified, only checks that stack. If no stack is specified, checks all known stacks and aggregates the results."#,
        r#"{
            "type": "object",
            "properties": {
                "stack": {"type": "string", "description": "Stack to check. Leave empty to check every stack."}
            }
        }"#,
        ToolKind::ReadOnly,
    ),
    (
        "list_changes_since_last_reconcile",
        r#"List infrastructure changes detected since the last reconcile.

Use this tool when the user asks about out-of-band changes, or what has changed in their infrastructure outside of formae since the last reconcile. Returns a list of modified resources grouped by stack, showing the resource type, label, and operation (update/delete).

If a stack is specified, only checks that stack. If no stack is specified, checks all known stacks and aggregates the results.

An empty result means no changes have been detected: the infrastructure matches the last reconciled state."#,
        r#"{
            "type": "object",
            "properties": {
                "stack": {"type": "string", "description": "Stack to check. Leave empty to check every stack."}
            }
        }"#,
        ToolKind::ReadOnly,
    ),
    (
        "extract_resources",
        r#"Extract resources as PKL infrastructure code. Runs 'formae extract' to export matching resources as a PKL forma file that can be incorporated into an IaC codebase.

Use this tool when you need to see the PKL representation of existing resources, typically unmanaged resources that the user wants to bring under formae management. The extracted PKL can then be merged into the user's existing forma files.

The query parameter selects which resources to extract. Always include at least one filter to avoid extracting the entire inventory.

Returns the extracted PKL source code as text."#,
        r#"{
            "type": "object",
            "properties": {
                "query": {"type": "string", "description": "Query selecting resources for extraction. Examples: 'managed:false type:AWS::S3::Bucket', 'managed:false stack:production'. Must include at least one filter."}
            },
            "required": ["query"]
        }"#,
        ToolKind::ReadOnly,
    ),
    // Mutations
    (
        "apply_forma",
        r#"Submit a forma apply command to the formae agent. The command is executed asynchronously. Use get_command_status or list_commands to monitor progress.

This tool evaluates the forma file (PKL -> JSON if needed) and submits it to the agent. There are two modes:

- reconcile: Guarantees the target infrastructure matches the forma file exactly. Resources in the file but not deployed are created; deployed resources not in the file are destroyed; differences are updated. This is the default mode for planned deployments.

- patch: Only applies the changes explicitly specified in the forma file. Other resources are untouched. Use this for urgent targeted fixes (e.g., scaling up a cluster during an incident). Patches create drift that should later be reconciled.

Use simulate=true to preview changes without modifying infrastructure.
Use force=true (reconcile only) to overwrite detected drift.

IMPORTANT: Always simulate first and confirm with the user before applying changes to infrastructure."#,
        r#"{
            "type": "object",
            "properties": {
                "file_path": {"type": "string", "description": "Absolute path to the forma file (.pkl or .json). PKL files are evaluated locally before submission."},
                "mode": {"type": "string", "enum": ["reconcile", "patch"], "description": "Apply mode. 'reconcile': full stack declaration, infrastructure ends up matching the file exactly. 'patch': only applies the specified changes without affecting other resources."},
                "simulate": {"type": "boolean", "default": false, "description": "If true, performs a dry-run showing what changes would be made without modifying infrastructure."},
                "force": {"type": "boolean", "default": false, "description": "Only applies to reconcile mode. If true, overwrites out-of-band changes (drift) detected since the last reconcile."}
            },
            "required": ["file_path", "mode"]
        }"#,
        ToolKind::Destructive,
    ),
    (
        "destroy_forma",
        r#"Submit a forma destroy command to remove infrastructure resources. Can destroy by forma file (all resources declared) or by query (matching resources). The command executes asynchronously.

IMPORTANT: Always simulate first and confirm with the user before destroying resources. Destruction is irreversible."#,
        r#"{
            "type": "object",
            "properties": {
                "file_path": {"type": "string", "description": "Path to the forma file declaring resources to destroy. Mutually exclusive with query."},
                "query": {"type": "string", "description": "Query to select resources for destruction. Examples: 'stack:staging', 'type:AWS::S3::Bucket label:temp-data'. Mutually exclusive with file_path."},
                "simulate": {"type": "boolean", "default": false, "description": "If true, performs a dry-run showing what would be destroyed without deleting resources."}
            }
        }"#,
        ToolKind::Destructive,
    ),
    (
        "cancel_commands",
        r#"Cancel one or more in-progress formae commands. If no query is provided, cancels the most recent in-progress command.

Use this tool when the user wants to stop a running deployment or destroy operation."#,
        r#"{
            "type": "object",
            "properties": {
                "query": {"type": "string", "description": "Optional query to select which commands to cancel. If empty, cancels the most recent in-progress command."}
            }
        }"#,
        ToolKind::Mutating,
    ),
    (
        "force_sync",
        r#"Trigger an immediate synchronization of resource state with the actual cloud infrastructure. The formae agent continuously syncs in the background, but this forces an immediate sync cycle.

Note: In environments with many resources, sync may take significant time. The sync runs asynchronously."#,
        NO_ARGUMENTS,
        ToolKind::Idempotent,
    ),
    (
        "force_discover",
        r#"Trigger an immediate resource discovery scan across configured cloud targets. The formae agent discovers new (unmanaged) resources periodically, but this forces an immediate discovery cycle.

Newly discovered resources appear as unmanaged resources that can be queried with list_resources using 'managed:false'."#,
        NO_ARGUMENTS,
        ToolKind::Idempotent,
    ),
];

/// Get all tool definitions as ToolDefinition structs
pub fn get_tool_definitions() -> Vec<ToolDefinition> {
    TOOL_DEFINITIONS
        .iter()
        .map(|(name, description, schema, kind)| ToolDefinition {
            name: name.to_string(),
            description: description.to_string(),
            input_schema: serde_json::from_str(schema).unwrap_or(json!({})),
            annotations: kind.annotations(),
        })
        .collect()
}

/// Input schema of a known tool
pub fn input_schema(name: &str) -> Option<Value> {
    TOOL_DEFINITIONS
        .iter()
        .find(|(n, _, _, _)| *n == name)
        .and_then(|(_, _, schema, _)| serde_json::from_str(schema).ok())
}

/// Check `arguments` against the tool's input schema.
///
/// Only the subset of JSON Schema the catalog uses is enforced: the value
/// must be an object, required properties must be present, and declared
/// `string`/`boolean` properties must have that type. Missing arguments are
/// treated as an empty object.
pub fn validate_arguments(name: &str, arguments: &Value) -> Result<()> {
    let schema = input_schema(name)
        .ok_or_else(|| FormaeError::InvalidInput(format!("unknown tool: {}", name)))?;

    let empty = serde_json::Map::new();
    let args = match arguments {
        Value::Null => &empty,
        Value::Object(map) => map,
        _ => {
            return Err(FormaeError::InvalidInput(format!(
                "invalid arguments for {}: expected an object",
                name
            )))
        }
    };

    if let Some(required) = schema.get("required").and_then(Value::as_array) {
        for field in required.iter().filter_map(Value::as_str) {
            if !args.contains_key(field) {
                return Err(FormaeError::InvalidInput(format!(
                    "invalid arguments for {}: missing required property '{}'",
                    name, field
                )));
            }
        }
    }

    if let Some(properties) = schema.get("properties").and_then(Value::as_object) {
        for (field, value) in args {
            let expected = properties
                .get(field)
                .and_then(|p| p.get("type"))
                .and_then(Value::as_str);
            let matches = match expected {
                Some("string") => value.is_string(),
                Some("boolean") => value.is_boolean(),
                _ => true,
            };
            if !matches {
                return Err(FormaeError::InvalidInput(format!(
                    "invalid arguments for {}: property '{}' must be a {}",
                    name,
                    field,
                    expected.unwrap_or("value")
                )));
            }
        }
    }

    Ok(())
}
