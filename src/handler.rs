//! MCP request handler for the formae agent
//!
//! Dispatches JSON-RPC methods to the tool catalog, the documentation
//! resources and the prompts. Tool failures never escape as JSON-RPC
//! errors: they become error-flagged tool results. Only protocol-level
//! problems (unknown tool, schema violations, unknown resource or prompt)
//! are reported as JSON-RPC errors.

use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};

use crate::aggregate::collect_stack_drift;
use crate::cli::FormaeCli;
use crate::client::AgentClient;
use crate::error::{FormaeError, Result};
use crate::mcp::protocol::codes;
use crate::mcp::{
    get_tool_definitions, methods, prompts, resources, validate_arguments, InitializeResult,
    McpHandler, McpRequest, McpResponse, ToolCallResult,
};
use crate::types::*;

const DEFAULT_MAX_RESULTS: &str = "10";

/// Serves MCP requests against one agent and the local `formae` CLI
pub struct FormaeHandler {
    client: AgentClient,
    cli: FormaeCli,
}

impl FormaeHandler {
    pub fn new(client: AgentClient, cli: FormaeCli) -> Self {
        Self { client, cli }
    }

    /// Run tool `name`. Arguments must already satisfy the tool's schema.
    pub fn handle_tool_call(&self, name: &str, params: Value) -> ToolCallResult {
        let result = match name {
            // Inventory
            "list_resources" => self.tool_list_resources(params),
            "list_stacks" => self.client.list_stacks().map(ToolCallResult::json),
            "list_targets" => self.tool_list_targets(params),

            // Commands
            "get_command_status" => self.tool_get_command_status(params),
            "list_commands" => self.tool_list_commands(params),

            // Agent
            "get_agent_stats" => self.client.get_agent_stats().map(ToolCallResult::json),
            "check_health" => self
                .client
                .check_health()
                .map(|_| ToolCallResult::text("Formae agent is healthy and reachable.")),
            "list_plugins" => self.cli.list_plugins().map(ToolCallResult::text),

            // Drift
            "list_drift" => self.tool_stack_drift(params, DriftKind::Drift),
            "list_changes_since_last_reconcile" => {
                self.tool_stack_drift(params, DriftKind::ChangesSinceLastReconcile)
            }
            "extract_resources" => self.tool_extract_resources(params),

            // Mutations
            "apply_forma" => self.tool_apply_forma(params),
            "destroy_forma" => self.tool_destroy_forma(params),
            "cancel_commands" => self.tool_cancel_commands(params),
            "force_sync" => self
                .client
                .force_sync()
                .map(|_| ToolCallResult::text("Resource synchronization triggered successfully.")),
            "force_discover" => self
                .client
                .force_discover()
                .map(|_| ToolCallResult::text("Resource discovery triggered successfully.")),

            _ => Err(FormaeError::InvalidInput(format!("unknown tool: {}", name))),
        };

        result.unwrap_or_else(|e| {
            if e.is_unreachable() {
                tracing::warn!("{} failed, agent unreachable: {}", name, e);
            } else {
                tracing::warn!("{} failed: {}", name, e);
            }
            ToolCallResult::error(&e)
        })
    }

    fn tool_list_resources(&self, params: Value) -> Result<ToolCallResult> {
        let input: QueryInput = parse_input(params)?;
        self.client
            .list_resources(&input.query)
            .map(ToolCallResult::json)
    }

    fn tool_list_targets(&self, params: Value) -> Result<ToolCallResult> {
        let input: QueryInput = parse_input(params)?;
        self.client.list_targets(&input.query).map(ToolCallResult::json)
    }

    fn tool_get_command_status(&self, params: Value) -> Result<ToolCallResult> {
        let input: GetCommandStatusInput = parse_input(params)?;
        if input.command_id.is_empty() {
            return Err(FormaeError::InvalidInput("command_id is required".to_string()));
        }
        self.client
            .get_command_status(&input.command_id)
            .map(ToolCallResult::json)
    }

    fn tool_list_commands(&self, params: Value) -> Result<ToolCallResult> {
        let input: ListCommandsInput = parse_input(params)?;
        let max_results = if input.max_results.is_empty() {
            DEFAULT_MAX_RESULTS
        } else {
            input.max_results.as_str()
        };
        self.client
            .list_commands(&input.query, max_results)
            .map(ToolCallResult::json)
    }

    /// Single stack: the agent's body verbatim. No stack: every stack, aggregated.
    fn tool_stack_drift(&self, params: Value, kind: DriftKind) -> Result<ToolCallResult> {
        let input: ListDriftInput = parse_input(params)?;
        if !input.stack.is_empty() {
            return self
                .client
                .stack_drift(&input.stack, kind)
                .map(ToolCallResult::json);
        }

        let results = collect_stack_drift(&self.client, kind)?;
        Ok(ToolCallResult::json(serde_json::to_string(&results)?))
    }

    fn tool_extract_resources(&self, params: Value) -> Result<ToolCallResult> {
        let input: QueryInput = parse_input(params)?;
        if input.query.is_empty() {
            return Err(FormaeError::InvalidInput("query is required".to_string()));
        }
        self.cli.extract(&input.query).map(ToolCallResult::text)
    }

    fn tool_apply_forma(&self, params: Value) -> Result<ToolCallResult> {
        let input: ApplyFormaInput = parse_input(params)?;
        if input.file_path.is_empty() {
            return Err(FormaeError::InvalidInput("file_path is required".to_string()));
        }
        let mode: ApplyMode = input.mode.parse().map_err(FormaeError::InvalidInput)?;

        let forma = self.eval_forma(&input.file_path)?;
        let submission = CommandSubmission::apply(mode, input.simulate, input.force, forma);
        tracing::info!(
            "Submitting apply ({}, simulate={}) for {}",
            mode,
            input.simulate,
            input.file_path
        );
        self.client
            .submit_command(&submission)
            .map(ToolCallResult::json)
    }

    fn tool_destroy_forma(&self, params: Value) -> Result<ToolCallResult> {
        let input: DestroyFormaInput = parse_input(params)?;
        match (input.file_path.is_empty(), input.query.is_empty()) {
            (true, true) => Err(FormaeError::InvalidInput(
                "either file_path or query is required".to_string(),
            )),
            (false, false) => Err(FormaeError::InvalidInput(
                "file_path and query are mutually exclusive".to_string(),
            )),
            (true, false) => {
                tracing::info!(
                    "Submitting destroy (simulate={}) for query {}",
                    input.simulate,
                    input.query
                );
                self.client
                    .destroy_by_query(&input.query, input.simulate)
                    .map(ToolCallResult::json)
            }
            (false, true) => {
                let forma = self.eval_forma(&input.file_path)?;
                tracing::info!(
                    "Submitting destroy (simulate={}) for {}",
                    input.simulate,
                    input.file_path
                );
                self.client
                    .submit_command(&CommandSubmission::destroy(input.simulate, forma))
                    .map(ToolCallResult::json)
            }
        }
    }

    fn tool_cancel_commands(&self, params: Value) -> Result<ToolCallResult> {
        let input: QueryInput = parse_input(params)?;
        self.client
            .cancel_commands(&input.query)
            .map(ToolCallResult::json)
    }

    fn eval_forma(&self, file_path: &str) -> Result<Vec<u8>> {
        self.cli
            .eval_forma(file_path)
            .map_err(|e| e.context("failed to evaluate forma file"))
    }

    fn call_tool(&self, id: Option<Value>, params: &Value) -> McpResponse {
        let name = params.get("name").and_then(|v| v.as_str()).unwrap_or("");
        let arguments = params.get("arguments").cloned().unwrap_or(json!({}));

        // Schema violations and unknown tools are protocol errors, raised
        // before any request leaves the process.
        if let Err(e) = validate_arguments(name, &arguments) {
            return McpResponse::from_error(id, e);
        }

        let result = self.handle_tool_call(name, arguments);
        McpResponse::success(id, json!(result))
    }

    fn read_resource(&self, id: Option<Value>, params: &Value) -> McpResponse {
        let uri = params.get("uri").and_then(|v| v.as_str()).unwrap_or("");
        match resources::read_resource(uri) {
            Some(contents) => McpResponse::success(id, json!({ "contents": [contents] })),
            None => McpResponse::error(
                id,
                codes::RESOURCE_NOT_FOUND,
                format!("Resource not found: {}", uri),
            ),
        }
    }

    fn get_prompt(&self, id: Option<Value>, params: &Value) -> McpResponse {
        let name = params.get("name").and_then(|v| v.as_str()).unwrap_or("");
        let arguments = params
            .get("arguments")
            .and_then(|v| v.as_object())
            .cloned()
            .unwrap_or_else(Map::new);

        match prompts::get_prompt(name, &arguments) {
            Ok(result) => McpResponse::success(id, json!(result)),
            Err(e) => McpResponse::from_error(id, e),
        }
    }
}

/// Deserialize tool arguments; a missing argument object counts as empty
fn parse_input<T: DeserializeOwned + Default>(params: Value) -> Result<T> {
    if params.is_null() {
        return Ok(T::default());
    }
    serde_json::from_value(params)
        .map_err(|e| FormaeError::InvalidInput(format!("invalid arguments: {}", e)))
}

impl McpHandler for FormaeHandler {
    fn handle_request(&self, request: McpRequest) -> Option<McpResponse> {
        if request.is_notification() {
            if request.method != methods::INITIALIZED {
                tracing::debug!("Ignoring notification {}", request.method);
            }
            return None;
        }

        let response = match request.method.as_str() {
            methods::INITIALIZE => {
                let result = InitializeResult::default();
                McpResponse::success(request.id, json!(result))
            }
            methods::PING => McpResponse::success(request.id, json!({})),
            methods::LIST_TOOLS => {
                let tools = get_tool_definitions();
                McpResponse::success(request.id, json!({ "tools": tools }))
            }
            methods::CALL_TOOL => self.call_tool(request.id, &request.params),
            methods::LIST_RESOURCES => McpResponse::success(
                request.id,
                json!({ "resources": resources::list_resources() }),
            ),
            methods::READ_RESOURCE => self.read_resource(request.id, &request.params),
            methods::LIST_PROMPTS => McpResponse::success(
                request.id,
                json!({ "prompts": prompts::list_prompts() }),
            ),
            methods::GET_PROMPT => self.get_prompt(request.id, &request.params),
            _ => McpResponse::error(
                request.id,
                codes::METHOD_NOT_FOUND,
                format!("Method not found: {}", request.method),
            ),
        };

        Some(response)
    }
}
