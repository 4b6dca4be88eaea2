//! End-to-end tests against a mock formae agent
//!
//! The mock agent is an axum router served on a background tokio runtime;
//! the code under test talks to it over real HTTP through `HttpTransport`.
//!
//! Run with: cargo test --test agent_http

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::Router;
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use formae_mcp::cli::FormaeCli;
use formae_mcp::client::{AgentClient, HttpTransport};
use formae_mcp::config::AgentEndpoint;
use formae_mcp::mcp::McpServer;
use formae_mcp::{DriftKind, FormaeError, FormaeHandler};

#[derive(Debug, Clone)]
struct Submission {
    content_type: String,
    client_id: String,
    body: String,
}

#[derive(Clone, Default)]
struct AgentState {
    submissions: Arc<Mutex<Vec<Submission>>>,
}

async fn stacks() -> &'static str {
    r#"[{"Label":"production"},{"Label":"team a"}]"#
}

async fn drift(Path(stack): Path<String>) -> (StatusCode, String) {
    match stack.as_str() {
        "production" => (
            StatusCode::OK,
            r#"{"ModifiedResources":[{"Label":"bucket-A","Operation":"update"}]}"#.to_string(),
        ),
        "team a" => (StatusCode::OK, r#"{"ModifiedResources":[]}"#.to_string()),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "unknown stack".to_string()),
    }
}

async fn command_status(
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> (StatusCode, String) {
    let client = headers
        .get("Client-ID")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    match params.get("id").map(String::as_str) {
        Some("c-1") => (
            StatusCode::OK,
            json!({"CommandId": "c-1", "State": "Success", "Client": client}).to_string(),
        ),
        Some(_) => (StatusCode::NOT_FOUND, String::new()),
        None => (StatusCode::OK, r#"{"Commands":[]}"#.to_string()),
    }
}

async fn submit(
    State(state): State<AgentState>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, &'static str) {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string()
    };
    state.submissions.lock().push(Submission {
        content_type: header("content-type"),
        client_id: header("client-id"),
        body: String::from_utf8_lossy(&body).into_owned(),
    });
    (StatusCode::ACCEPTED, r#"{"CommandId":"c-2"}"#)
}

fn mock_agent(state: AgentState) -> Router {
    Router::new()
        .route("/api/v1/health", get(|| async { StatusCode::OK }))
        .route("/api/v1/stacks", get(stacks))
        .route("/api/v1/stacks/:stack/drift", get(drift))
        .route("/api/v1/commands/status", get(command_status))
        .route("/api/v1/commands", post(submit))
        .route("/api/v1/admin/synchronize", post(|| async { StatusCode::OK }))
        .with_state(state)
}

/// Serve `router` on an ephemeral port and return that port
fn spawn_agent(router: Router) -> String {
    let (tx, rx) = std::sync::mpsc::channel();
    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("Failed to create tokio runtime");
        rt.block_on(async move {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            tx.send(listener.local_addr().unwrap().port()).unwrap();
            axum::serve(listener, router).await.unwrap();
        });
    });
    rx.recv().unwrap().to_string()
}

fn client_for(port: String) -> AgentClient {
    let endpoint = AgentEndpoint {
        url: "http://127.0.0.1".to_string(),
        port,
    };
    let transport = HttpTransport::new(&endpoint, Duration::from_secs(5)).unwrap();
    AgentClient::new(Arc::new(transport))
}

fn start() -> (AgentClient, AgentState) {
    let state = AgentState::default();
    let port = spawn_agent(mock_agent(state.clone()));
    (client_for(port), state)
}

#[test]
fn test_health_and_admin() {
    let (client, _) = start();
    client.check_health().unwrap();
    client.force_sync().unwrap();

    // no discover route on the mock: 404 is a failure for admin calls
    let err = client.force_discover().unwrap_err();
    assert!(matches!(err, FormaeError::Agent { status: 404, .. }));
}

#[test]
fn test_unreachable_agent() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let client = client_for(port.to_string());

    let err = client.check_health().unwrap_err();
    assert!(err.to_string().starts_with("agent is not reachable"));
    assert!(client.list_stacks().unwrap_err().is_unreachable());
}

#[test]
fn test_slow_agent_times_out() {
    let router = Router::new().route(
        "/api/v1/stacks",
        get(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            "[]"
        }),
    );
    let endpoint = AgentEndpoint {
        url: "http://127.0.0.1".to_string(),
        port: spawn_agent(router),
    };
    let transport = HttpTransport::new(&endpoint, Duration::from_millis(300)).unwrap();
    let client = AgentClient::new(Arc::new(transport));

    let started = Instant::now();
    let err = client.list_stacks().unwrap_err();
    assert!(err.is_unreachable());
    assert!(started.elapsed() < Duration::from_secs(4));
}

#[test]
fn test_missing_list_is_empty() {
    let (client, _) = start();
    // the mock has no /resources route
    assert_eq!(client.list_resources("managed:false").unwrap(), "[]");
}

#[test]
fn test_command_status_sends_client_id() {
    let (client, _) = start();
    let body: Value = serde_json::from_str(&client.get_command_status("c-1").unwrap()).unwrap();
    assert_eq!(body["Client"], "formae-mcp");

    let err = client.get_command_status("c-404").unwrap_err();
    assert_eq!(err.to_string(), "command c-404 not found");
}

#[test]
fn test_drift_for_escaped_stack_name() {
    let (client, _) = start();
    let body = client.stack_drift("team a", DriftKind::Drift).unwrap();
    assert_eq!(body, r#"{"ModifiedResources":[]}"#);
}

#[test]
fn test_apply_is_multipart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("forma.json");
    std::fs::write(&path, r#"{"Stacks":[{"Label":"production"}]}"#).unwrap();

    let (client, state) = start();
    let handler = FormaeHandler::new(client, FormaeCli::system());
    let result = handler.handle_tool_call(
        "apply_forma",
        json!({"file_path": path.to_string_lossy(), "mode": "reconcile", "force": true}),
    );
    assert!(!result.is_error(), "{:?}", result.first_text());
    assert_eq!(result.first_text(), Some(r#"{"CommandId":"c-2"}"#));

    let submissions = state.submissions.lock().clone();
    assert_eq!(submissions.len(), 1);
    let submission = &submissions[0];
    assert!(submission.content_type.starts_with("multipart/form-data"));
    assert_eq!(submission.client_id, "formae-mcp");
    assert!(submission.body.contains(r#"name="command""#));
    assert!(submission.body.contains("reconcile"));
    assert!(submission.body.contains(r#"filename="forma.json""#));
    assert!(submission.body.contains(r#"{"Stacks":[{"Label":"production"}]}"#));
}

#[test]
fn test_stdio_session() {
    let (client, _) = start();
    let server = McpServer::new(FormaeHandler::new(client, FormaeCli::system()));

    let input = [
        json!({"jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {}}),
        json!({"jsonrpc": "2.0", "method": "notifications/initialized"}),
        json!({"jsonrpc": "2.0", "id": 2, "method": "tools/call",
               "params": {"name": "list_drift", "arguments": {}}}),
        json!({"jsonrpc": "2.0", "id": 3, "method": "tools/call",
               "params": {"name": "get_command_status", "arguments": {}}}),
    ]
    .iter()
    .map(|v| v.to_string())
    .collect::<Vec<_>>()
    .join("\n");

    let mut output = Vec::new();
    server.serve(input.as_bytes(), &mut output).unwrap();

    let responses: Vec<Value> = String::from_utf8(output)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(responses.len(), 3);
    assert_eq!(responses[0]["id"], 1);

    let drift_text = responses[1]["result"]["content"][0]["text"].as_str().unwrap();
    let drift: Value = serde_json::from_str(drift_text).unwrap();
    assert_eq!(
        drift,
        json!([
            {"Stack": "production", "ModifiedResources": [{"Label": "bucket-A", "Operation": "update"}]},
            {"Stack": "team a", "ModifiedResources": []}
        ])
    );

    assert_eq!(responses[2]["error"]["code"], -32602);
}
