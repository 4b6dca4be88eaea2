//! Benchmarks for MCP request dispatch and config scanning

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use serde_json::json;

use formae_mcp::cli::FormaeCli;
use formae_mcp::client::{AgentClient, AgentRequest, AgentResponse, Transport};
use formae_mcp::config::parse_cli_api;
use formae_mcp::mcp::{validate_arguments, McpHandler, McpRequest};
use formae_mcp::FormaeHandler;

/// Answers every request with a fixed stack drift payload
struct StaticAgent;

impl Transport for StaticAgent {
    fn send(&self, request: &AgentRequest) -> formae_mcp::Result<AgentResponse> {
        let body = if request.path() == "/api/v1/stacks" {
            r#"[{"Label":"production"},{"Label":"staging"},{"Label":"default"}]"#
        } else {
            r#"{"ModifiedResources":[{"Label":"bucket-A","Operation":"update"}]}"#
        };
        Ok(AgentResponse::new(200, body))
    }
}

fn handler() -> FormaeHandler {
    FormaeHandler::new(AgentClient::new(Arc::new(StaticAgent)), FormaeCli::system())
}

fn request(method: &str, params: serde_json::Value) -> McpRequest {
    McpRequest {
        jsonrpc: "2.0".to_string(),
        id: Some(json!(1)),
        method: method.to_string(),
        params,
    }
}

fn bench_dispatch(c: &mut Criterion) {
    let handler = handler();
    let mut group = c.benchmark_group("mcp_dispatch");

    group.bench_function("tools_list", |b| {
        b.iter(|| handler.handle_request(black_box(request("tools/list", json!({})))))
    });

    group.bench_function("list_drift_aggregate", |b| {
        b.iter(|| {
            handler.handle_request(black_box(request(
                "tools/call",
                json!({"name": "list_drift", "arguments": {}}),
            )))
        })
    });

    group.bench_function("validate_apply_arguments", |b| {
        let args = json!({"file_path": "/infra/main.pkl", "mode": "reconcile", "simulate": true});
        b.iter(|| validate_arguments(black_box("apply_forma"), black_box(&args)))
    });

    group.finish();
}

fn bench_config_scan(c: &mut Criterion) {
    let mut content = String::from("amends \"formae:/Config.pkl\"\n\n");
    for i in 0..50 {
        content.push_str(&format!(
            "plugin{} {{\n    api {{\n        url = \"http://p{}\"\n        port = {}\n    }}\n}}\n",
            i,
            i,
            9000 + i
        ));
    }
    content.push_str("cli {\n    api {\n        url = \"http://agent\"\n        port = 49684\n    }\n}\n");

    c.bench_function("parse_cli_api", |b| b.iter(|| parse_cli_api(black_box(&content))));
}

criterion_group!(benches, bench_dispatch, bench_config_scan);
criterion_main!(benches);
