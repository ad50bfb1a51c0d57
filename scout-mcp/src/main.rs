//! Scout MCP Server - MCP interface for read-only code-intelligence queries

use scout_core::{tool_definitions, Config, Scout, ToolRequest, TracingDiagnostics};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // stdout carries the protocol; logs go to stderr
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("scout=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    let server = McpServer::new();

    loop {
        let line = match lines.next_line().await {
            Ok(Some(l)) => l,
            Ok(None) => break,
            Err(e) => {
                tracing::error!(error = %e, "stdin read failed");
                break;
            }
        };

        if line.trim().is_empty() {
            continue;
        }

        if let Some(resp) = server.handle_request(&line).await {
            let written = async {
                stdout.write_all(resp.as_bytes()).await?;
                stdout.write_all(b"\n").await?;
                stdout.flush().await
            };
            if let Err(e) = written.await {
                tracing::error!(error = %e, "stdout write failed");
                break;
            }
        }
    }
}

struct McpServer;

#[derive(Deserialize)]
struct JsonRpcRequest {
    jsonrpc: String,
    id: Option<Value>,
    method: String,
    params: Option<Value>,
}

#[derive(Serialize)]
struct JsonRpcResponse {
    jsonrpc: String,
    id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<JsonRpcError>,
}

#[derive(Serialize)]
struct JsonRpcError {
    code: i32,
    message: String,
}

impl McpServer {
    fn new() -> Self {
        Self
    }

    async fn handle_request(&self, line: &str) -> Option<String> {
        let req: JsonRpcRequest = match serde_json::from_str(line) {
            Ok(r) => r,
            Err(e) => {
                return Some(
                    json!({
                        "jsonrpc": "2.0",
                        "id": null,
                        "error": { "code": -32700, "message": format!("Parse error: {}", e) }
                    })
                    .to_string(),
                );
            }
        };

        let id = req.id.clone().unwrap_or(Value::Null);

        let result = if req.jsonrpc != "2.0" {
            Err((
                -32600,
                format!("Invalid request: unsupported jsonrpc version '{}'", req.jsonrpc),
            ))
        } else {
            match req.method.as_str() {
                "initialize" => self.handle_initialize(),
                "tools/list" => self.handle_tools_list(),
                "tools/call" => self.handle_tools_call(&req.params).await,
                "notifications/initialized" => return None, // No response for notifications
                _ => Err((-32601, format!("Method not found: {}", req.method))),
            }
        };

        let response = match result {
            Ok(value) => JsonRpcResponse {
                jsonrpc: "2.0".to_string(),
                id,
                result: Some(value),
                error: None,
            },
            Err((code, message)) => JsonRpcResponse {
                jsonrpc: "2.0".to_string(),
                id,
                result: None,
                error: Some(JsonRpcError { code, message }),
            },
        };

        match serde_json::to_string(&response) {
            Ok(s) => Some(s),
            Err(e) => {
                tracing::error!(error = %e, "response serialization failed");
                None
            }
        }
    }

    fn handle_initialize(&self) -> Result<Value, (i32, String)> {
        Ok(json!({
            "protocolVersion": "2024-11-05",
            "capabilities": {
                "tools": {}
            },
            "serverInfo": {
                "name": "scout-mcp",
                "version": env!("CARGO_PKG_VERSION")
            }
        }))
    }

    /// Core tool definitions, each extended with the required `path` argument
    fn handle_tools_list(&self) -> Result<Value, (i32, String)> {
        let tools: Vec<Value> = tool_definitions()
            .into_iter()
            .map(|tool| {
                let mut schema = tool.input_schema;
                schema["properties"]["path"] = json!({
                    "type": "string",
                    "description": "Absolute path of the working directory to search"
                });
                if let Some(required) = schema["required"].as_array_mut() {
                    required.push(json!("path"));
                }
                json!({
                    "name": tool.name,
                    "description": tool.description,
                    "inputSchema": schema,
                })
            })
            .collect();
        Ok(json!({ "tools": tools }))
    }

    async fn handle_tools_call(&self, params: &Option<Value>) -> Result<Value, (i32, String)> {
        let params = params
            .as_ref()
            .ok_or((-32602, "Missing params".to_string()))?;

        let name = params
            .get("name")
            .and_then(|v| v.as_str())
            .ok_or((-32602, "Missing tool name".to_string()))?;

        let mut arguments = params.get("arguments").cloned().unwrap_or(json!({}));
        let repo_root = self.get_repo_root(&arguments)?;
        if let Some(obj) = arguments.as_object_mut() {
            obj.remove("path");
        }

        let request =
            ToolRequest::from_call(name, arguments).map_err(|e| (-32602, e.to_string()))?;
        let config = Config::discover(&repo_root).map_err(|e| (-32000, e.to_string()))?;
        let scout = Scout::new(config, Arc::new(TracingDiagnostics));

        let result = scout.dispatch(&request, &repo_root).await;
        let text = serde_json::to_string_pretty(&result).map_err(|e| (-32000, e.to_string()))?;

        Ok(json!({
            "content": [{
                "type": "text",
                "text": text
            }]
        }))
    }

    fn get_repo_root(&self, args: &Value) -> Result<PathBuf, (i32, String)> {
        args.get("path")
            .and_then(|v| v.as_str())
            .map(PathBuf::from)
            .ok_or_else(|| (-32602, "Missing required 'path' parameter".to_string()))
    }
}
