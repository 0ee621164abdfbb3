//! Newline-delimited JSON-RPC 2.0 MCP server
//!
//! Each input line is one JSON-RPC message. Requests are handled on their
//! own tokio task so a slow upstream call never blocks `ping` or other tool
//! calls; every response goes through a single writer task, one JSON object
//! per line.

use std::sync::Arc;

use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;

use crate::error::{Result, SensrError};
use crate::mcp::types::{
    negotiate_protocol_version, CallToolParams, CallToolResponse, Implementation,
    InitializeParams, InitializeResponse, JsonRpcRequest, JsonRpcResponse, ListToolsResponse,
    ServerCapabilities, INTERNAL_ERROR, INVALID_PARAMS, INVALID_REQUEST, METHOD_INITIALIZE,
    METHOD_INITIALIZED, METHOD_NOT_FOUND, METHOD_PING, METHOD_TOOLS_CALL, METHOD_TOOLS_LIST,
    PARSE_ERROR,
};
use crate::tools::ToolRegistry;

/// MCP server exposing a [`ToolRegistry`]
pub struct McpServer {
    info: Implementation,
    registry: ToolRegistry,
}

impl McpServer {
    /// Creates a server announcing itself as `name` at the crate version
    pub fn new(name: impl Into<String>, registry: ToolRegistry) -> Self {
        Self {
            info: Implementation {
                name: name.into(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            registry,
        }
    }

    /// Handles one raw input line
    ///
    /// Returns `None` for notifications and blank lines.
    pub async fn handle_line(&self, line: &str) -> Option<JsonRpcResponse> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        let value: Value = match serde_json::from_str(line) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Unparsable JSON-RPC message: {}", e);
                return Some(JsonRpcResponse::failure(
                    Value::Null,
                    PARSE_ERROR,
                    format!("Parse error: {}", e),
                ));
            }
        };

        let id = value.get("id").cloned();
        let request: JsonRpcRequest = match serde_json::from_value(value) {
            Ok(request) => request,
            Err(e) => {
                return Some(JsonRpcResponse::failure(
                    id.unwrap_or(Value::Null),
                    INVALID_REQUEST,
                    format!("Invalid request: {}", e),
                ));
            }
        };

        self.handle_request(request).await
    }

    /// Dispatches a parsed request
    ///
    /// Returns `None` for notifications.
    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        let Some(id) = request.id.clone() else {
            self.handle_notification(&request.method);
            return None;
        };

        if request.jsonrpc != "2.0" {
            return Some(JsonRpcResponse::failure(
                id,
                INVALID_REQUEST,
                "Invalid request: jsonrpc must be \"2.0\"",
            ));
        }

        let response = match request.method.as_str() {
            METHOD_INITIALIZE => self.initialize(id, request.params),
            METHOD_PING => JsonRpcResponse::success(id, json!({})),
            METHOD_TOOLS_LIST => self.list_tools(id),
            METHOD_TOOLS_CALL => self.call_tool(id, request.params).await,
            other => {
                tracing::debug!(method = other, "Unknown method");
                JsonRpcResponse::failure(id, METHOD_NOT_FOUND, format!("Method not found: {}", other))
            }
        };
        Some(response)
    }

    fn handle_notification(&self, method: &str) {
        if method == METHOD_INITIALIZED {
            tracing::info!("MCP client initialized");
        } else {
            tracing::debug!(method, "Ignoring notification");
        }
    }

    fn initialize(&self, id: Value, params: Option<Value>) -> JsonRpcResponse {
        let params: InitializeParams = match params {
            Some(params) => match serde_json::from_value(params) {
                Ok(params) => params,
                Err(e) => {
                    return JsonRpcResponse::failure(
                        id,
                        INVALID_PARAMS,
                        format!("Invalid initialize params: {}", e),
                    )
                }
            },
            None => InitializeParams::default(),
        };

        let protocol_version = negotiate_protocol_version(params.protocol_version.as_deref());
        if let Some(client) = &params.client_info {
            tracing::info!(
                client = %client.name,
                client_version = %client.version,
                protocol_version,
                "MCP initialize"
            );
        }

        let response = InitializeResponse {
            protocol_version: protocol_version.to_string(),
            capabilities: ServerCapabilities {
                tools: Some(json!({})),
            },
            server_info: self.info.clone(),
        };
        to_result(id, &response)
    }

    fn list_tools(&self, id: Value) -> JsonRpcResponse {
        let response = ListToolsResponse {
            tools: self.registry.definitions(),
        };
        to_result(id, &response)
    }

    async fn call_tool(&self, id: Value, params: Option<Value>) -> JsonRpcResponse {
        let params: CallToolParams = match params.map(serde_json::from_value) {
            Some(Ok(params)) => params,
            Some(Err(e)) => {
                return JsonRpcResponse::failure(
                    id,
                    INVALID_PARAMS,
                    format!("Invalid tools/call params: {}", e),
                )
            }
            None => {
                return JsonRpcResponse::failure(id, INVALID_PARAMS, "Missing tools/call params")
            }
        };

        if self.registry.get(&params.name).is_none() {
            return JsonRpcResponse::failure(
                id,
                INVALID_PARAMS,
                format!("Unknown tool: {}", params.name),
            );
        }

        let args = params.arguments.unwrap_or(Value::Null);
        let result = match self.registry.call(&params.name, args).await {
            Ok(value) => CallToolResponse::json(value),
            Err(err) => {
                tracing::warn!(tool = %params.name, "Tool call failed: {:#}", err);
                CallToolResponse::error(error_payload(&params.name, &err))
            }
        };
        to_result(id, &result)
    }

    /// Serves requests from `reader` until it reaches EOF
    ///
    /// In-flight requests are allowed to finish; the writer is returned once
    /// every response has been written.
    ///
    /// # Errors
    ///
    /// Returns an error if reading input or writing a response fails
    pub async fn run<R, W>(self: Arc<Self>, reader: R, writer: W) -> Result<W>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (tx, mut rx) = mpsc::unbounded_channel::<String>();

        let writer_task = tokio::spawn(async move {
            let mut writer = writer;
            while let Some(message) = rx.recv().await {
                writer.write_all(message.as_bytes()).await?;
                writer.write_all(b"\n").await?;
                writer.flush().await?;
            }
            Ok::<W, std::io::Error>(writer)
        });

        let mut lines = BufReader::new(reader).lines();
        while let Some(line) = lines.next_line().await? {
            let server = Arc::clone(&self);
            let tx = tx.clone();
            tokio::spawn(async move {
                if let Some(response) = server.handle_line(&line).await {
                    match serde_json::to_string(&response) {
                        Ok(serialized) => {
                            if tx.send(serialized).is_err() {
                                tracing::warn!("Response dropped: writer has stopped");
                            }
                        }
                        Err(e) => tracing::error!("Failed to serialize response: {}", e),
                    }
                }
            });
        }
        drop(tx);

        tracing::debug!("Input closed, draining in-flight requests");
        let writer = writer_task
            .await
            .map_err(|e| anyhow::anyhow!("MCP writer task failed: {}", e))?
            .map_err(SensrError::from)?;
        Ok(writer)
    }
}

/// Runs `server` on the process's stdin and stdout
///
/// # Errors
///
/// Returns an error if stdin or stdout fails
pub async fn serve_stdio(server: Arc<McpServer>) -> Result<()> {
    tracing::info!("Serving MCP over stdio");
    server.run(tokio::io::stdin(), tokio::io::stdout()).await?;
    tracing::info!("stdin closed, shutting down");
    Ok(())
}

fn to_result<T: serde::Serialize>(id: Value, body: &T) -> JsonRpcResponse {
    match serde_json::to_value(body) {
        Ok(value) => JsonRpcResponse::success(id, value),
        Err(e) => JsonRpcResponse::failure(id, INTERNAL_ERROR, format!("Internal error: {}", e)),
    }
}

/// Describes a failed tool call for the host
///
/// Upstream and authentication failures carry their status and body.
pub fn error_payload(tool: &str, err: &anyhow::Error) -> Value {
    match err.downcast_ref::<SensrError>() {
        Some(sensr) => {
            let mut detail = json!({
                "tool": tool,
                "kind": sensr.kind(),
                "message": sensr.to_string(),
            });
            if let SensrError::Upstream { status, body }
            | SensrError::Authentication { status, body } = sensr
            {
                detail["status"] = json!(status);
                detail["body"] = json!(body);
            }
            json!({ "error": detail })
        }
        None => json!({
            "error": {
                "tool": tool,
                "kind": "internal",
                "message": format!("{:#}", err),
            }
        }),
    }
}
