use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use futures::FutureExt;
use serde::Serialize;
use serde_json::Value;

use ferry_core::traits::ContentBackend;
use ferry_core::{Error, PROTOCOL_VERSION};

use crate::jsonrpc::{self, JsonRpcRequest, JsonRpcResponse, INVALID_PARAMS, SERVER_ERROR};
use crate::tools::ToolRegistry;

/// Name and version reported by `initialize`.
#[derive(Debug, Clone, Serialize)]
pub struct ServerInfo {
    pub name: String,
    pub version: String,
}

impl ServerInfo {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

/// Result object of `initialize`, also used by the gateway's hello event.
pub fn initialize_result(info: &ServerInfo) -> Value {
    serde_json::json!({
        "protocolVersion": PROTOCOL_VERSION,
        "capabilities": {
            "tools": {}
        },
        "serverInfo": info,
    })
}

/// Routes JSON-RPC requests to the tool registry.
///
/// Stateless across requests: every call produces exactly one response
/// envelope and never propagates a failure to the transport.
pub struct Dispatcher {
    tools: ToolRegistry,
    backend: Arc<dyn ContentBackend>,
    server_info: ServerInfo,
}

impl Dispatcher {
    pub fn new(backend: Arc<dyn ContentBackend>, server_info: ServerInfo) -> Self {
        Self {
            tools: ToolRegistry::new(),
            backend,
            server_info,
        }
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub fn backend(&self) -> &Arc<dyn ContentBackend> {
        &self.backend
    }

    /// Handle a raw request body.
    pub async fn handle(&self, body: &[u8]) -> JsonRpcResponse {
        match jsonrpc::parse_request(body) {
            Ok(req) => self.dispatch(req).await,
            Err(invalid) => {
                tracing::info!(reason = %invalid.reason, "rejected invalid JSON-RPC envelope");
                invalid.into_response()
            }
        }
    }

    /// Route a parsed request, converting panics into a server error.
    pub async fn dispatch(&self, req: JsonRpcRequest) -> JsonRpcResponse {
        let id = req.id.clone();
        let method = req.method.clone();
        let notification = req.is_notification();
        let started = Instant::now();

        let response = match AssertUnwindSafe(self.route(req)).catch_unwind().await {
            Ok(response) => response,
            Err(panic) => {
                let detail = panic
                    .downcast_ref::<&str>()
                    .map(|s| (*s).to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                tracing::error!(method = %method, panic = %detail, "handler panicked");
                JsonRpcResponse::error(id, SERVER_ERROR, "Internal error while handling request")
            }
        };

        tracing::info!(
            method = %method,
            notification,
            ok = response.error.is_none(),
            elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            "handled JSON-RPC request"
        );
        response
    }

    async fn route(&self, req: JsonRpcRequest) -> JsonRpcResponse {
        match req.method.as_str() {
            "initialize" => self.handle_initialize(&req),
            "ping" | "notifications/initialized" => {
                JsonRpcResponse::success(req.id, serde_json::json!({}))
            }
            "tools/list" => self.handle_tools_list(&req),
            "tools/call" => self.handle_tools_call(&req).await,
            other => {
                let err = Error::MethodNotFound(other.to_string());
                JsonRpcResponse::from_error(req.id.clone(), &err)
            }
        }
    }

    fn handle_initialize(&self, req: &JsonRpcRequest) -> JsonRpcResponse {
        JsonRpcResponse::success(req.id.clone(), initialize_result(&self.server_info))
    }

    fn handle_tools_list(&self, req: &JsonRpcRequest) -> JsonRpcResponse {
        JsonRpcResponse::success(
            req.id.clone(),
            serde_json::json!({ "tools": self.tools.list() }),
        )
    }

    async fn handle_tools_call(&self, req: &JsonRpcRequest) -> JsonRpcResponse {
        let params = req.params.as_ref();

        let Some(tool_name) = params
            .and_then(|p| p.get("name"))
            .and_then(Value::as_str)
            .filter(|name| !name.is_empty())
        else {
            return JsonRpcResponse::error(
                req.id.clone(),
                INVALID_PARAMS,
                "Invalid params: 'name' must be a non-empty string",
            );
        };

        let arguments = match params.and_then(|p| p.get("arguments")) {
            None | Some(Value::Null) => Value::Object(serde_json::Map::new()),
            Some(args @ Value::Object(_)) => args.clone(),
            Some(_) => {
                return JsonRpcResponse::error(
                    req.id.clone(),
                    INVALID_PARAMS,
                    "Invalid params: 'arguments' must be an object",
                )
            }
        };

        match self
            .tools
            .invoke(self.backend.as_ref(), tool_name, &arguments)
            .await
        {
            Ok(content) => JsonRpcResponse::success(
                req.id.clone(),
                serde_json::json!({ "content": content }),
            ),
            Err(err) => {
                tracing::warn!(tool = tool_name, error = %err, "tool call failed");
                JsonRpcResponse::from_error(req.id.clone(), &err)
            }
        }
    }
}
