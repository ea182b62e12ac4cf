//! MCP server lifecycle.
//!
//! Handles the protocol handshake and routes requests: initialize,
//! tools/list, tools/call, ping. One request at a time over stdio, which
//! matches how MCP clients drive stdio servers.

use std::sync::Arc;

use serde_json::Value;

use phab_conduit::ConduitSource;

use crate::handlers::ToolHandler;
use crate::protocol::{
    InitializeParams, InitializeResult, JsonRpcError, JsonRpcRequest, JsonRpcResponse,
    RequestId, ServerCapabilities, ServerInfo, ToolCallParams, ToolsCapability,
    ToolsListResult, MCP_VERSION,
};
use crate::transport::{IncomingMessage, StdioTransport};

/// MCP server exposing Phabricator tools.
pub struct McpServer {
    handler: ToolHandler,
    initialized: bool,
}

impl McpServer {
    pub fn new(source: Arc<dyn ConduitSource>) -> Self {
        Self {
            handler: ToolHandler::new(source),
            initialized: false,
        }
    }

    /// Run the server main loop over stdin/stdout until EOF.
    pub async fn run(&mut self) -> phab_core::Result<()> {
        tracing::info!("Starting phab-mcp server");

        let mut transport = StdioTransport::stdio();

        loop {
            match transport.read_message() {
                Ok(Some(msg)) => {
                    if let Some(response) = self.handle_message(msg).await {
                        if let Err(e) = transport.write_response(&response) {
                            tracing::error!(error = %e, "Failed to write response");
                            break;
                        }
                    }
                }
                Ok(None) => {
                    tracing::info!("EOF received, shutting down");
                    break;
                }
                Err(e) => {
                    tracing::error!(error = %e, "Transport error");
                    let error_resp = JsonRpcResponse::error(
                        RequestId::Null,
                        JsonRpcError::parse_error(&e.to_string()),
                    );
                    let _ = transport.write_response(&error_resp);
                }
            }
        }

        tracing::info!("phab-mcp server stopped");
        Ok(())
    }

    async fn handle_message(&mut self, msg: IncomingMessage) -> Option<JsonRpcResponse> {
        match msg {
            IncomingMessage::Request(req) => Some(self.handle_request(req).await),
            IncomingMessage::Notification(notif) => {
                self.handle_notification(&notif.method);
                None
            }
        }
    }

    async fn handle_request(&mut self, req: JsonRpcRequest) -> JsonRpcResponse {
        tracing::debug!(method = req.method.as_str(), "handling request");

        match req.method.as_str() {
            "initialize" => self.handle_initialize(req.id, req.params),
            "tools/list" => self.handle_tools_list(req.id),
            "tools/call" => self.handle_tools_call(req.id, req.params).await,
            "ping" => JsonRpcResponse::success(req.id, serde_json::json!({})),
            method => {
                tracing::warn!(method = method, "unknown method");
                JsonRpcResponse::error(req.id, JsonRpcError::method_not_found(method))
            }
        }
    }

    fn handle_notification(&mut self, method: &str) {
        match method {
            "initialized" => tracing::info!("Client initialized"),
            "notifications/cancelled" => tracing::debug!("Request cancelled by client"),
            other => tracing::debug!(method = other, "ignoring notification"),
        }
    }

    fn handle_initialize(&mut self, id: RequestId, params: Option<Value>) -> JsonRpcResponse {
        if self.initialized {
            return JsonRpcResponse::error(
                id,
                JsonRpcError::invalid_request("Server already initialized"),
            );
        }

        if let Some(params) = params {
            match serde_json::from_value::<InitializeParams>(params) {
                Ok(init) => tracing::info!(
                    client = init.client_info.name.as_str(),
                    version = init.client_info.version.as_str(),
                    protocol = init.protocol_version.as_str(),
                    "client connected"
                ),
                Err(e) => tracing::warn!(error = %e, "Failed to parse initialize params"),
            }
        }

        self.initialized = true;

        let result = InitializeResult {
            protocol_version: MCP_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: ToolsCapability {
                    list_changed: false,
                },
            },
            server_info: ServerInfo {
                name: "phab-mcp".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        };

        match serde_json::to_value(result) {
            Ok(value) => JsonRpcResponse::success(id, value),
            Err(e) => JsonRpcResponse::error(id, JsonRpcError::parse_error(&e.to_string())),
        }
    }

    fn handle_tools_list(&self, id: RequestId) -> JsonRpcResponse {
        let result = ToolsListResult {
            tools: self.handler.available_tools(),
        };
        match serde_json::to_value(result) {
            Ok(value) => JsonRpcResponse::success(id, value),
            Err(e) => JsonRpcResponse::error(id, JsonRpcError::parse_error(&e.to_string())),
        }
    }

    async fn handle_tools_call(&self, id: RequestId, params: Option<Value>) -> JsonRpcResponse {
        let params: ToolCallParams = match params {
            Some(p) => match serde_json::from_value(p) {
                Ok(params) => params,
                Err(e) => {
                    return JsonRpcResponse::error(id, JsonRpcError::invalid_params(&e.to_string()))
                }
            },
            None => {
                return JsonRpcResponse::error(id, JsonRpcError::invalid_params("Missing params"))
            }
        };

        let result = self.handler.execute(&params.name, params.arguments).await;
        match serde_json::to_value(result) {
            Ok(value) => JsonRpcResponse::success(id, value),
            Err(e) => JsonRpcResponse::error(id, JsonRpcError::parse_error(&e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::JSONRPC_VERSION;
    use phab_core::{Conduit, Result};

    struct NoSource;

    impl ConduitSource for NoSource {
        fn client(&self, _api_token: Option<&str>) -> Result<Arc<dyn Conduit>> {
            Err(phab_core::Error::Auth("no token configured".into()))
        }
    }

    fn server() -> McpServer {
        McpServer::new(Arc::new(NoSource))
    }

    fn request(method: &str, params: Option<Value>) -> JsonRpcRequest {
        JsonRpcRequest {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: RequestId::Number(1),
            method: method.to_string(),
            params,
        }
    }

    #[tokio::test]
    async fn test_initialize() {
        let mut server = server();
        let resp = server
            .handle_request(request(
                "initialize",
                Some(serde_json::json!({
                    "protocolVersion": "2024-11-05",
                    "capabilities": {},
                    "clientInfo": { "name": "test-client", "version": "1.0.0" }
                })),
            ))
            .await;

        assert!(resp.error.is_none());
        let result = resp.result.unwrap();
        assert_eq!(result["serverInfo"]["name"], "phab-mcp");
        assert_eq!(result["protocolVersion"], MCP_VERSION);
        assert!(server.initialized);
    }

    #[tokio::test]
    async fn test_double_initialize_rejected() {
        let mut server = server();
        server.handle_request(request("initialize", None)).await;
        let resp = server.handle_request(request("initialize", None)).await;

        assert!(resp.error.is_some());
        assert_eq!(resp.error.unwrap().code, JsonRpcError::INVALID_REQUEST);
    }

    #[tokio::test]
    async fn test_tools_list() {
        let mut server = server();
        let resp = server.handle_request(request("tools/list", None)).await;

        let result: Value = resp.result.unwrap();
        let tools = result["tools"].as_array().unwrap();
        assert!(tools.iter().any(|t| t["name"] == "get_review_feedback"));
        assert!(tools.iter().any(|t| t["name"] == "get_task"));
    }

    #[tokio::test]
    async fn test_ping() {
        let mut server = server();
        let resp = server.handle_request(request("ping", None)).await;
        assert!(resp.result.is_some());
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let mut server = server();
        let resp = server.handle_request(request("bogus/method", None)).await;
        assert_eq!(resp.error.unwrap().code, JsonRpcError::METHOD_NOT_FOUND);
    }

    #[tokio::test]
    async fn test_tools_call_without_params() {
        let mut server = server();
        let resp = server.handle_request(request("tools/call", None)).await;
        assert_eq!(resp.error.unwrap().code, JsonRpcError::INVALID_PARAMS);
    }

    #[tokio::test]
    async fn test_tools_call_source_failure_is_tool_error() {
        let mut server = server();
        let resp = server
            .handle_request(request(
                "tools/call",
                Some(serde_json::json!({
                    "name": "get_task",
                    "arguments": { "task_id": "1" }
                })),
            ))
            .await;

        // The JSON-RPC layer succeeds; the failure is inside the tool result
        assert!(resp.error.is_none());
        let result = resp.result.unwrap();
        assert_eq!(result["isError"], true);
    }

    #[tokio::test]
    async fn test_notification_produces_no_response() {
        let mut server = server();
        let msg = IncomingMessage::Notification(crate::protocol::JsonRpcNotification {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: "initialized".to_string(),
            params: None,
        });
        assert!(server.handle_message(msg).await.is_none());
    }
}
