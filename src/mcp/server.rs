//! MCP server lifecycle and request dispatch.
//!
//! The server walks the MCP lifecycle:
//!
//! 1. **Initialisation**: capability negotiation and version agreement
//! 2. **Operation**: tool listing and tool calls
//! 3. **Shutdown**: EOF on stdin or a termination signal
//!
//! Tool calls are forwarded to the [`ToolRouter`], which owns the platform
//! adapters. A tool that fails produces an in-band error result, never a
//! JSON-RPC error, so the client can always render something.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::mcp::protocol::{
    error_codes, parse_message, IncomingMessage, JsonRpcResponse, RequestId,
    MCP_PROTOCOL_VERSION, SERVER_NAME,
};
use crate::mcp::tools::{self, ToolRouter};
use crate::mcp::transport::StdioTransport;

/// Server state in the MCP lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    /// Waiting for initialize request.
    AwaitingInit,
    /// Initialize received, waiting for initialized notification.
    Initialising,
    /// Ready for normal operation.
    Running,
    /// Shutdown in progress.
    ShuttingDown,
}

/// Server capabilities advertised during initialisation.
#[derive(Debug, Clone, Serialize)]
pub struct ServerCapabilities {
    /// Tool-related capabilities.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<ToolCapabilities>,
}

impl Default for ServerCapabilities {
    fn default() -> Self {
        Self {
            tools: Some(ToolCapabilities::default()),
        }
    }
}

/// Tool-specific capabilities.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ToolCapabilities {
    /// Whether the tool list can change during the session.
    #[serde(rename = "listChanged", skip_serializing_if = "std::ops::Not::not")]
    pub list_changed: bool,
}

/// Server information for initialisation response.
#[derive(Debug, Clone, Serialize)]
pub struct ServerInfo {
    /// Server name.
    pub name: String,
    /// Server version.
    pub version: String,
}

impl Default for ServerInfo {
    fn default() -> Self {
        Self {
            name: SERVER_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Client information received during initialisation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientInfo {
    /// Client name.
    pub name: String,
    /// Client version.
    #[serde(default)]
    pub version: Option<String>,
}

/// Parameters for the initialize request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeParams {
    /// Protocol version requested by client.
    pub protocol_version: String,
    /// Client capabilities.
    #[serde(default)]
    pub capabilities: Value,
    /// Client information.
    #[serde(default)]
    pub client_info: Option<ClientInfo>,
}

/// Parameters for tools/call request.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolCallParams {
    /// Name of the tool to call.
    pub name: String,
    /// Arguments for the tool.
    #[serde(default)]
    pub arguments: Value,
}

/// The MCP server for the unified ERP bridge.
pub struct McpServer {
    /// Current server state.
    state: ServerState,
    /// The transport layer.
    transport: StdioTransport,
    /// Negotiated protocol version (set after initialisation).
    protocol_version: Option<String>,
    /// Routing to the configured platform adapters.
    router: ToolRouter,
}

impl McpServer {
    /// Creates a new MCP server around a tool router.
    #[must_use]
    pub fn new(router: ToolRouter) -> Self {
        Self {
            state: ServerState::AwaitingInit,
            transport: StdioTransport::new(),
            protocol_version: None,
            router,
        }
    }

    /// Returns the current server state.
    #[must_use]
    pub const fn state(&self) -> ServerState {
        self.state
    }

    /// Runs the server until EOF or a termination signal.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport fails.
    pub async fn run(&mut self) -> std::io::Result<()> {
        self.run_with_shutdown().await
    }

    /// Runs the main loop and handles shutdown.
    #[cfg(unix)]
    async fn run_with_shutdown(&mut self) -> std::io::Result<()> {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigint = signal(SignalKind::interrupt()).map_err(std::io::Error::other)?;
        let mut sigterm = signal(SignalKind::terminate()).map_err(std::io::Error::other)?;

        loop {
            tokio::select! {
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT, initiating graceful shutdown");
                    self.state = ServerState::ShuttingDown;
                    return Ok(());
                }

                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM, initiating graceful shutdown");
                    self.state = ServerState::ShuttingDown;
                    return Ok(());
                }

                line_result = self.transport.read_line() => {
                    if self.handle_transport_result(line_result).await? {
                        return Ok(());
                    }
                }
            }
        }
    }

    /// Runs the main loop and handles shutdown.
    #[cfg(windows)]
    async fn run_with_shutdown(&mut self) -> std::io::Result<()> {
        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);

        loop {
            tokio::select! {
                _ = &mut ctrl_c => {
                    tracing::info!("Received Ctrl+C, initiating graceful shutdown");
                    self.state = ServerState::ShuttingDown;
                    return Ok(());
                }

                line_result = self.transport.read_line() => {
                    if self.handle_transport_result(line_result).await? {
                        return Ok(());
                    }
                }
            }
        }
    }

    /// Handles the result from transport read.
    ///
    /// Returns `true` if the server should shut down.
    async fn handle_transport_result(
        &mut self,
        line_result: std::io::Result<Option<String>>,
    ) -> std::io::Result<bool> {
        let Some(line) = line_result? else {
            self.state = ServerState::ShuttingDown;
            return Ok(true);
        };

        if line.trim().is_empty() {
            return Ok(false);
        }

        self.handle_line(&line).await?;

        if self.state == ServerState::ShuttingDown {
            return Ok(true);
        }

        Ok(false)
    }

    /// Handles a single line of input.
    async fn handle_line(&mut self, line: &str) -> std::io::Result<()> {
        match parse_message(line) {
            Ok(msg) => self.handle_message(msg).await,
            Err(error) => self.transport.write_response(&error).await,
        }
    }

    /// Handles a parsed incoming message.
    async fn handle_message(&mut self, msg: IncomingMessage) -> std::io::Result<()> {
        match msg.id.clone() {
            Some(id) => {
                let response = self.respond(id, &msg).await;
                self.transport.write_response(&response).await
            }
            None => {
                self.handle_notification(&msg);
                Ok(())
            }
        }
    }

    /// Produces the response for one request.
    async fn respond(&mut self, id: RequestId, msg: &IncomingMessage) -> JsonRpcResponse {
        match msg.method.as_str() {
            "initialize" => self.handle_initialize(id, msg.params.as_ref()),
            "tools/list" => self.handle_tools_list(id),
            "tools/call" => self.handle_tools_call(id, msg.params.as_ref()).await,
            "ping" => JsonRpcResponse::success(id, json!({})),
            method => JsonRpcResponse::failure(
                Some(id),
                error_codes::METHOD_NOT_FOUND,
                format!("Method not found: {method}"),
            ),
        }
    }

    /// Handles an incoming notification.
    fn handle_notification(&mut self, msg: &IncomingMessage) {
        if msg.method == "notifications/initialized" && self.state == ServerState::Initialising {
            self.state = ServerState::Running;
            tracing::info!("MCP session initialised");
        }
    }

    /// Handles the initialize request.
    fn handle_initialize(&mut self, id: RequestId, params: Option<&Value>) -> JsonRpcResponse {
        if self.state != ServerState::AwaitingInit {
            return JsonRpcResponse::failure(
                Some(id),
                error_codes::INVALID_REQUEST,
                "Server already initialised",
            );
        }

        let params: InitializeParams = match params.map(|p| serde_json::from_value(p.clone())) {
            Some(Ok(params)) => params,
            Some(Err(e)) => {
                return JsonRpcResponse::failure(
                    Some(id),
                    error_codes::INVALID_PARAMS,
                    format!("Invalid initialize params: {e}"),
                );
            }
            None => {
                return JsonRpcResponse::failure(
                    Some(id),
                    error_codes::INVALID_PARAMS,
                    "Missing initialize params",
                );
            }
        };

        tracing::debug!(
            client_version = %params.protocol_version,
            client = params.client_info.as_ref().map_or("<unknown>", |c| c.name.as_str()),
            "negotiating protocol version"
        );

        let negotiated_version = MCP_PROTOCOL_VERSION.to_string();
        self.protocol_version = Some(negotiated_version.clone());
        self.state = ServerState::Initialising;

        JsonRpcResponse::success(
            id,
            json!({
                "protocolVersion": negotiated_version,
                "capabilities": ServerCapabilities::default(),
                "serverInfo": ServerInfo::default(),
            }),
        )
    }

    /// Handles the tools/list request.
    fn handle_tools_list(&self, id: RequestId) -> JsonRpcResponse {
        if let Some(error) = self.require_running(&id) {
            return error;
        }

        JsonRpcResponse::success(id, json!({ "tools": tools::definitions() }))
    }

    /// Handles the tools/call request.
    async fn handle_tools_call(&self, id: RequestId, params: Option<&Value>) -> JsonRpcResponse {
        if let Some(error) = self.require_running(&id) {
            return error;
        }

        let params: ToolCallParams = match params.map(|p| serde_json::from_value(p.clone())) {
            Some(Ok(params)) => params,
            Some(Err(e)) => {
                return JsonRpcResponse::failure(
                    Some(id),
                    error_codes::INVALID_PARAMS,
                    format!("Invalid tool call params: {e}"),
                );
            }
            None => {
                return JsonRpcResponse::failure(
                    Some(id),
                    error_codes::INVALID_PARAMS,
                    "Missing tool call params",
                );
            }
        };

        tracing::info!(tool = %params.name, "tool call received");
        let result = self.router.dispatch(&params.name, &params.arguments).await;

        match serde_json::to_value(&result) {
            Ok(value) => JsonRpcResponse::success(id, value),
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialise tool call result");
                JsonRpcResponse::failure(
                    Some(id),
                    error_codes::INTERNAL_ERROR,
                    "Internal error: failed to serialise result",
                )
            }
        }
    }

    /// Ensures the server is in the Running state.
    fn require_running(&self, id: &RequestId) -> Option<JsonRpcResponse> {
        if self.state == ServerState::Running {
            return None;
        }
        Some(JsonRpcResponse::failure(
            Some(id.clone()),
            error_codes::INVALID_REQUEST,
            "Server not initialised",
        ))
    }
}
