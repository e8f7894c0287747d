//! JSON-RPC 2.0 message types for the MCP wire protocol.
//!
//! Messages are newline-delimited JSON. Incoming traffic is either a
//! request (carries an `id`, expects a response) or a notification (no
//! `id`, no response). Outgoing traffic is a single response shape that
//! carries either a `result` or an `error` object.
//!
//! # MCP-Specific Constraints
//!
//! - Request IDs must be strings or integers, never `null`
//! - Request IDs must be unique within a session

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The MCP protocol version this implementation supports.
pub const MCP_PROTOCOL_VERSION: &str = "2024-11-05";

/// Server name for capability negotiation.
pub const SERVER_NAME: &str = "unified-erp-mcp";

/// Standard JSON-RPC 2.0 error codes.
pub mod error_codes {
    /// Invalid JSON was received by the server.
    pub const PARSE_ERROR: i32 = -32700;
    /// The JSON sent is not a valid Request object.
    pub const INVALID_REQUEST: i32 = -32600;
    /// The method does not exist or is not available.
    pub const METHOD_NOT_FOUND: i32 = -32601;
    /// Invalid method parameters.
    pub const INVALID_PARAMS: i32 = -32602;
    /// Internal JSON-RPC error.
    pub const INTERNAL_ERROR: i32 = -32603;
}

/// A JSON-RPC 2.0 request ID.
///
/// Per the MCP specification, IDs must be strings or integers, never `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    /// Numeric request ID.
    Number(i64),
    /// String request ID.
    String(String),
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::String(s) => write!(f, "{s}"),
        }
    }
}

/// An incoming JSON-RPC message: a request when `id` is present, a
/// notification when it is absent.
#[derive(Debug, Clone, Deserialize)]
pub struct IncomingMessage {
    /// Must be "2.0".
    pub jsonrpc: String,

    /// Request identifier; absent for notifications.
    #[serde(default)]
    pub id: Option<RequestId>,

    /// The method to invoke.
    pub method: String,

    /// Optional parameters for the method.
    #[serde(default)]
    pub params: Option<Value>,
}

impl IncomingMessage {
    /// Whether this message expects a response.
    #[must_use]
    pub const fn is_request(&self) -> bool {
        self.id.is_some()
    }
}

/// An outgoing JSON-RPC 2.0 response, success or error.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcResponse {
    /// Always "2.0".
    pub jsonrpc: &'static str,

    /// The request ID this response corresponds to (if known).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<RequestId>,

    /// The result of the method call, on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,

    /// The error details, on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorObject>,
}

impl JsonRpcResponse {
    /// Creates a success response.
    #[must_use]
    #[allow(clippy::missing_const_for_fn)] // Value is not const-compatible
    pub fn success(id: RequestId, result: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id: Some(id),
            result: Some(result),
            error: None,
        }
    }

    /// Creates an error response.
    #[must_use]
    pub fn failure(id: Option<RequestId>, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: None,
            error: Some(ErrorObject {
                code,
                message: message.into(),
                data: None,
            }),
        }
    }
}

/// A JSON-RPC 2.0 error object.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorObject {
    /// The error code.
    pub code: i32,

    /// A short description of the error.
    pub message: String,

    /// Additional information about the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Parses a JSON string into an incoming message.
///
/// # Errors
///
/// Returns a ready-to-send error response if the JSON is malformed or not
/// a valid JSON-RPC 2.0 message.
pub fn parse_message(json: &str) -> Result<IncomingMessage, JsonRpcResponse> {
    let message: IncomingMessage = serde_json::from_str(json)
        .map_err(|_| JsonRpcResponse::failure(None, error_codes::PARSE_ERROR, "Parse error"))?;

    if message.jsonrpc != "2.0" {
        return Err(JsonRpcResponse::failure(
            message.id,
            error_codes::INVALID_REQUEST,
            "jsonrpc field must be \"2.0\"",
        ));
    }

    if message.method.is_empty() {
        return Err(JsonRpcResponse::failure(
            message.id,
            error_codes::INVALID_REQUEST,
            "method field cannot be empty",
        ));
    }

    Ok(message)
}
