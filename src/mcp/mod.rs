//! Model Context Protocol (MCP) server implementation.
//!
//! This module implements the MCP surface the ERP bridge needs: lifecycle
//! negotiation, tool listing and tool invocation over newline-delimited
//! JSON-RPC 2.0 on stdio.
//!
//! # Architecture
//!
//! ```text
//! stdin ──▶ Transport ──▶ Server (lifecycle) ──▶ ToolRouter
//!                                                    │
//!                                     Adapter (omie) ┴ Adapter (nibo)
//!                                                    │
//!                                       RateLimiter + retry wrapper
//!                                                    │
//!                                              ERP HTTP client
//! ```
//!
//! # Protocol Version
//!
//! This implementation targets MCP protocol version 2024-11-05.

pub mod protocol;
pub mod server;
pub mod tools;
pub mod transport;

pub use protocol::{JsonRpcResponse, MCP_PROTOCOL_VERSION};
pub use server::McpServer;
pub use tools::ToolRouter;
pub use transport::StdioTransport;
