//! unified-erp-mcp: MCP server bridging AI assistants to the Omie and Nibo ERPs
//!
//! This library exposes the two ERP back-ends as a single set of universal
//! tools. A tool call travels through three layers:
//!
//! - **MCP surface** (`mcp`): JSON-RPC 2.0 over stdio, lifecycle
//!   negotiation, tool definitions and routing.
//! - **Request adaptation** (`adapter`): universal↔platform field-name
//!   translation, tool-name aliasing and normalisation of list responses
//!   into one paginated envelope.
//! - **Outbound resilience** (`resilience` + `erp`): every HTTP call to an
//!   ERP passes through a shared rate budget and an exponential-backoff
//!   retry that absorbs transient overload failures.
//!
//! # Modules
//!
//! - [`adapter`] — universal↔platform request/response mapping
//! - [`config`] — configuration loading and validation
//! - [`erp`] — outbound HTTP clients for Omie and Nibo
//! - [`error`] — error types
//! - [`mcp`] — MCP protocol implementation
//! - [`resilience`] — rate limiting and overload retry

pub mod adapter;
pub mod config;
pub mod erp;
pub mod error;
pub mod mcp;
pub mod resilience;
