//! Integration tests for MCP protocol handling.
//!
//! These tests verify the JSON-RPC 2.0 protocol implementation, including
//! request/response parsing, error responses, and the tool definition
//! surface.

use unified_erp_mcp::mcp::protocol::{error_codes, parse_message, RequestId};
use unified_erp_mcp::mcp::tools;

// =============================================================================
// Protocol Parsing Tests
// =============================================================================

#[test]
fn test_parse_initialize_request() {
    let json = r#"{
        "jsonrpc": "2.0",
        "id": 1,
        "method": "initialize",
        "params": {
            "protocolVersion": "2024-11-05",
            "capabilities": {},
            "clientInfo": {
                "name": "test-client",
                "version": "1.0.0"
            }
        }
    }"#;

    let msg = parse_message(json).expect("initialize request should parse");
    assert!(msg.is_request());
    assert_eq!(msg.method, "initialize");
    assert_eq!(msg.id, Some(RequestId::Number(1)));
}

#[test]
fn test_parse_tools_call_request() {
    let json = r#"{
        "jsonrpc": "2.0",
        "id": 2,
        "method": "tools/call",
        "params": {
            "name": "consultar_clientes",
            "arguments": { "platform": "omie", "page": 1 }
        }
    }"#;

    let msg = parse_message(json).expect("tools/call request should parse");
    assert_eq!(msg.method, "tools/call");
    let params = msg.params.expect("params should be present");
    assert_eq!(params["name"], "consultar_clientes");
}

#[test]
fn test_parse_notification() {
    let json = r#"{
        "jsonrpc": "2.0",
        "method": "notifications/initialized"
    }"#;

    let msg = parse_message(json).expect("notification should parse");
    assert!(!msg.is_request());
    assert_eq!(msg.method, "notifications/initialized");
}

#[test]
fn test_parse_invalid_json() {
    let err = parse_message("not valid json").unwrap_err();
    assert_eq!(err.error.unwrap().code, error_codes::PARSE_ERROR);
}

#[test]
fn test_parse_missing_jsonrpc_version() {
    let json = r#"{
        "id": 1,
        "method": "test"
    }"#;

    assert!(parse_message(json).is_err());
}

#[test]
fn test_parse_wrong_jsonrpc_version_keeps_id() {
    let json = r#"{"jsonrpc": "1.0", "id": 7, "method": "test"}"#;

    let err = parse_message(json).unwrap_err();
    assert_eq!(err.id, Some(RequestId::Number(7)));
    assert_eq!(err.error.unwrap().code, error_codes::INVALID_REQUEST);
}

// =============================================================================
// Tool Surface Tests
// =============================================================================

#[test]
fn test_tool_definitions_have_schemas() {
    let defs = tools::definitions();
    assert!(!defs.is_empty());

    for def in &defs {
        assert!(!def.name.is_empty());
        assert!(!def.description.is_empty());
        assert_eq!(def.input_schema["type"], "object");
    }
}

#[test]
fn test_universal_tools_accept_platform_argument() {
    let defs = tools::definitions();

    for name in [
        "consultar_clientes",
        "consultar_fornecedores",
        "consultar_categorias",
        "consultar_centros_custo",
        "consultar_contas_pagar",
        "consultar_contas_receber",
    ] {
        let def = defs
            .iter()
            .find(|d| d.name == name)
            .unwrap_or_else(|| panic!("missing tool {name}"));
        let platform = &def.input_schema["properties"]["platform"];
        assert_eq!(platform["default"], "both", "{name} should default to both");
    }
}

#[test]
fn test_tool_definitions_serialise_camel_case() {
    let defs = tools::definitions();
    let value = serde_json::to_value(&defs).unwrap();
    assert!(value[0].get("inputSchema").is_some());
    assert!(value[0].get("input_schema").is_none());
}
