//! Tool definitions and routing to the platform adapters.
//!
//! Tools speak the universal vocabulary. Every tool accepts a `platform`
//! argument selecting `omie`, `nibo` or `both` (the default); `both` fans
//! out to every configured platform concurrently and returns a combined
//! object keyed by platform tag. A side that fails — or is not configured —
//! contributes its structured error object without poisoning the other
//! side.

use std::sync::Arc;

use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::adapter::{Adapter, CallFailure, Platform, UniversalResult};
use crate::config::Config;
use crate::erp::{NiboClient, OmieClient};
use crate::error::ErpError;
use crate::resilience::RateLimiter;

/// A tool definition for the tools/list response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    /// Unique tool name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// JSON Schema for the tool's input parameters.
    pub input_schema: Value,
}

/// Content item in a tool call response.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ToolContent {
    /// Text content.
    Text {
        /// The text content.
        text: String,
    },
}

/// Result of a tool call.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCallResult {
    /// Content returned by the tool.
    pub content: Vec<ToolContent>,
    /// Whether the tool call resulted in an error.
    #[serde(skip_serializing_if = "is_false")]
    pub is_error: bool,
}

#[allow(clippy::trivially_copy_pass_by_ref)] // serde's skip_serializing_if requires a predicate fn(&T) -> bool, so we must take &bool here
const fn is_false(b: &bool) -> bool {
    !*b
}

impl ToolCallResult {
    /// Creates a successful text result.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text { text: text.into() }],
            is_error: false,
        }
    }

    /// Creates an error text result.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text {
                text: message.into(),
            }],
            is_error: true,
        }
    }
}

/// Which platforms a call should target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Route {
    One(Platform),
    Both,
}

/// Routes universal tool calls to the configured platform adapters.
pub struct ToolRouter {
    omie: Option<Adapter>,
    nibo: Option<Adapter>,
}

impl ToolRouter {
    /// Creates a router from explicit adapters.
    #[must_use]
    pub const fn new(omie: Option<Adapter>, nibo: Option<Adapter>) -> Self {
        Self { omie, nibo }
    }

    /// Builds the router, clients and rate limiters from configuration.
    ///
    /// Each configured platform gets its own client and its own rate
    /// budget; the two platforms never share a window.
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP client cannot be constructed.
    pub fn from_config(config: &Config) -> Result<Self, ErpError> {
        let omie = config
            .omie
            .as_ref()
            .map(|c| -> Result<Adapter, ErpError> {
                Ok(Adapter::new(
                    Platform::Omie,
                    Arc::new(OmieClient::new(c)?),
                    Arc::new(RateLimiter::new(&config.rate_limit)),
                    config.retry.clone(),
                ))
            })
            .transpose()?;

        let nibo = config
            .nibo
            .as_ref()
            .map(|c| -> Result<Adapter, ErpError> {
                Ok(Adapter::new(
                    Platform::Nibo,
                    Arc::new(NiboClient::new(c)?),
                    Arc::new(RateLimiter::new(&config.rate_limit)),
                    config.retry.clone(),
                ))
            })
            .transpose()?;

        Ok(Self { omie, nibo })
    }

    /// Dispatches one tool call and renders its result.
    pub async fn dispatch(&self, name: &str, arguments: &Value) -> ToolCallResult {
        if !TOOL_NAMES.contains(&name) {
            return ToolCallResult::error(format!("Unknown tool: {name}"));
        }

        let mut params = arguments.as_object().cloned().unwrap_or_default();
        let route = match extract_route(&mut params) {
            Ok(route) => route,
            Err(bad) => {
                return ToolCallResult::error(format!(
                    "Invalid platform '{bad}': expected omie, nibo or both"
                ));
            }
        };

        if name == "testar_conexao" {
            return self.test_connection(route).await;
        }

        // Partner records only exist on Nibo.
        let route = if name == "consultar_socios" {
            Route::One(Platform::Nibo)
        } else {
            route
        };

        match route {
            Route::One(platform) => {
                let result = match self.adapter_for(platform) {
                    Some(adapter) => adapter.call_tool(name, &params).await,
                    None => not_configured(platform, name),
                };
                render(&result)
            }
            Route::Both => {
                let combined = self.call_both(name, &params).await;
                match serde_json::to_string_pretty(&combined) {
                    Ok(text) => ToolCallResult::text(text),
                    Err(e) => ToolCallResult::error(format!("Failed to render result: {e}")),
                }
            }
        }
    }

    /// Calls every configured platform concurrently and combines the
    /// results under their platform tags.
    async fn call_both(&self, name: &str, params: &Map<String, Value>) -> Value {
        let omie = async {
            match &self.omie {
                Some(adapter) => adapter.call_tool(name, params).await,
                None => not_configured(Platform::Omie, name),
            }
        };
        let nibo = async {
            match &self.nibo {
                Some(adapter) => adapter.call_tool(name, params).await,
                None => not_configured(Platform::Nibo, name),
            }
        };

        let (omie_result, nibo_result) = tokio::join!(omie, nibo);

        json!({
            "omie": omie_result,
            "nibo": nibo_result,
        })
    }

    /// Probes connectivity by fetching one page of categories per platform.
    async fn test_connection(&self, route: Route) -> ToolCallResult {
        let mut report = Map::new();

        for platform in [Platform::Omie, Platform::Nibo] {
            if !route_includes(route, platform) {
                continue;
            }
            let entry = match self.adapter_for(platform) {
                Some(adapter) => {
                    let probe = adapter
                        .call_tool("consultar_categorias", &probe_params())
                        .await;
                    if probe.is_error() {
                        json!({"status": "error", "detail": probe})
                    } else {
                        json!({"status": "connected"})
                    }
                }
                None => json!({"status": "not_configured"}),
            };
            report.insert(platform.as_str().to_string(), entry);
        }

        match serde_json::to_string_pretty(&Value::Object(report)) {
            Ok(text) => ToolCallResult::text(text),
            Err(e) => ToolCallResult::error(format!("Failed to render result: {e}")),
        }
    }

    const fn adapter_for(&self, platform: Platform) -> Option<&Adapter> {
        match platform {
            Platform::Omie => self.omie.as_ref(),
            Platform::Nibo => self.nibo.as_ref(),
        }
    }
}

/// Removes the `platform` argument and resolves the routing choice.
fn extract_route(params: &mut Map<String, Value>) -> Result<Route, String> {
    let Some(choice) = params.remove("platform") else {
        return Ok(Route::Both);
    };

    match choice.as_str() {
        Some("omie") => Ok(Route::One(Platform::Omie)),
        Some("nibo") => Ok(Route::One(Platform::Nibo)),
        Some("both") => Ok(Route::Both),
        Some(other) => Err(other.to_string()),
        None => Err(choice.to_string()),
    }
}

fn route_includes(route: Route, platform: Platform) -> bool {
    route == Route::Both || route == Route::One(platform)
}

/// Universal parameters for the connectivity probe: the smallest possible
/// category listing.
fn probe_params() -> Map<String, Value> {
    let mut params = Map::new();
    params.insert("page".to_string(), json!(1));
    params.insert("limit".to_string(), json!(1));
    params
}

/// The structured failure used when a platform is not configured.
fn not_configured(platform: Platform, tool: &str) -> UniversalResult {
    UniversalResult::Error(CallFailure {
        error: "platform not configured".to_string(),
        platform,
        tool: tool.to_string(),
    })
}

/// Renders a universal result as a tool response.
fn render(result: &UniversalResult) -> ToolCallResult {
    match serde_json::to_string_pretty(result) {
        Ok(text) => {
            if result.is_error() {
                ToolCallResult::error(text)
            } else {
                ToolCallResult::text(text)
            }
        }
        Err(e) => ToolCallResult::error(format!("Failed to render result: {e}")),
    }
}

/// Every tool the server exposes.
const TOOL_NAMES: &[&str] = &[
    "consultar_clientes",
    "consultar_fornecedores",
    "consultar_categorias",
    "consultar_centros_custo",
    "consultar_contas_pagar",
    "consultar_contas_receber",
    "consultar_socios",
    "incluir_cliente",
    "testar_conexao",
];

/// Returns the list of available tools.
#[must_use]
pub fn definitions() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition {
            name: "consultar_clientes".to_string(),
            description: "List registered clients from the configured ERPs. Universal \
                          parameters are translated per platform (e.g. page/limit become \
                          pagina/registros_por_pagina on Omie)."
                .to_string(),
            input_schema: list_schema(),
        },
        ToolDefinition {
            name: "consultar_fornecedores".to_string(),
            description: "List registered suppliers from the configured ERPs.".to_string(),
            input_schema: list_schema(),
        },
        ToolDefinition {
            name: "consultar_categorias".to_string(),
            description: "List income/expense categories from the configured ERPs.".to_string(),
            input_schema: list_schema(),
        },
        ToolDefinition {
            name: "consultar_centros_custo".to_string(),
            description: "List cost centres. Omie models these as departamentos; the tool \
                          name is translated per platform."
                .to_string(),
            input_schema: list_schema(),
        },
        ToolDefinition {
            name: "consultar_contas_pagar".to_string(),
            description: "List accounts payable, optionally filtered by a date range."
                .to_string(),
            input_schema: dated_list_schema(),
        },
        ToolDefinition {
            name: "consultar_contas_receber".to_string(),
            description: "List accounts receivable, optionally filtered by a date range."
                .to_string(),
            input_schema: dated_list_schema(),
        },
        ToolDefinition {
            name: "consultar_socios".to_string(),
            description: "List company partners. Nibo only; the call is routed to Nibo \
                          regardless of the platform argument."
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "page": { "type": "integer", "default": 1 },
                    "limit": { "type": "integer", "default": 50 }
                }
            }),
        },
        ToolDefinition {
            name: "incluir_cliente".to_string(),
            description: "Create a client record using universal fields (name, document, \
                          email, phone)."
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "platform": platform_property(),
                    "name": { "type": "string", "description": "Name / razão social" },
                    "document": { "type": "string", "description": "CPF/CNPJ" },
                    "email": { "type": "string" },
                    "phone": { "type": "string" }
                },
                "required": ["name", "document"]
            }),
        },
        ToolDefinition {
            name: "testar_conexao".to_string(),
            description: "Probe connectivity to the configured platforms.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "platform": platform_property()
                }
            }),
        },
    ]
}

fn platform_property() -> Value {
    json!({
        "type": "string",
        "enum": ["omie", "nibo", "both"],
        "default": "both"
    })
}

fn list_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "platform": platform_property(),
            "page": { "type": "integer", "default": 1 },
            "limit": { "type": "integer", "default": 50 }
        }
    })
}

fn dated_list_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "platform": platform_property(),
            "start_date": { "type": "string", "description": "Start date (ISO format)" },
            "end_date": { "type": "string", "description": "End date (ISO format)" },
            "page": { "type": "integer", "default": 1 },
            "limit": { "type": "integer", "default": 20 }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use async_trait::async_trait;

    use crate::config::{RateLimitConfig, RetryConfig};
    use crate::erp::ErpClient;

    /// Client double that always answers with the same payload.
    struct FixedClient {
        payload: Value,
    }

    #[async_trait]
    impl ErpClient for FixedClient {
        async fn call(&self, _tool: &str, _params: Map<String, Value>) -> Result<Value, ErpError> {
            Ok(self.payload.clone())
        }
    }

    fn adapter_with(platform: Platform, payload: Value) -> Adapter {
        let rate: RateLimitConfig = serde_json::from_value(json!({
            "requests_per_minute": 1000,
            "min_delay_secs": 0.0,
        }))
        .unwrap();
        let retry: RetryConfig = serde_json::from_value(json!({})).unwrap();
        Adapter::new(
            platform,
            Arc::new(FixedClient { payload }),
            Arc::new(RateLimiter::new(&rate)),
            retry,
        )
    }

    fn full_router() -> ToolRouter {
        ToolRouter::new(
            Some(adapter_with(
                Platform::Omie,
                json!({"categorias": [{"codigo": "1"}], "total_de_paginas": 1, "pagina": 1}),
            )),
            Some(adapter_with(
                Platform::Nibo,
                json!({"categorias": [{"id": 1}]}),
            )),
        )
    }

    fn result_text(result: &ToolCallResult) -> &str {
        let ToolContent::Text { text } = &result.content[0];
        text
    }

    #[tokio::test]
    async fn unknown_tool_is_an_error_result() {
        let router = full_router();
        let result = router.dispatch("excluir_tudo", &json!({})).await;
        assert!(result.is_error);
        assert!(result_text(&result).contains("Unknown tool"));
    }

    #[tokio::test]
    async fn invalid_platform_is_an_error_result() {
        let router = full_router();
        let result = router
            .dispatch("consultar_categorias", &json!({"platform": "sap"}))
            .await;
        assert!(result.is_error);
        assert!(result_text(&result).contains("Invalid platform"));
    }

    #[tokio::test]
    async fn single_platform_route_returns_envelope() {
        let router = full_router();
        let result = router
            .dispatch("consultar_categorias", &json!({"platform": "omie"}))
            .await;
        assert!(!result.is_error);

        let value: Value = serde_json::from_str(result_text(&result)).unwrap();
        assert_eq!(value["platform"], "omie");
        assert_eq!(value["entity_type"], "categoria");
    }

    #[tokio::test]
    async fn default_route_combines_both_platforms() {
        let router = full_router();
        let result = router.dispatch("consultar_categorias", &json!({})).await;
        assert!(!result.is_error);

        let value: Value = serde_json::from_str(result_text(&result)).unwrap();
        assert!(value.get("omie").is_some());
        assert!(value.get("nibo").is_some());
    }

    #[tokio::test]
    async fn unconfigured_platform_contributes_error_object() {
        let router = ToolRouter::new(
            Some(adapter_with(Platform::Omie, json!({"categorias": []}))),
            None,
        );
        let result = router.dispatch("consultar_categorias", &json!({})).await;

        let value: Value = serde_json::from_str(result_text(&result)).unwrap();
        assert_eq!(value["nibo"]["error"], "platform not configured");
        assert!(value["omie"].get("entities").is_some());
    }

    #[tokio::test]
    async fn socios_always_routes_to_nibo() {
        let router = ToolRouter::new(
            Some(adapter_with(Platform::Omie, json!({"categorias": []}))),
            Some(adapter_with(
                Platform::Nibo,
                json!({"socios": [{"id": 1, "nome": "João Silva"}]}),
            )),
        );

        let result = router
            .dispatch("consultar_socios", &json!({"platform": "omie"}))
            .await;
        let value: Value = serde_json::from_str(result_text(&result)).unwrap();
        assert_eq!(value["platform"], "nibo");
        assert_eq!(value["entity_type"], "socio");
    }

    #[tokio::test]
    async fn connection_test_reports_per_platform_status() {
        let router = ToolRouter::new(
            Some(adapter_with(Platform::Omie, json!({"categorias": []}))),
            None,
        );
        let result = router.dispatch("testar_conexao", &json!({})).await;

        let value: Value = serde_json::from_str(result_text(&result)).unwrap();
        assert_eq!(value["omie"]["status"], "connected");
        assert_eq!(value["nibo"]["status"], "not_configured");
    }

    #[test]
    fn definitions_cover_every_routable_tool() {
        let defs = definitions();
        let names: Vec<&str> = defs.iter().map(|d| d.name.as_str()).collect();
        for tool in TOOL_NAMES {
            assert!(names.contains(tool), "missing definition for {tool}");
        }
        assert_eq!(defs.len(), TOOL_NAMES.len());
    }

    #[test]
    fn tool_result_wire_format() {
        let ok = ToolCallResult::text("fine");
        let value = serde_json::to_value(&ok).unwrap();
        assert!(value.get("isError").is_none());

        let err = ToolCallResult::error("broken");
        let value = serde_json::to_value(&err).unwrap();
        assert_eq!(value["isError"], true);
    }
}
