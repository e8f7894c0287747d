//! HTTP client for the Nibo ERP API.
//!
//! Nibo exposes a conventional REST surface under `empresas/v1`: list
//! queries are GETs with OData-style `$top`/`$skip` pagination, inserts are
//! POSTs. Authentication is an `apitoken` sent both as a header and as a
//! query parameter, which is what the API documentation prescribes.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::config::NiboConfig;
use crate::erp::{classify_status, ErpClient};
use crate::error::ErpError;

/// Request timeout for Nibo calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Nibo caps page sizes at 500 records.
const MAX_PAGE_SIZE: u64 = 500;

/// Default page size when the caller does not specify one.
const DEFAULT_PAGE_SIZE: u64 = 50;

/// HTTP verb for a routed tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verb {
    Get,
    Post,
}

/// Client for the Nibo REST API.
pub struct NiboClient {
    http: reqwest::Client,
    api_token: String,
    company_id: String,
    base_url: String,
}

impl NiboClient {
    /// Creates a client from the configured credentials.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: &NiboConfig) -> Result<Self, ErpError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            api_token: config.api_token.clone(),
            company_id: config.company_id.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Resolves a platform tool name to its HTTP verb and resource.
    fn route(tool: &str) -> Option<(Verb, &'static str)> {
        match tool {
            "consultar_clientes" => Some((Verb::Get, "clients")),
            "consultar_fornecedores" => Some((Verb::Get, "suppliers")),
            "consultar_categorias" => Some((Verb::Get, "categories")),
            "consultar_centros_custo" => Some((Verb::Get, "costcenters")),
            "consultar_socios" => Some((Verb::Get, "partners")),
            "consultar_contas_pagar" => Some((Verb::Get, "schedules/debit")),
            "consultar_contas_receber" => Some((Verb::Get, "schedules/credit")),
            "incluir_cliente" => Some((Verb::Post, "clients")),
            _ => None,
        }
    }

    /// Builds the OData query for a list request.
    ///
    /// Pagination keys from the adapter become `$top`/`$skip`; the API
    /// requires `$orderby` whenever `$skip` is used, so a default ordering
    /// is supplied. All other parameters pass through as-is.
    fn list_query(params: &Map<String, Value>) -> Vec<(String, String)> {
        let mut query = Vec::new();
        let mut page: u64 = 1;
        let mut top: u64 = DEFAULT_PAGE_SIZE;

        for (key, value) in params {
            match key.as_str() {
                "pagina" => page = value.as_u64().unwrap_or(1).max(1),
                "registros_por_pagina" => top = value.as_u64().unwrap_or(DEFAULT_PAGE_SIZE),
                _ => query.push((key.clone(), query_value(value))),
            }
        }

        let top = top.clamp(1, MAX_PAGE_SIZE);
        query.push(("$top".to_string(), top.to_string()));
        if page > 1 {
            query.push(("$skip".to_string(), ((page - 1) * top).to_string()));
            query.push(("$orderby".to_string(), "name".to_string()));
        }

        query
    }
}

/// Renders a JSON value as a query-string value.
fn query_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[async_trait]
impl ErpClient for NiboClient {
    async fn call(&self, tool: &str, params: Map<String, Value>) -> Result<Value, ErpError> {
        let (verb, resource) = Self::route(tool).ok_or_else(|| ErpError::Unsupported {
            platform: "nibo",
            tool: tool.to_string(),
        })?;

        let url = format!("{}/empresas/v1/{resource}", self.base_url);
        tracing::debug!(tool, resource, "dispatching Nibo request");

        let mut request = match verb {
            Verb::Get => self.http.get(&url).query(&Self::list_query(&params)),
            Verb::Post => self.http.post(&url).json(&params),
        };

        request = request
            .header("apitoken", &self.api_token)
            .query(&[("apitoken", &self.api_token)]);
        if !self.company_id.is_empty() {
            request = request.header("organizationId", &self.company_id);
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        if !(200..300).contains(&status) {
            return Err(classify_status(status, &body));
        }

        serde_json::from_str(&body).map_err(|e| ErpError::Platform {
            message: format!("malformed Nibo response: {e}"),
        })
    }
}
