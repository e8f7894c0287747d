//! HTTP client for the Omie ERP API.
//!
//! Omie exposes an RPC-over-HTTP surface: every call is a POST to
//! `{base_url}/{endpoint}/` with a JSON envelope naming the `call` and
//! carrying the credentials plus a single-element `param` array. Errors can
//! arrive two ways: a non-2xx status, or a 200 whose body carries a
//! `faultstring` field describing an ERP-level fault.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use crate::config::OmieConfig;
use crate::erp::{classify_status, truncate_body, ErpClient};
use crate::error::ErpError;

/// Request timeout for Omie calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Client for the Omie REST/RPC API.
pub struct OmieClient {
    http: reqwest::Client,
    app_key: String,
    app_secret: String,
    base_url: String,
}

impl OmieClient {
    /// Creates a client from the configured credentials.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: &OmieConfig) -> Result<Self, ErpError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            app_key: config.app_key.clone(),
            app_secret: config.app_secret.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Resolves a platform tool name to its Omie endpoint and call name.
    fn route(tool: &str) -> Option<(&'static str, &'static str)> {
        match tool {
            "consultar_clientes" => Some(("geral/clientes", "ListarClientes")),
            "consultar_fornecedores" => Some(("geral/fornecedores", "ListarFornecedores")),
            "consultar_categorias" => Some(("geral/categorias", "ListarCategorias")),
            "consultar_departamentos" => Some(("geral/departamentos", "ListarDepartamentos")),
            "consultar_contas_pagar" => Some(("financas/contapagar", "ListarContasPagar")),
            "consultar_contas_receber" => Some(("financas/contareceber", "ListarContasReceber")),
            "incluir_cliente" => Some(("geral/clientes", "IncluirCliente")),
            _ => None,
        }
    }
}

#[async_trait]
impl ErpClient for OmieClient {
    async fn call(&self, tool: &str, params: Map<String, Value>) -> Result<Value, ErpError> {
        let (endpoint, call) = Self::route(tool).ok_or_else(|| ErpError::Unsupported {
            platform: "omie",
            tool: tool.to_string(),
        })?;

        let payload = json!({
            "call": call,
            "app_key": self.app_key,
            "app_secret": self.app_secret,
            "param": [params],
        });

        let url = format!("{}/{endpoint}/", self.base_url);
        tracing::debug!(tool, endpoint, call, "dispatching Omie request");

        let response = self.http.post(&url).json(&payload).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        if !(200..300).contains(&status) {
            return Err(classify_status(status, &body));
        }

        let value: Value = serde_json::from_str(&body).map_err(|e| ErpError::Platform {
            message: format!("malformed Omie response: {e}"),
        })?;

        // A 200 can still carry an ERP-level fault.
        if let Some(fault) = value.get("faultstring").and_then(Value::as_str) {
            tracing::warn!(tool, fault, "Omie returned a fault payload");
            return Err(ErpError::Platform {
                message: truncate_body(fault),
            });
        }

        Ok(value)
    }
}
