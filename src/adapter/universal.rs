//! The per-platform adapter: parameter projection, tool-name aliasing,
//! response normalisation and the resilient call path.

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::adapter::fields::{field_map, list_markers, tool_aliases};
use crate::adapter::{CallFailure, EntityPage, OpaqueResult, Platform, UniversalResult};
use crate::config::RetryConfig;
use crate::erp::ErpClient;
use crate::resilience::{call_with_retry, RateLimiter};

/// Decouples callers from one ERP's field-naming conventions and response
/// envelope shape.
///
/// The adapter owns the platform's rate limiter (shared with nothing else)
/// and retry policy, so every call it forwards is throttled and
/// overload-retried. None of its mapping operations can fail: malformed or
/// unexpected shapes degrade to documented fallbacks.
pub struct Adapter {
    platform: Platform,
    client: Arc<dyn ErpClient>,
    limiter: Arc<RateLimiter>,
    retry: RetryConfig,
}

impl Adapter {
    /// Creates an adapter for one platform.
    ///
    /// The limiter is injected rather than created here so tests (and any
    /// future multi-tenant setup) control the sharing boundary explicitly.
    #[must_use]
    pub fn new(
        platform: Platform,
        client: Arc<dyn ErpClient>,
        limiter: Arc<RateLimiter>,
        retry: RetryConfig,
    ) -> Self {
        Self {
            platform,
            client,
            limiter,
            retry,
        }
    }

    /// Which platform this adapter targets.
    #[must_use]
    pub const fn platform(&self) -> Platform {
        self.platform
    }

    /// Projects universal parameter names onto platform field names.
    ///
    /// Keys present in the platform's field table are renamed; all other
    /// keys pass through unchanged. Values are never touched and the
    /// projection is 1:1, so the output has exactly as many entries as the
    /// input.
    #[must_use]
    pub fn map_params(&self, universal: &Map<String, Value>) -> Map<String, Value> {
        let table = field_map(self.platform);

        universal
            .iter()
            .map(|(key, value)| {
                let mapped = table.get(key.as_str()).map_or(key.as_str(), |k| *k);
                (mapped.to_string(), value.clone())
            })
            .collect()
    }

    /// Resolves a universal tool name to the platform's own tool name.
    ///
    /// Unresolvable names pass through unchanged.
    #[must_use]
    pub fn map_tool_name<'a>(&self, tool: &'a str) -> &'a str {
        tool_aliases(self.platform)
            .get(tool)
            .map_or(tool, |name| *name)
    }

    /// Normalises a platform response into the uniform envelope.
    ///
    /// Probes the response for the platform's known list markers; on a
    /// match the list is extracted, tagged with its entity type and paired
    /// with pagination metadata (defaulting to page 1 of 1 when the
    /// platform reports none). Anything else — non-object payloads, marker
    /// keys holding non-arrays, unknown shapes — degrades to the opaque
    /// `{data, platform}` fallback. This operation never fails.
    #[must_use]
    pub fn map_result(&self, tool: &str, result: Value) -> UniversalResult {
        if let Value::Object(ref fields) = result {
            for &(marker, entity_type) in list_markers(self.platform) {
                if let Some(entities) = fields.get(marker).and_then(Value::as_array) {
                    return UniversalResult::Page(EntityPage {
                        entities: entities.clone(),
                        total_pages: page_field(fields, "total_de_paginas"),
                        current_page: page_field(fields, "pagina"),
                        platform: self.platform,
                        entity_type,
                    });
                }
            }
        }

        tracing::debug!(
            tool,
            platform = %self.platform,
            "no list marker matched; returning opaque payload"
        );
        UniversalResult::Opaque(OpaqueResult {
            data: result,
            platform: self.platform,
        })
    }

    /// Calls a tool with universal parameters and returns the uniform
    /// envelope.
    ///
    /// The outbound call goes through admission control and overload retry.
    /// A terminal failure is converted into the structured error object —
    /// this method never returns an error to the caller.
    pub async fn call_tool(&self, tool: &str, universal: &Map<String, Value>) -> UniversalResult {
        let params = self.map_params(universal);
        let platform_tool = self.map_tool_name(tool);

        let outcome = call_with_retry(&self.limiter, &self.retry, || {
            let client = Arc::clone(&self.client);
            let params = params.clone();
            async move { client.call(platform_tool, params).await }
        })
        .await;

        match outcome {
            Ok(result) => self.map_result(tool, result),
            Err(err) => {
                tracing::error!(
                    tool,
                    platform = %self.platform,
                    error = %err,
                    "tool call failed terminally"
                );
                UniversalResult::Error(CallFailure {
                    error: err.to_string(),
                    platform: self.platform,
                    tool: tool.to_string(),
                })
            }
        }
    }
}

/// Reads a pagination counter, defaulting to 1 when absent or malformed.
fn page_field(fields: &Map<String, Value>, key: &str) -> u64 {
    fields.get(key).and_then(Value::as_u64).unwrap_or(1)
}
