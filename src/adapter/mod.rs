//! Request adaptation between universal tool calls and the ERP platforms.
//!
//! Callers speak a single platform-agnostic vocabulary: universal field
//! names (`page`, `limit`, `start_date`, …) and universal tool names. Each
//! [`Adapter`] translates that vocabulary into one platform's dialect,
//! dispatches the call through the resilience layer, and reshapes the
//! heterogeneous platform response into the uniform [`UniversalResult`]
//! envelope.
//!
//! # Graceful degradation
//!
//! Shape mismatches are never errors here. A response without a recognised
//! list marker degrades to an opaque `{data, platform}` payload, and an
//! outbound failure becomes a structured `{error, platform, tool}` object.
//! Callers always receive something renderable.

mod fields;
mod universal;

pub use universal::Adapter;

use serde::Serialize;
use serde_json::Value;

/// The ERP back-end a call is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// Omie ERP (RPC-style API, Portuguese field names).
    Omie,
    /// Nibo ERP (REST API, mostly English field names).
    Nibo,
}

impl Platform {
    /// The lowercase tag used in envelopes and logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Omie => "omie",
            Self::Nibo => "nibo",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The normalised shape returned to callers, regardless of which
/// platform-specific response shape was received.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum UniversalResult {
    /// A recognised list response, reshaped into the uniform envelope.
    Page(EntityPage),
    /// An unrecognised payload, passed through opaquely.
    Opaque(OpaqueResult),
    /// A failed call, as a structured error object.
    Error(CallFailure),
}

impl UniversalResult {
    /// Whether this result carries a call failure.
    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

/// A page of entities in the uniform envelope.
#[derive(Debug, Clone, Serialize)]
pub struct EntityPage {
    /// The extracted entity list, in platform order.
    pub entities: Vec<Value>,
    /// Total pages reported by the platform (1 when absent).
    pub total_pages: u64,
    /// Current page reported by the platform (1 when absent).
    pub current_page: u64,
    /// Which platform produced the page.
    pub platform: Platform,
    /// Entity-type tag implied by the matched marker.
    pub entity_type: &'static str,
}

/// An unrecognised payload wrapped with its platform tag.
#[derive(Debug, Clone, Serialize)]
pub struct OpaqueResult {
    /// The raw platform payload.
    pub data: Value,
    /// Which platform produced it.
    pub platform: Platform,
}

/// A structured error object for a failed tool call.
///
/// Returned instead of raising so that the tool-call dispatcher can always
/// render a response.
#[derive(Debug, Clone, Serialize)]
pub struct CallFailure {
    /// Human-readable failure description.
    pub error: String,
    /// Which platform the call targeted.
    pub platform: Platform,
    /// The universal tool name as the caller issued it.
    pub tool: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn platform_tags_serialise_lowercase() {
        assert_eq!(serde_json::to_string(&Platform::Omie).unwrap(), r#""omie""#);
        assert_eq!(serde_json::to_string(&Platform::Nibo).unwrap(), r#""nibo""#);
    }

    #[test]
    fn envelope_serialises_flat() {
        let page = UniversalResult::Page(EntityPage {
            entities: vec![serde_json::json!({"codigo": "1"})],
            total_pages: 2,
            current_page: 1,
            platform: Platform::Omie,
            entity_type: "categoria",
        });

        let value = serde_json::to_value(&page).unwrap();
        assert_eq!(value["platform"], "omie");
        assert_eq!(value["total_pages"], 2);
        assert!(value.get("data").is_none());
    }

    #[test]
    fn failure_object_carries_all_tags() {
        let failure = UniversalResult::Error(CallFailure {
            error: "boom".to_string(),
            platform: Platform::Nibo,
            tool: "consultar_clientes".to_string(),
        });
        assert!(failure.is_error());

        let value = serde_json::to_value(&failure).unwrap();
        assert_eq!(value["error"], "boom");
        assert_eq!(value["platform"], "nibo");
        assert_eq!(value["tool"], "consultar_clientes");
    }
}
