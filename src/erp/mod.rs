//! Outbound HTTP clients for the ERP back-ends.
//!
//! Each client implements [`ErpClient`]: one asynchronous callable per ERP
//! invocation. The client owns the transport details (URL layout, auth,
//! request envelope) and classifies every failure into the structured
//! [`ErpError`] taxonomy at the point it is observed — retry policy lives
//! entirely in [`crate::resilience`], which only inspects the error kind.

pub mod nibo;
pub mod omie;

pub use nibo::NiboClient;
pub use omie::OmieClient;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::ErpError;

/// Maximum length of a response body captured into an error.
const ERROR_BODY_LIMIT: usize = 300;

/// One ERP API invocation: `(tool, params) → result`.
///
/// Implementations receive the *platform-specific* tool name and parameters
/// (the adapter has already translated universal names) and return the raw
/// platform JSON payload.
#[async_trait]
pub trait ErpClient: Send + Sync {
    /// Dispatches a single call to the ERP API.
    ///
    /// # Errors
    ///
    /// Returns an [`ErpError`] classified at the transport boundary:
    /// overload signals become [`ErpError::Overloaded`], other HTTP
    /// failures [`ErpError::Api`], ERP-level faults [`ErpError::Platform`].
    async fn call(&self, tool: &str, params: Map<String, Value>) -> Result<Value, ErpError>;
}

/// Classifies a non-success HTTP status into the structured taxonomy.
///
/// 429 (Too Many Requests), 503 (Service Unavailable) and 529 (the
/// overloaded status some gateways emit) are transient overload signals;
/// everything else is a non-retryable API error.
pub(crate) fn classify_status(status: u16, body: &str) -> ErpError {
    match status {
        429 | 503 | 529 => ErpError::Overloaded {
            status: Some(status),
        },
        _ => ErpError::Api {
            status,
            body: truncate_body(body),
        },
    }
}

/// Truncates a response body for inclusion in an error message.
pub(crate) fn truncate_body(body: &str) -> String {
    if body.len() <= ERROR_BODY_LIMIT {
        return body.to_string();
    }
    let mut end = ERROR_BODY_LIMIT;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…", &body[..end])
}
