//! Error types for unified-erp-mcp.
//!
//! # Security Note
//!
//! Error messages are carefully crafted to NEVER include credentials.
//! ERP requests carry app keys and API tokens; error variants only ever
//! capture status codes and response bodies, never the request payload.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur during configuration operations.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file could not be read.
    #[error("failed to read configuration file: {path}")]
    ReadError {
        /// Path to the configuration file.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Configuration file could not be parsed.
    #[error("failed to parse configuration file: {path}")]
    ParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// Configuration file not found.
    #[error("configuration file not found: {path}")]
    NotFound {
        /// Path where the configuration file was expected.
        path: PathBuf,
    },

    /// Configuration validation failed.
    #[error("configuration validation failed: {message}")]
    ValidationError {
        /// Description of the validation failure.
        message: String,
    },
}

/// Errors from outbound ERP API calls.
///
/// The transport layer classifies every failure into one of these variants
/// at the point where the failure is observed. Retry decisions are made
/// purely on the variant — nothing downstream inspects error text.
#[derive(Error, Debug)]
pub enum ErpError {
    /// The remote service signalled it is temporarily unable to accept
    /// more load (HTTP 429/503/529 or an ERP overload fault).
    ///
    /// This is the only retryable variant.
    #[error("ERP service overloaded{}", status_suffix(.status))]
    Overloaded {
        /// HTTP status code, when the signal came from the status line.
        status: Option<u16>,
    },

    /// Any other non-success HTTP response.
    #[error("ERP API error (HTTP {status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body, truncated by the transport layer.
        body: String,
    },

    /// An ERP-level fault carried inside a 200 response
    /// (e.g. Omie's `faultstring`).
    #[error("ERP platform fault: {message}")]
    Platform {
        /// Fault description from the ERP payload.
        message: String,
    },

    /// Network-level failure (connect, TLS, timeout, body decode).
    #[error("ERP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The tool has no route on this platform.
    #[error("tool not supported on {platform}: {tool}")]
    Unsupported {
        /// Platform tag.
        platform: &'static str,
        /// The unroutable tool name.
        tool: String,
    },
}

impl ErpError {
    /// Whether this failure is a transient overload that the retry wrapper
    /// may absorb. All other variants are presumed non-transient and are
    /// propagated immediately.
    #[must_use]
    pub const fn is_overloaded(&self) -> bool {
        matches!(self, Self::Overloaded { .. })
    }
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map_or_else(String::new, |s| format!(" (HTTP {s})"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_display() {
        let error = ConfigError::NotFound {
            path: PathBuf::from("/path/to/config.json"),
        };
        let msg = error.to_string();
        assert!(msg.contains("not found"));
        assert!(msg.contains("config.json"));
    }

    #[test]
    fn validation_error_display() {
        let error = ConfigError::ValidationError {
            message: "invalid setting".to_string(),
        };
        let msg = error.to_string();
        assert!(msg.contains("invalid setting"));
    }

    #[test]
    fn overloaded_is_retryable() {
        assert!(ErpError::Overloaded { status: Some(529) }.is_overloaded());
        assert!(ErpError::Overloaded { status: None }.is_overloaded());
    }

    #[test]
    fn other_variants_are_not_retryable() {
        let api = ErpError::Api {
            status: 401,
            body: "Unauthorized".to_string(),
        };
        assert!(!api.is_overloaded());

        let fault = ErpError::Platform {
            message: "Cliente não cadastrado".to_string(),
        };
        assert!(!fault.is_overloaded());
    }

    #[test]
    fn overloaded_display_includes_status() {
        let error = ErpError::Overloaded { status: Some(429) };
        assert!(error.to_string().contains("429"));

        let error = ErpError::Overloaded { status: None };
        assert!(error.to_string().contains("overloaded"));
    }
}
