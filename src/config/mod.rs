//! Configuration file loading and parsing.
//!
//! This module handles loading the configuration file from disk and parsing
//! it into validated, type-safe structures.
//!
//! # Configuration File Locations
//!
//! The configuration file is searched in the following order:
//!
//! 1. Path specified via `--config` CLI flag
//! 2. Default location:
//!    - **Linux/macOS:** `~/.unified-erp-mcp/config.json`
//!    - **Windows:** `%USERPROFILE%\.unified-erp-mcp\config.json`
//!
//! A missing file is not fatal when credentials arrive via environment
//! variables (`OMIE_APP_KEY`, `OMIE_APP_SECRET`, `NIBO_API_TOKEN`,
//! `NIBO_COMPANY_ID`); in that case the defaults are used for everything
//! else. Environment credentials always take precedence over file values.
//!
//! # Example Configuration
//!
//! See `config/example-config.json` for a complete example.

mod settings;

pub use settings::{
    Config, LoggingConfig, NiboConfig, OmieConfig, RateLimitConfig, RetryConfig,
};

use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Returns the default configuration directory.
///
/// - **Linux/macOS:** `~/.unified-erp-mcp/`
/// - **Windows:** `%USERPROFILE%\.unified-erp-mcp\`
#[must_use]
pub fn default_config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|p| p.join(".unified-erp-mcp"))
}

/// Returns the platform-specific default configuration file path.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    default_config_dir().map(|p| p.join("config.json"))
}

/// Loads the configuration, applies environment overrides and validates.
///
/// If `path` is `None`, uses the platform-specific default location; a
/// missing default file falls back to `Config::default()` so that
/// environment-only deployments work. An explicitly given path must exist.
///
/// # Errors
///
/// Returns an error if:
/// - An explicitly specified file cannot be found or read
/// - The JSON is malformed
/// - Validation fails (no platform configured, empty credentials, bad
///   rate/retry settings)
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let mut config = match path {
        Some(p) => {
            if !p.exists() {
                return Err(ConfigError::NotFound {
                    path: p.to_path_buf(),
                });
            }
            read_config_file(p)?
        }
        None => match default_config_path() {
            Some(p) if p.exists() => read_config_file(&p)?,
            _ => Config::default(),
        },
    };

    config.apply_env_overrides();
    config.validate()?;

    Ok(config)
}

fn read_config_file(path: &Path) -> Result<Config, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;

    serde_json::from_str(&contents).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config_dir_exists() {
        assert!(default_config_dir().is_some());
    }

    #[test]
    fn default_config_path_exists() {
        let path = default_config_path();
        assert!(path.is_some());
        assert!(path.unwrap().to_string_lossy().contains("config.json"));
    }

    #[test]
    fn explicit_missing_path_is_an_error() {
        let result = load_config(Some(Path::new("/nonexistent/config.json")));
        assert!(matches!(result, Err(ConfigError::NotFound { .. })));
    }

    #[test]
    fn load_valid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let mut file = std::fs::File::create(&path).unwrap();
        write!(
            file,
            r#"{{ "omie": {{ "app_key": "k", "app_secret": "s" }} }}"#
        )
        .unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert!(config.omie.is_some());
        assert_eq!(config.rate_limit.requests_per_minute, 15);
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        let result = load_config(Some(&path));
        assert!(matches!(result, Err(ConfigError::ParseError { .. })));
    }
}
