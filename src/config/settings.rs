//! Configuration structures for deserialisation.
//!
//! These structures map directly to the JSON configuration file format.
//! Credentials may be supplied in the file or via environment variables
//! (`OMIE_APP_KEY`, `OMIE_APP_SECRET`, `NIBO_API_TOKEN`, `NIBO_COMPANY_ID`);
//! environment values take precedence over file values.

use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;

/// Root configuration structure.
///
/// This is the top-level structure that matches the JSON config file.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Optional JSON schema reference (ignored during parsing).
    #[serde(rename = "$schema", default)]
    _schema: Option<String>,

    /// Optional comment field (ignored during parsing).
    #[serde(rename = "_comment", default)]
    _comment: Option<String>,

    /// Omie platform credentials. Absent means Omie is not configured.
    #[serde(default)]
    pub omie: Option<OmieConfig>,

    /// Nibo platform credentials. Absent means Nibo is not configured.
    #[serde(default)]
    pub nibo: Option<NiboConfig>,

    /// Outbound rate-limit settings.
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Retry/backoff settings for transient overload failures.
    #[serde(default)]
    pub retry: RetryConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Applies environment-variable overrides for credentials.
    ///
    /// A platform section is created when its env credentials are present
    /// even if the file omitted it, so a file-less deployment can run on
    /// environment variables alone.
    pub fn apply_env_overrides(&mut self) {
        let omie_key = std::env::var("OMIE_APP_KEY").ok();
        let omie_secret = std::env::var("OMIE_APP_SECRET").ok();
        if omie_key.is_some() || omie_secret.is_some() {
            let omie = self.omie.get_or_insert_with(OmieConfig::default);
            if let Some(key) = omie_key {
                omie.app_key = key;
            }
            if let Some(secret) = omie_secret {
                omie.app_secret = secret;
            }
        }

        let nibo_token = std::env::var("NIBO_API_TOKEN").ok();
        let nibo_company = std::env::var("NIBO_COMPANY_ID").ok();
        if nibo_token.is_some() || nibo_company.is_some() {
            let nibo = self.nibo.get_or_insert_with(NiboConfig::default);
            if let Some(token) = nibo_token {
                nibo.api_token = token;
            }
            if let Some(company) = nibo_company {
                nibo.company_id = company;
            }
        }
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any validation checks fail.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.omie.is_none() && self.nibo.is_none() {
            return Err(ConfigError::ValidationError {
                message: "no platform configured: provide an 'omie' or 'nibo' section \
                          (or the corresponding environment variables)"
                    .to_string(),
            });
        }

        if let Some(ref omie) = self.omie {
            if omie.app_key.is_empty() || omie.app_secret.is_empty() {
                return Err(ConfigError::ValidationError {
                    message: "omie.app_key and omie.app_secret must be non-empty".to_string(),
                });
            }
        }

        if let Some(ref nibo) = self.nibo {
            if nibo.api_token.is_empty() {
                return Err(ConfigError::ValidationError {
                    message: "nibo.api_token must be non-empty".to_string(),
                });
            }
        }

        if self.rate_limit.requests_per_minute == 0 {
            return Err(ConfigError::ValidationError {
                message: "rate_limit.requests_per_minute must be greater than zero".to_string(),
            });
        }

        if self.retry.multiplier < 1.0 {
            return Err(ConfigError::ValidationError {
                message: format!(
                    "retry.multiplier must be at least 1.0, got {}",
                    self.retry.multiplier
                ),
            });
        }

        Ok(())
    }
}

/// Omie API credentials and endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OmieConfig {
    /// Application key issued by Omie.
    #[serde(default)]
    pub app_key: String,

    /// Application secret issued by Omie.
    #[serde(default)]
    pub app_secret: String,

    /// API base URL.
    #[serde(default = "default_omie_base_url")]
    pub base_url: String,
}

impl Default for OmieConfig {
    fn default() -> Self {
        Self {
            app_key: String::new(),
            app_secret: String::new(),
            base_url: default_omie_base_url(),
        }
    }
}

fn default_omie_base_url() -> String {
    "https://app.omie.com.br/api/v1".to_string()
}

/// Nibo API credentials and endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NiboConfig {
    /// API token issued by Nibo.
    #[serde(default)]
    pub api_token: String,

    /// Organisation (empresa) identifier.
    #[serde(default)]
    pub company_id: String,

    /// API base URL.
    #[serde(default = "default_nibo_base_url")]
    pub base_url: String,
}

impl Default for NiboConfig {
    fn default() -> Self {
        Self {
            api_token: String::new(),
            company_id: String::new(),
            base_url: default_nibo_base_url(),
        }
    }
}

fn default_nibo_base_url() -> String {
    "https://api.nibo.com.br".to_string()
}

/// Rate-limit configuration for outbound ERP calls.
///
/// Defaults are the most conservative values observed in production use of
/// the ERP APIs: 15 requests per trailing minute with 2 seconds between
/// consecutive dispatches.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RateLimitConfig {
    /// Maximum requests admitted within the trailing 60-second window.
    #[serde(default = "default_requests_per_minute")]
    pub requests_per_minute: u32,

    /// Minimum spacing between consecutive dispatches, in seconds.
    #[serde(default = "default_min_delay_secs")]
    pub min_delay_secs: f64,
}

impl RateLimitConfig {
    /// Minimum inter-request spacing as a [`Duration`].
    #[must_use]
    pub fn min_delay(&self) -> Duration {
        Duration::from_secs_f64(self.min_delay_secs.max(0.0))
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_minute: default_requests_per_minute(),
            min_delay_secs: default_min_delay_secs(),
        }
    }
}

const fn default_requests_per_minute() -> u32 {
    15
}

const fn default_min_delay_secs() -> f64 {
    2.0
}

/// Retry/backoff configuration for transient overload failures.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RetryConfig {
    /// Delay before the first retry, in seconds.
    #[serde(default = "default_initial_delay_secs")]
    pub initial_delay_secs: f64,

    /// Ceiling on the backoff delay, in seconds.
    #[serde(default = "default_max_delay_secs")]
    pub max_delay_secs: f64,

    /// Factor applied to the delay after each failed attempt.
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,

    /// Maximum number of retries after the first failure.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl RetryConfig {
    /// Initial backoff delay as a [`Duration`].
    #[must_use]
    pub fn initial_delay(&self) -> Duration {
        Duration::from_secs_f64(self.initial_delay_secs.max(0.0))
    }

    /// Maximum backoff delay as a [`Duration`].
    #[must_use]
    pub fn max_delay(&self) -> Duration {
        Duration::from_secs_f64(self.max_delay_secs.max(0.0))
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            initial_delay_secs: default_initial_delay_secs(),
            max_delay_secs: default_max_delay_secs(),
            multiplier: default_multiplier(),
            max_retries: default_max_retries(),
        }
    }
}

const fn default_initial_delay_secs() -> f64 {
    1.0
}

const fn default_max_delay_secs() -> f64 {
    60.0
}

const fn default_multiplier() -> f64 {
    2.0
}

const fn default_max_retries() -> u32 {
    3
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}
