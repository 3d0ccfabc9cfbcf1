//! Configuration management for the course assistant.
//!
//! Configuration can be set via environment variables:
//! - `ANTHROPIC_API_KEY` - Required. API key for the completion service.
//! - `ANTHROPIC_MODEL` - Optional. Model identifier. Defaults to `claude-sonnet-4-20250514`.
//! - `ANTHROPIC_BASE_URL` - Optional. Messages API endpoint. Defaults to the hosted service.
//! - `HOST` - Optional. Server host. Defaults to `127.0.0.1`.
//! - `PORT` - Optional. Server port. Defaults to `8000`.
//! - `MAX_RESULTS` - Optional. Search results returned per retrieval query. Defaults to `5`.
//! - `MAX_HISTORY` - Optional. Conversation exchanges remembered per session. Defaults to `2`.
//! - `REQUEST_TIMEOUT_SECS` - Optional. Per-call timeout for the completion API. Defaults to `120`.

use thiserror::Error;

use crate::llm::anthropic::DEFAULT_BASE_URL;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// API key for the completion service
    pub api_key: String,

    /// Completion model identifier
    pub model: String,

    /// Messages API endpoint
    pub base_url: String,

    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,

    /// Search results returned per retrieval query
    pub max_results: usize,

    /// Conversation exchanges remembered per session
    pub max_history: usize,

    /// Per-call timeout for the completion API, in seconds
    pub request_timeout_secs: u64,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingEnvVar` if `ANTHROPIC_API_KEY` is not set.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = std::env::var("ANTHROPIC_API_KEY")
            .map_err(|_| ConfigError::MissingEnvVar("ANTHROPIC_API_KEY".to_string()))?;

        let model = std::env::var("ANTHROPIC_MODEL")
            .unwrap_or_else(|_| "claude-sonnet-4-20250514".to_string());

        let base_url =
            std::env::var("ANTHROPIC_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

        let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());

        let port = std::env::var("PORT")
            .unwrap_or_else(|_| "8000".to_string())
            .parse()
            .map_err(|e| ConfigError::InvalidValue("PORT".to_string(), format!("{}", e)))?;

        let max_results = std::env::var("MAX_RESULTS")
            .unwrap_or_else(|_| "5".to_string())
            .parse()
            .map_err(|e| ConfigError::InvalidValue("MAX_RESULTS".to_string(), format!("{}", e)))?;

        let max_history = std::env::var("MAX_HISTORY")
            .unwrap_or_else(|_| "2".to_string())
            .parse()
            .map_err(|e| ConfigError::InvalidValue("MAX_HISTORY".to_string(), format!("{}", e)))?;

        let request_timeout_secs = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "120".to_string())
            .parse()
            .map_err(|e| {
                ConfigError::InvalidValue("REQUEST_TIMEOUT_SECS".to_string(), format!("{}", e))
            })?;

        Ok(Self {
            api_key,
            model,
            base_url,
            host,
            port,
            max_results,
            max_history,
            request_timeout_secs,
        })
    }

    /// Create a config with custom values (useful for testing).
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            api_key,
            model,
            base_url: DEFAULT_BASE_URL.to_string(),
            host: "127.0.0.1".to_string(),
            port: 8000,
            max_results: 5,
            max_history: 2,
            request_timeout_secs: 120,
        }
    }
}
