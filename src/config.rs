//! Client configuration
//!
//! [`GeminiConfig`] carries everything the shared client needs: the API key (kept in a
//! [`SecretString`]), REST and realtime endpoints, timeouts, the output directory and
//! optional retry settings.

use secrecy::{ExposeSecret, SecretString};
use std::collections::HashMap;
use std::path::PathBuf;
use validator::{Validate, ValidationError};

use crate::error::{GeminiError, Result};
use crate::retry::RetryOptions;

/// Default REST endpoint.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
/// Default realtime (WebSocket) endpoint.
pub const DEFAULT_LIVE_BASE_URL: &str = "wss://generativelanguage.googleapis.com";
/// Default directory for generated files.
pub const DEFAULT_OUTPUT_DIR: &str = "Output";

/// HTTP-level knobs applied to the underlying `reqwest` client.
#[derive(Debug, Clone, Default)]
pub struct HttpConfig {
    /// Extra headers sent with every request
    pub headers: HashMap<String, String>,
    /// Custom user agent
    pub user_agent: Option<String>,
    /// Proxy URL
    pub proxy: Option<String>,
}

/// Gemini client configuration.
#[derive(Clone, Validate)]
#[validate(schema(function = "validate_api_key"))]
pub struct GeminiConfig {
    /// API key sent as `x-goog-api-key`
    pub api_key: SecretString,
    /// REST base URL
    #[validate(url)]
    pub base_url: String,
    /// Realtime base URL (`wss://...`)
    #[validate(url)]
    pub live_base_url: String,
    /// Request timeout in seconds
    #[validate(range(min = 1))]
    pub timeout: Option<u64>,
    /// Where generated files are written
    pub output_dir: PathBuf,
    pub http_config: HttpConfig,
    /// Retries for transient failures; disabled when `None`
    pub retry_options: Option<RetryOptions>,
}

fn validate_api_key(config: &GeminiConfig) -> std::result::Result<(), ValidationError> {
    if config.api_key.expose_secret().trim().is_empty() {
        return Err(ValidationError::new("empty_api_key"));
    }
    Ok(())
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: SecretString::from(String::new()),
            base_url: DEFAULT_BASE_URL.to_string(),
            live_base_url: DEFAULT_LIVE_BASE_URL.to_string(),
            timeout: Some(60),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            http_config: HttpConfig::default(),
            retry_options: None,
        }
    }
}

impl std::fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfig")
            .field(
                "api_key",
                &crate::telemetry::mask_sensitive_value(self.api_key.expose_secret()),
            )
            .field("base_url", &self.base_url)
            .field("live_base_url", &self.live_base_url)
            .field("timeout", &self.timeout)
            .field("output_dir", &self.output_dir)
            .field("retry_options", &self.retry_options)
            .finish()
    }
}

impl GeminiConfig {
    /// Create a configuration with the given API key and default endpoints.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: SecretString::from(api_key.into()),
            ..Default::default()
        }
    }

    /// Load configuration from the environment.
    ///
    /// Reads `GEMINI_API_KEY` (falling back to `GOOGLE_API_KEY`), and optionally
    /// `GEMINI_BASE_URL`, `GEMINI_LIVE_BASE_URL` and `GEMINI_OUTPUT_DIR`.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .or_else(|_| std::env::var("GOOGLE_API_KEY"))
            .map_err(|_| {
                GeminiError::ConfigurationError(
                    "GEMINI_API_KEY (or GOOGLE_API_KEY) is not set".to_string(),
                )
            })?;

        let mut config = Self::new(api_key);
        if let Ok(base_url) = std::env::var("GEMINI_BASE_URL") {
            config.base_url = base_url;
        }
        if let Ok(live) = std::env::var("GEMINI_LIVE_BASE_URL") {
            config.live_base_url = live;
        }
        if let Ok(dir) = std::env::var("GEMINI_OUTPUT_DIR") {
            config.output_dir = PathBuf::from(dir);
        }
        config.validate()?;
        Ok(config)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_live_base_url(mut self, live_base_url: impl Into<String>) -> Self {
        self.live_base_url = live_base_url.into();
        self
    }

    pub const fn with_timeout(mut self, timeout: u64) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn with_http_config(mut self, http: HttpConfig) -> Self {
        self.http_config = http;
        self
    }

    pub fn with_retry_options(mut self, retry: RetryOptions) -> Self {
        self.retry_options = Some(retry);
        self
    }

    /// Replace the API key.
    pub fn set_api_key(&mut self, api_key: impl Into<String>) {
        self.api_key = SecretString::from(api_key.into());
    }
}
