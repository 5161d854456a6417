//! Telemetry and tracing utilities
//!
//! The library only emits `tracing` events; applications decide where they go. For
//! scripts and quick experiments [`init_subscriber`] installs a ready-made subscriber.
//!
//! ## Example
//!
//! ```rust,ignore
//! use gemini_studio::telemetry::{init_subscriber, OutputFormat, TelemetryConfig};
//!
//! let _guard = init_subscriber(TelemetryConfig::default())?;
//!
//! let config = TelemetryConfig::builder()
//!     .log_level(tracing::Level::DEBUG)
//!     .output_format(OutputFormat::Json)
//!     .build();
//! let _guard = init_subscriber(config)?;
//! ```

use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

use crate::error::{GeminiError, Result};

/// Output format for tracing logs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable text format
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

/// Subscriber configuration
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: tracing::Level,
    pub output_format: OutputFormat,
    pub enable_console: bool,
    /// Log file path (optional)
    pub log_file: Option<PathBuf>,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: tracing::Level::INFO,
            output_format: OutputFormat::Text,
            enable_console: true,
            log_file: None,
        }
    }
}

impl TelemetryConfig {
    pub fn builder() -> TelemetryConfigBuilder {
        TelemetryConfigBuilder::default()
    }

    pub fn debug() -> Self {
        Self {
            log_level: tracing::Level::DEBUG,
            ..Self::default()
        }
    }
}

/// Builder for [`TelemetryConfig`]
#[derive(Debug, Default)]
pub struct TelemetryConfigBuilder {
    log_level: Option<tracing::Level>,
    output_format: Option<OutputFormat>,
    enable_console: Option<bool>,
    log_file: Option<PathBuf>,
}

impl TelemetryConfigBuilder {
    pub fn log_level(mut self, level: tracing::Level) -> Self {
        self.log_level = Some(level);
        self
    }

    /// Set the log level from a string such as `"debug"`.
    pub fn log_level_str(mut self, level: &str) -> Result<Self> {
        let level = level.parse::<tracing::Level>().map_err(|_| {
            GeminiError::ConfigurationError(format!(
                "Invalid log level: {level}. Valid options: trace, debug, info, warn, error"
            ))
        })?;
        self.log_level = Some(level);
        Ok(self)
    }

    pub fn output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = Some(format);
        self
    }

    pub fn enable_console(mut self, enable: bool) -> Self {
        self.enable_console = Some(enable);
        self
    }

    pub fn log_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_file = Some(path.into());
        self
    }

    pub fn build(self) -> TelemetryConfig {
        let defaults = TelemetryConfig::default();
        TelemetryConfig {
            log_level: self.log_level.unwrap_or(defaults.log_level),
            output_format: self.output_format.unwrap_or(defaults.output_format),
            enable_console: self.enable_console.unwrap_or(defaults.enable_console),
            log_file: self.log_file,
        }
    }
}

/// Install a global subscriber.
///
/// `RUST_LOG` overrides the configured level. The returned guard flushes the file
/// writer on drop and must be kept alive while logging to a file.
pub fn init_subscriber(config: TelemetryConfig) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.as_str().to_lowercase()));

    let (file_writer, guard) = match &config.log_file {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("."));
            let file_name = path.file_name().ok_or_else(|| {
                GeminiError::ConfigurationError(format!("Invalid log file: {}", path.display()))
            })?;
            let appender = tracing_appender::rolling::never(dir, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(writer), Some(guard))
        }
        None => (None, None),
    };

    let json = config.output_format == OutputFormat::Json;
    let console_text = (config.enable_console && !json).then(fmt::layer);
    let console_json = (config.enable_console && json).then(|| fmt::layer().json());
    let file_text = file_writer
        .clone()
        .filter(|_| !json)
        .map(|w| fmt::layer().with_ansi(false).with_writer(w));
    let file_json = file_writer
        .filter(|_| json)
        .map(|w| fmt::layer().json().with_writer(w));

    tracing_subscriber::registry()
        .with(filter)
        .with(console_text)
        .with(console_json)
        .with(file_text)
        .with(file_json)
        .try_init()
        .map_err(|e| GeminiError::ConfigurationError(format!("Failed to init tracing: {e}")))?;

    Ok(guard)
}

/// Mask a secret for logging, keeping only a short prefix and suffix.
pub fn mask_sensitive_value(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() > 16 {
        let head: String = chars[..6].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{head}...{tail}")
    } else if chars.is_empty() {
        String::new()
    } else {
        "***".to_string()
    }
}

/// Strip the `key` query parameter from a URL before it is logged.
pub fn redact_url(url: &str) -> String {
    match url.split_once('?') {
        Some((base, query)) => {
            let kept: Vec<&str> = query
                .split('&')
                .filter(|pair| !pair.starts_with("key="))
                .collect();
            if kept.is_empty() {
                base.to_string()
            } else {
                format!("{base}?{}", kept.join("&"))
            }
        }
        None => url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masks_long_and_short_secrets() {
        assert_eq!(
            mask_sensitive_value("AIzaSyA0123456789abcdef"),
            "AIzaSy...cdef"
        );
        assert_eq!(mask_sensitive_value("short"), "***");
        assert_eq!(mask_sensitive_value(""), "");
    }

    #[test]
    fn redacts_key_query_parameter() {
        assert_eq!(
            redact_url("wss://host/ws/path?key=secret"),
            "wss://host/ws/path"
        );
        assert_eq!(
            redact_url("https://host/file?alt=media&key=secret"),
            "https://host/file?alt=media"
        );
        assert_eq!(redact_url("https://host/plain"), "https://host/plain");
    }

    #[test]
    fn builder_rejects_unknown_level() {
        assert!(TelemetryConfig::builder().log_level_str("loud").is_err());
        let config = TelemetryConfig::builder()
            .log_level_str("debug")
            .unwrap()
            .output_format(OutputFormat::Json)
            .build();
        assert_eq!(config.log_level, tracing::Level::DEBUG);
        assert_eq!(config.output_format, OutputFormat::Json);
        assert!(config.enable_console);
    }
}
