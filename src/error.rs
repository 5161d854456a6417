//! Error Handling
//!
//! A single error type, [`GeminiError`], covers every wrapper. Remote failures keep the
//! HTTP status so callers (and the retry layer) can tell transient errors from client
//! mistakes.
//!
//! # Example
//!
//! ```rust,ignore
//! use gemini_studio::error::GeminiError;
//!
//! let error = GeminiError::api_error(429, "Resource exhausted");
//! assert!(error.is_retryable());
//! ```

use serde::Deserialize;
use thiserror::Error;

/// Result alias used across the crate.
pub type Result<T, E = GeminiError> = std::result::Result<T, E>;

/// Errors produced by the Gemini wrappers.
#[derive(Debug, Error)]
pub enum GeminiError {
    /// Invalid or missing configuration (API key, base URL, HTTP client)
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// A setter rejected a value; the previous value is kept
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// A call was made without the input it needs (e.g. no prompt)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Transport level failure (connect, TLS, body read)
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// The API answered with a non-success status
    #[error("API error {code}: {message}")]
    ApiError {
        code: u16,
        message: String,
        details: Option<serde_json::Value>,
    },

    /// A response body could not be decoded
    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Server-sent event stream failure
    #[error("Stream error: {0}")]
    StreamError(String),

    /// Realtime session failure
    #[error("WebSocket error: {0}")]
    WebSocketError(String),

    #[error("Timeout: {0}")]
    TimeoutError(String),

    /// The call succeeded but did not contain what was asked for
    #[error("Missing response: {0}")]
    MissingResponse(String),

    /// WAV encoding or audio device failure
    #[error("Audio error: {0}")]
    AudioError(String),

    /// Image decoding or encoding failure
    #[error("Image error: {0}")]
    ImageError(String),
}

impl GeminiError {
    /// Build an [`GeminiError::ApiError`] without details.
    pub fn api_error(code: u16, message: impl Into<String>) -> Self {
        Self::ApiError {
            code,
            message: message.into(),
            details: None,
        }
    }

    /// HTTP status code, when the error came from the API.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::ApiError { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Whether repeating the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::ApiError { code, .. } => *code == 429 || (500..600).contains(code),
            Self::HttpError(_) | Self::TimeoutError(_) => true,
            _ => false,
        }
    }

    /// Map a non-success response body to an error.
    ///
    /// Google APIs answer with `{"error": {"code", "message", "status"}}`; anything else
    /// is kept verbatim as the message.
    pub fn from_response_body(status: u16, body: &str) -> Self {
        #[derive(Deserialize)]
        struct Envelope {
            error: GoogleError,
        }

        #[derive(Deserialize)]
        struct GoogleError {
            #[serde(default)]
            message: String,
            #[serde(default)]
            status: Option<String>,
        }

        match serde_json::from_str::<Envelope>(body) {
            Ok(envelope) => {
                let message = match envelope.error.status {
                    Some(status_text) => format!("{status_text}: {}", envelope.error.message),
                    None => envelope.error.message,
                };
                Self::ApiError {
                    code: status,
                    message,
                    details: serde_json::from_str(body).ok(),
                }
            }
            Err(_) => Self::ApiError {
                code: status,
                message: if body.trim().is_empty() {
                    format!("HTTP {status}")
                } else {
                    body.trim().to_string()
                },
                details: None,
            },
        }
    }
}

impl From<reqwest::Error> for GeminiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::TimeoutError(err.to_string())
        } else if err.is_decode() {
            Self::ParseError(err.to_string())
        } else if let Some(status) = err.status() {
            Self::api_error(status.as_u16(), err.to_string())
        } else {
            Self::HttpError(err.to_string())
        }
    }
}

impl From<serde_json::Error> for GeminiError {
    fn from(err: serde_json::Error) -> Self {
        Self::ParseError(err.to_string())
    }
}

impl From<base64::DecodeError> for GeminiError {
    fn from(err: base64::DecodeError) -> Self {
        Self::ParseError(format!("Invalid base64 payload: {err}"))
    }
}

impl From<hound::Error> for GeminiError {
    fn from(err: hound::Error) -> Self {
        match err {
            hound::Error::IoError(io) => Self::IoError(io),
            other => Self::AudioError(other.to_string()),
        }
    }
}

impl From<image::ImageError> for GeminiError {
    fn from(err: image::ImageError) -> Self {
        match err {
            image::ImageError::IoError(io) => Self::IoError(io),
            other => Self::ImageError(other.to_string()),
        }
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for GeminiError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        Self::WebSocketError(err.to_string())
    }
}

impl From<validator::ValidationErrors> for GeminiError {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::InvalidParameter(err.to_string())
    }
}
