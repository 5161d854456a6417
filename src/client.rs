//! Gemini Client Implementation
//!
//! [`GeminiClient`] is the API handle shared by every wrapper. It owns the HTTP client
//! and configuration, adds the `x-goog-api-key` header, maps error bodies to
//! [`GeminiError`], applies the optional retry policy and decodes SSE streams.

use eventsource_stream::Eventsource;
use futures::Stream;
use futures_util::StreamExt;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use secrecy::ExposeSecret;
use serde::Serialize;
use serde::de::DeserializeOwned;
use static_assertions::assert_impl_all;
use std::pin::Pin;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};
use validator::Validate;

use crate::config::GeminiConfig;
use crate::error::{GeminiError, Result};
use crate::output::OutputDir;
use crate::retry::maybe_retry;
use crate::telemetry::redact_url;
use crate::types::{GenerateContentRequest, GenerateContentResponse, Operation};

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Stream of partial `generateContent` responses.
pub type GenerateContentStream =
    Pin<Box<dyn Stream<Item = Result<GenerateContentResponse>> + Send>>;

/// Shared Gemini API handle.
#[derive(Clone)]
pub struct GeminiClient {
    http_client: reqwest::Client,
    config: Arc<GeminiConfig>,
}

assert_impl_all!(GeminiClient: Send, Sync, Clone);

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("config", &self.config)
            .finish()
    }
}

impl GeminiClient {
    /// Create a client, building the HTTP client from `config`.
    pub fn new(config: GeminiConfig) -> Result<Self> {
        config.validate()?;

        let mut builder = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout.unwrap_or(60)));

        if let Some(user_agent) = &config.http_config.user_agent {
            builder = builder.user_agent(user_agent.clone());
        }
        if let Some(proxy) = &config.http_config.proxy {
            let proxy = reqwest::Proxy::all(proxy).map_err(|e| {
                GeminiError::ConfigurationError(format!("Invalid proxy URL: {e}"))
            })?;
            builder = builder.proxy(proxy);
        }
        if !config.http_config.headers.is_empty() {
            builder = builder.default_headers(build_headers(&config)?);
        }

        let http_client = builder.build().map_err(|e| {
            GeminiError::ConfigurationError(format!("Failed to create HTTP client: {e}"))
        })?;

        Self::with_http_client(config, http_client)
    }

    /// Create a client with a caller-provided HTTP client.
    pub fn with_http_client(config: GeminiConfig, http_client: reqwest::Client) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            http_client,
            config: Arc::new(config),
        })
    }

    /// Create a client with only an API key.
    pub fn with_api_key(api_key: impl Into<String>) -> Result<Self> {
        Self::new(GeminiConfig::new(api_key))
    }

    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }

    /// Output directory configured for generated files.
    pub fn output_dir(&self) -> OutputDir {
        OutputDir::new(self.config.output_dir.clone())
    }

    pub(crate) fn api_key(&self) -> &str {
        self.config.api_key.expose_secret()
    }

    /// `models/{model}:generateContent`
    pub async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse> {
        let url = self.model_url(model, "generateContent");
        let response: GenerateContentResponse = self.post_json(&url, request).await?;
        response.ensure_not_blocked()?;
        Ok(response)
    }

    /// `models/{model}:streamGenerateContent?alt=sse`
    pub async fn stream_generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentStream> {
        let url = format!("{}?alt=sse", self.model_url(model, "streamGenerateContent"));
        debug!(method = "POST", url = %url, "Stream request started");

        let response = self
            .http_client
            .post(&url)
            .header(API_KEY_HEADER, self.api_key())
            .json(request)
            .send()
            .await?;
        let response = check_status(response).await?;

        let mut events = response.bytes_stream().eventsource();
        let stream = async_stream::stream! {
            while let Some(event) = events.next().await {
                match event {
                    Ok(event) if event.data.trim().is_empty() => continue,
                    Ok(event) => {
                        yield serde_json::from_str::<GenerateContentResponse>(&event.data)
                            .map_err(GeminiError::from);
                    }
                    Err(e) => {
                        yield Err(GeminiError::StreamError(e.to_string()));
                        break;
                    }
                }
            }
        };
        Ok(Box::pin(stream))
    }

    /// `models/{model}:predict` (Imagen)
    pub async fn predict(
        &self,
        model: &str,
        body: &serde_json::Value,
    ) -> Result<serde_json::Value> {
        let url = self.model_url(model, "predict");
        self.post_json(&url, body).await
    }

    /// `models/{model}:predictLongRunning` (Veo); returns the pending operation.
    pub async fn predict_long_running(
        &self,
        model: &str,
        body: &serde_json::Value,
    ) -> Result<Operation> {
        let url = self.model_url(model, "predictLongRunning");
        self.post_json(&url, body).await
    }

    /// Fetch the current state of a long-running operation.
    pub async fn get_operation(&self, name: &str) -> Result<Operation> {
        let trimmed = name.trim().trim_start_matches('/');
        let url = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            trimmed.to_string()
        } else {
            format!("{}/{trimmed}", self.base_url())
        };
        self.get_json(&url).await
    }

    /// Download a generated file (e.g. a video URI).
    ///
    /// The API key is only attached when `uri` has the same origin as the base URL.
    pub async fn download(&self, uri: &str) -> Result<Vec<u8>> {
        let start = Instant::now();
        let send_key = self.is_api_origin(uri);
        if !send_key {
            debug!(url = %redact_url(uri), "Downloading from foreign host without API key");
        }
        let bytes = maybe_retry(
            || async {
                let mut request = self.http_client.get(uri);
                if send_key {
                    request = request.header(API_KEY_HEADER, self.api_key());
                }
                let response = request.send().await?;
                let response = check_status(response).await?;
                Ok(response.bytes().await?.to_vec())
            },
            self.config.retry_options.as_ref(),
        )
        .await?;
        info!(
            url = %redact_url(uri),
            bytes = bytes.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Download completed"
        );
        Ok(bytes)
    }

    /// Realtime endpoint for `path`, with the API key as query parameter.
    pub fn live_url(&self, path: &str) -> String {
        format!(
            "{}/{}?key={}",
            self.config.live_base_url.trim_end_matches('/'),
            path.trim_start_matches('/'),
            urlencoding::encode(self.api_key())
        )
    }

    fn base_url(&self) -> &str {
        self.config.base_url.trim_end_matches('/')
    }

    fn is_api_origin(&self, uri: &str) -> bool {
        match (reqwest::Url::parse(uri), reqwest::Url::parse(self.base_url())) {
            (Ok(target), Ok(base)) => target.origin() == base.origin(),
            _ => false,
        }
    }

    fn model_url(&self, model: &str, method: &str) -> String {
        format!(
            "{}/models/{}:{method}",
            self.base_url(),
            normalize_model_id(model)
        )
    }

    async fn post_json<B, T>(&self, url: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = serde_json::to_value(body)?;
        maybe_retry(
            || self.execute(self.http_client.post(url).json(&body), "POST", url),
            self.config.retry_options.as_ref(),
        )
        .await
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        maybe_retry(
            || self.execute(self.http_client.get(url), "GET", url),
            self.config.retry_options.as_ref(),
        )
        .await
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        method: &str,
        url: &str,
    ) -> Result<T> {
        let start = Instant::now();
        debug!(method, url = %url, "Request started");

        let response = request
            .header(API_KEY_HEADER, self.api_key())
            .send()
            .await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            error!(
                method,
                url = %url,
                status_code = status.as_u16(),
                duration_ms = start.elapsed().as_millis() as u64,
                "Request failed"
            );
            return Err(GeminiError::from_response_body(status.as_u16(), &text));
        }

        debug!(
            method,
            url = %url,
            status_code = status.as_u16(),
            duration_ms = start.elapsed().as_millis() as u64,
            response_length = text.len(),
            "Request completed"
        );
        serde_json::from_str(&text).map_err(|e| {
            GeminiError::ParseError(format!("Failed to parse response from {url}: {e}"))
        })
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(GeminiError::from_response_body(status.as_u16(), &body))
}

fn build_headers(config: &GeminiConfig) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    for (name, value) in &config.http_config.headers {
        let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
            GeminiError::ConfigurationError(format!("Invalid header name {name}: {e}"))
        })?;
        let value = HeaderValue::from_str(value).map_err(|e| {
            GeminiError::ConfigurationError(format!("Invalid header value for {name}: {e}"))
        })?;
        headers.insert(name, value);
    }
    Ok(headers)
}

/// Accept `gemini-2.0-flash`, `models/gemini-2.0-flash` or a full resource path.
pub(crate) fn normalize_model_id(model: &str) -> String {
    let trimmed = model.trim().trim_matches('/');
    if let Some(pos) = trimmed.rfind("/models/") {
        return trimmed[(pos + "/models/".len())..].to_string();
    }
    if let Some(rest) = trimmed.strip_prefix("models/") {
        return rest.to_string();
    }
    trimmed.to_string()
}
