//! Retry support
//!
//! Exponential backoff (via the `backoff` crate) for transient API failures: rate limits,
//! 5xx answers, transport errors and timeouts. Anything else fails immediately.
//!
//! ```rust,ignore
//! use gemini_studio::retry::RetryOptions;
//!
//! let options = RetryOptions::google().with_max_attempts(5);
//! let config = GeminiConfig::new(key).with_retry_options(options);
//! ```

use backoff::{ExponentialBackoff, ExponentialBackoffBuilder};
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use crate::error::{GeminiError, Result};

/// Retry configuration
#[derive(Debug, Clone)]
pub struct RetryOptions {
    /// Maximum number of attempts, including the first one
    pub max_attempts: u32,
    pub initial_interval: Duration,
    pub max_interval: Duration,
    pub multiplier: f64,
    /// Give up once this much time has passed since the first attempt
    pub max_elapsed_time: Option<Duration>,
}

impl Default for RetryOptions {
    fn default() -> Self {
        Self::google()
    }
}

impl RetryOptions {
    /// Backoff tuned for Google endpoints.
    pub fn google() -> Self {
        Self {
            max_attempts: 3,
            initial_interval: Duration::from_millis(1000),
            max_interval: Duration::from_secs(60),
            multiplier: 1.5,
            max_elapsed_time: Some(Duration::from_secs(300)),
        }
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    pub fn with_initial_interval(mut self, interval: Duration) -> Self {
        self.initial_interval = interval;
        self
    }

    pub fn with_max_elapsed_time(mut self, max: Option<Duration>) -> Self {
        self.max_elapsed_time = max;
        self
    }

    fn backoff(&self) -> ExponentialBackoff {
        ExponentialBackoffBuilder::new()
            .with_initial_interval(self.initial_interval)
            .with_max_interval(self.max_interval)
            .with_multiplier(self.multiplier)
            .with_max_elapsed_time(self.max_elapsed_time)
            .build()
    }
}

/// Run `operation`, retrying retryable failures according to `options`.
pub async fn retry_with<F, Fut, T>(operation: F, options: &RetryOptions) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let attempts = Arc::new(AtomicU32::new(0));
    let max_attempts = options.max_attempts.max(1);

    backoff::future::retry(options.backoff(), || {
        let attempts = attempts.clone();
        let fut = operation();
        async move {
            let attempt = attempts.fetch_add(1, Ordering::SeqCst) + 1;
            match fut.await {
                Ok(value) => Ok(value),
                Err(err) if err.is_retryable() && attempt < max_attempts => {
                    tracing::warn!(attempt, error = %err, "Retrying request");
                    Err(backoff::Error::transient(err))
                }
                Err(err) => Err(backoff::Error::permanent(err)),
            }
        }
    })
    .await
}

/// Run `operation` once, or through [`retry_with`] when options are given.
pub(crate) async fn maybe_retry<F, Fut, T>(operation: F, options: Option<&RetryOptions>) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    match options {
        Some(options) => retry_with(operation, options).await,
        None => operation().await,
    }
}
