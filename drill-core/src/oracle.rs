//! The text oracle: a prompt goes in, a completion comes out.
//!
//! [`TextOracle`] is the only outbound dependency of the engine. The
//! production implementation, [`ClaudeOracle`], sends each prompt as a
//! single user message through the `claude` client. Tests use
//! [`crate::testing::MockOracle`].

use crate::profile::ConfigError;
use async_trait::async_trait;
use claude::{Claude, Request};
use std::time::Duration;
use thiserror::Error;

/// Errors from an oracle call. All of them leave the session untouched
/// and may be retried.
#[derive(Debug, Error)]
pub enum OracleError {
    #[error("Oracle unavailable: {0}")]
    Unavailable(#[from] claude::Error),

    #[error("Oracle did not answer within {0:?}")]
    Timeout(Duration),

    #[error("Oracle returned an empty completion")]
    EmptyCompletion,

    #[error("Oracle failed: {0}")]
    Other(String),
}

impl OracleError {
    /// Whether re-issuing the same call might succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            OracleError::Unavailable(e) => !e.is_auth(),
            _ => true,
        }
    }
}

/// A generative text-completion service.
#[async_trait]
pub trait TextOracle: Send + Sync {
    /// Complete a prompt.
    async fn complete(&self, prompt: &str) -> Result<String, OracleError>;
}

#[async_trait]
impl<T: TextOracle + ?Sized> TextOracle for std::sync::Arc<T> {
    async fn complete(&self, prompt: &str) -> Result<String, OracleError> {
        (**self).complete(prompt).await
    }
}

/// Call `oracle` and give up after `limit`.
pub(crate) async fn complete_within<O: TextOracle + ?Sized>(
    oracle: &O,
    prompt: &str,
    limit: Duration,
) -> Result<String, OracleError> {
    match tokio::time::timeout(limit, oracle.complete(prompt)).await {
        Ok(result) => result,
        Err(_) => Err(OracleError::Timeout(limit)),
    }
}

/// Generation settings for [`ClaudeOracle`].
#[derive(Debug, Clone)]
pub struct OracleConfig {
    /// The model to use (defaults to the client's model).
    pub model: Option<String>,

    /// Maximum tokens per completion.
    pub max_tokens: usize,

    /// Sampling temperature.
    pub temperature: Option<f32>,

    /// HTTP-level timeout for one request.
    pub request_timeout: Duration,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            model: None,
            max_tokens: 2048,
            temperature: Some(0.8),
            request_timeout: Duration::from_secs(120),
        }
    }
}

impl OracleConfig {
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_max_tokens(mut self, tokens: usize) -> Self {
        self.max_tokens = tokens;
        self
    }

    pub fn with_temperature(mut self, temp: f32) -> Self {
        self.temperature = Some(temp);
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

/// [`TextOracle`] backed by the Claude Messages API.
#[derive(Clone)]
pub struct ClaudeOracle {
    client: Claude,
    config: OracleConfig,
}

impl ClaudeOracle {
    /// Wrap an existing client.
    pub fn new(client: Claude, config: OracleConfig) -> Self {
        Self { client, config }
    }

    /// Build a client from `ANTHROPIC_API_KEY`.
    ///
    /// A missing key is a startup error, not an oracle failure.
    pub fn from_env(config: OracleConfig) -> Result<Self, ConfigError> {
        let api_key = std::env::var("ANTHROPIC_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or(ConfigError::MissingCredential)?;

        let client = Claude::with_timeout(api_key, config.request_timeout)
            .map_err(|e| ConfigError::Client(e.to_string()))?;

        Ok(Self::new(client, config))
    }

    pub fn config(&self) -> &OracleConfig {
        &self.config
    }

    fn build_request(&self, prompt: &str) -> Request {
        let mut request = Request::prompt(prompt).with_max_tokens(self.config.max_tokens);
        if let Some(model) = &self.config.model {
            request = request.with_model(model.clone());
        }
        if let Some(temperature) = self.config.temperature {
            request = request.with_temperature(temperature);
        }
        request
    }
}

#[async_trait]
impl TextOracle for ClaudeOracle {
    async fn complete(&self, prompt: &str) -> Result<String, OracleError> {
        let response = self.client.complete(self.build_request(prompt)).await?;
        tracing::debug!(
            model = %response.model,
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            stop_reason = ?response.stop_reason,
            "oracle completion received"
        );
        if response.is_truncated() {
            tracing::warn!(max_tokens = self.config.max_tokens, "completion hit the token limit");
        }

        let text = response.text();
        if text.trim().is_empty() {
            return Err(OracleError::EmptyCompletion);
        }
        Ok(text)
    }
}
