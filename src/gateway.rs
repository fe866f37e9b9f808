//! Language-model gateway abstraction
//!
//! The conversation only needs "prompt in, reply out". Providers implement
//! [`Gateway`]; the runtime receives one at construction.

mod config;
mod error;
mod gemini;

pub use config::{ConfigError, GatewayConfig};
pub use error::{GatewayError, GatewayErrorKind};
pub use gemini::GeminiGateway;

use async_trait::async_trait;
use std::sync::Arc;

/// Common interface for language-model services
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Ask for a reply to `prompt`
    async fn send(&self, prompt: &str) -> Result<String, GatewayError>;

    /// Get the model ID
    fn model_id(&self) -> &str;
}

#[async_trait]
impl<T: Gateway + ?Sized> Gateway for Arc<T> {
    async fn send(&self, prompt: &str) -> Result<String, GatewayError> {
        (**self).send(prompt).await
    }

    fn model_id(&self) -> &str {
        (**self).model_id()
    }
}

/// Build the gateway described by `config`.
///
/// Without an API key the session still runs its scripted flow; every
/// delegated turn fails with an auth error.
pub fn from_config(config: &GatewayConfig) -> Result<Arc<dyn Gateway>, GatewayError> {
    if !config.has_api_key() {
        tracing::warn!("No Gemini API key configured. Set GEMINI_API_KEY.");
        return Ok(Arc::new(LoggingGateway::new(Arc::new(UnavailableGateway))));
    }

    let gemini = GeminiGateway::new(config)?;
    tracing::info!(model = %gemini.model_id(), "Gemini gateway initialized");
    Ok(Arc::new(LoggingGateway::new(Arc::new(gemini))))
}

/// Logging wrapper for gateways
pub struct LoggingGateway {
    inner: Arc<dyn Gateway>,
    model_id: String,
}

impl LoggingGateway {
    pub fn new(inner: Arc<dyn Gateway>) -> Self {
        let model_id = inner.model_id().to_string();
        Self { inner, model_id }
    }
}

#[async_trait]
impl Gateway for LoggingGateway {
    async fn send(&self, prompt: &str) -> Result<String, GatewayError> {
        let start = std::time::Instant::now();
        let result = self.inner.send(prompt).await;
        let duration = start.elapsed();

        match &result {
            Ok(reply) => {
                tracing::info!(
                    model = %self.model_id,
                    duration_ms = %duration.as_millis(),
                    prompt_chars = prompt.chars().count(),
                    reply_chars = reply.chars().count(),
                    "Gateway request completed"
                );
            }
            Err(e) => {
                tracing::error!(
                    model = %self.model_id,
                    duration_ms = %duration.as_millis(),
                    error = %e.message,
                    kind = ?e.kind,
                    "Gateway request failed"
                );
            }
        }

        result
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

/// Stand-in used when no provider is configured
pub struct UnavailableGateway;

#[async_trait]
impl Gateway for UnavailableGateway {
    async fn send(&self, _prompt: &str) -> Result<String, GatewayError> {
        Err(GatewayError::auth("No language model configured"))
    }

    fn model_id(&self) -> &str {
        "unavailable"
    }
}
