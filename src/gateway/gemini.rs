//! Google Gemini gateway implementation

use super::{Gateway, GatewayConfig, GatewayError};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Gemini `generateContent` client
pub struct GeminiGateway {
    client: Client,
    api_key: String,
    url: String,
    model_id: String,
}

impl GeminiGateway {
    pub fn new(config: &GatewayConfig) -> Result<Self, GatewayError> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| GatewayError::auth("GEMINI_API_KEY is not set"))?;

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GatewayError::unknown(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            url: format!(
                "{}/v1beta/models/{}:generateContent",
                config.base_url.trim_end_matches('/'),
                config.model
            ),
            model_id: config.model.clone(),
        })
    }

    fn translate_request(prompt: &str) -> GeminiRequest {
        GeminiRequest {
            contents: vec![GeminiContent {
                role: Some("user".to_string()),
                parts: vec![GeminiPart {
                    text: Some(prompt.to_string()),
                }],
            }],
        }
    }

    fn normalize_response(resp: GeminiResponse) -> Result<String, GatewayError> {
        let candidate = resp
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| GatewayError::empty_reply("No candidates in response"))?;

        let text: String = candidate
            .content
            .map(|content| content.parts)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|part| part.text)
            .collect();

        if text.trim().is_empty() {
            return Err(GatewayError::empty_reply(format!(
                "Response had no text (finish reason: {})",
                candidate.finish_reason.as_deref().unwrap_or("unknown")
            )));
        }
        Ok(text)
    }
}

/// Map a non-success HTTP status and body to a classified error.
///
/// The status decides the kind; a JSON error body only supplies the message.
pub(crate) fn classify_failure(status: u16, body: &str) -> GatewayError {
    let parsed = serde_json::from_str::<GeminiErrorResponse>(body).ok();
    let unavailable = parsed
        .as_ref()
        .is_some_and(|resp| resp.error.status.as_deref() == Some("UNAVAILABLE"));
    let message = parsed.map_or_else(|| body.trim().to_string(), |resp| resp.error.message);

    match status {
        503 => GatewayError::overloaded(format!("Model overloaded: {message}")),
        _ if unavailable => GatewayError::overloaded(format!("Model overloaded: {message}")),
        400 => GatewayError::invalid_request(format!("Invalid request: {message}")),
        401 | 403 => GatewayError::auth(format!("Authentication failed: {message}")),
        429 => GatewayError::rate_limit(format!("Rate limit exceeded: {message}")),
        500..=599 => GatewayError::server_error(format!("Server error: {message}")),
        _ => GatewayError::unknown(format!("HTTP {status}: {message}")),
    }
}

#[async_trait]
impl Gateway for GeminiGateway {
    async fn send(&self, prompt: &str) -> Result<String, GatewayError> {
        let response = self
            .client
            .post(&self.url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(&Self::translate_request(prompt))
            .send()
            .await
            .map_err(|e| {
                let e = e.without_url();
                if e.is_timeout() {
                    GatewayError::network(format!("Request timeout: {e}"))
                } else if e.is_connect() {
                    GatewayError::network(format!("Connection failed: {e}"))
                } else {
                    GatewayError::unknown(format!("Request failed: {e}"))
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| {
                GatewayError::network(format!("Failed to read response: {}", e.without_url()))
            })?;

        if !status.is_success() {
            return Err(classify_failure(status.as_u16(), &body));
        }

        let gemini_response: GeminiResponse = serde_json::from_str(&body).map_err(|e| {
            GatewayError::unknown(format!("Failed to parse response: {e} - body: {body}"))
        })?;

        Self::normalize_response(gemini_response)
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

// Gemini API types

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorResponse {
    error: GeminiError,
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    message: String,
    #[serde(default)]
    status: Option<String>,
}
