//! Gemini provider implementation

use super::config::GeminiConfig;
use super::convert::{convert_parts, extract_text};
use super::security::sanitize_api_error;
use super::types::*;
use crate::error::{Error, Result};
use crate::provider::GenerationProvider;
use crate::request::{GenerationRequest, GenerationResponse, TokenUsage};
use reqwest::Client;
use tracing::{debug, instrument, warn};

/// Google Gemini provider
pub struct GeminiProvider {
    client: Client,
    pub(crate) config: GeminiConfig,
}

impl GeminiProvider {
    /// Create a new Gemini provider
    pub fn new(config: GeminiConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(Error::NotConfigured("Gemini API key is empty".to_string()));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::Network(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        Self::new(GeminiConfig::from_env()?)
    }

    /// Single attempt to send a request to the Gemini API.
    ///
    /// Failures are classified but never retried here.
    async fn send_request(&self, model: &str, request: &GeminiRequest) -> Result<GeminiResponse> {
        // SECURITY: Don't log the full URL (contains API key)
        debug!(model, "Sending request to Gemini");

        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.config.base_url, model, self.config.api_key
        );

        let response = self
            .client
            .post(&url)
            .header("content-type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::Timeout(self.config.timeout.as_millis() as u64)
                } else {
                    // reqwest errors may embed the URL
                    Error::Network(sanitize_api_error(&e.without_url().to_string()))
                }
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                Error::Timeout(self.config.timeout.as_millis() as u64)
            } else {
                Error::Network(e.without_url().to_string())
            }
        })?;

        if !status.is_success() {
            warn!(status = %status, "Gemini API error response");
            if status.as_u16() == 429 {
                return Err(Error::RateLimit);
            }
            let detail = serde_json::from_str::<GeminiError>(&body)
                .map(|e| {
                    warn!(
                        error_status = %e.error.status,
                        error_code = e.error.code,
                        "Gemini API error detail"
                    );
                    format!("{}: {}", e.error.status, e.error.message)
                })
                .unwrap_or_else(|_| format!("HTTP {}", status));
            if status.is_server_error() {
                return Err(Error::ServerError(sanitize_api_error(&detail)));
            }
            return Err(Error::Api(sanitize_api_error(&detail)));
        }

        serde_json::from_str(&body).map_err(|e| {
            Error::InvalidResponse(format!(
                "{}: {}",
                e,
                crate::util::truncate_safe(&body, 200)
            ))
        })
    }
}

#[async_trait::async_trait]
impl GenerationProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    fn default_model(&self) -> &str {
        &self.config.default_model
    }

    #[instrument(skip(self, request), fields(parts = request.parts.len(), images = request.image_count()))]
    async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse> {
        let model = request
            .model
            .clone()
            .unwrap_or_else(|| self.config.default_model.clone());

        let gemini_request = GeminiRequest {
            contents: vec![convert_parts(&request.parts)],
            generation_config: Some(GenerationConfig {
                temperature: request.temperature,
                max_output_tokens: request.max_tokens.or(Some(self.config.default_max_tokens)),
            }),
        };

        let response = self.send_request(&model, &gemini_request).await?;

        let finish_reason = response
            .candidates
            .first()
            .and_then(|c| c.finish_reason.clone());

        let text = extract_text(&response).ok_or_else(|| {
            if finish_reason.as_deref() == Some("MAX_TOKENS") {
                warn!("Gemini response empty (MAX_TOKENS)");
            }
            Error::EmptyResponse
        })?;

        let usage = response.usage_metadata.map(|u| TokenUsage {
            prompt_tokens: u.prompt_token_count,
            completion_tokens: u.candidates_token_count.unwrap_or(0),
            total_tokens: u.total_token_count,
        });

        Ok(GenerationResponse {
            text,
            model,
            finish_reason,
            usage,
        })
    }
}
