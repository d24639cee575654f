//! Diagnostic Engine
//!
//! Runs one round of the clarifying-question protocol: derive the round from
//! the history length, compose the prompt, make exactly one generation call
//! and hand the raw text to the normalizer. The engine keeps no state between
//! calls; callers resend the full history every round.

use crate::analysis::AnalysisResult;
use crate::error::Result;
use crate::media::NormalizedImage;
use crate::normalize::{normalize_analysis, normalize_final_analysis};
use crate::prompt::compose_diagnosis_prompt;
use crate::round::RoundMode;
use crate::types::DiagnosticRequest;
use homefix_llm::{GenerationProvider, GenerationRequest};
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Generation settings for diagnosis calls
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Model override; the provider default is used when `None`
    pub model: Option<String>,
    /// Output token ceiling
    pub max_tokens: u32,
    /// Sampling temperature
    pub temperature: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            model: None,
            max_tokens: 8192,
            temperature: 0.4,
        }
    }
}

impl EngineConfig {
    /// Set the model
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }
}

/// Round-aware diagnosis over a generation provider
pub struct DiagnosticEngine {
    provider: Arc<dyn GenerationProvider>,
    config: EngineConfig,
}

impl DiagnosticEngine {
    /// Create an engine with default settings
    pub fn new(provider: Arc<dyn GenerationProvider>) -> Self {
        Self::with_config(provider, EngineConfig::default())
    }

    /// Create an engine with explicit settings
    pub fn with_config(provider: Arc<dyn GenerationProvider>, config: EngineConfig) -> Self {
        Self { provider, config }
    }

    /// Engine settings
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Build the generation request for this round.
    ///
    /// The composed prompt comes first, followed by the images in upload order.
    #[must_use]
    pub fn build_request(
        &self,
        request: &DiagnosticRequest,
        images: &[NormalizedImage],
        mode: RoundMode,
    ) -> GenerationRequest {
        let prompt = compose_diagnosis_prompt(request, images.len(), mode);
        let mut generation = GenerationRequest::text(prompt)
            .with_max_tokens(self.config.max_tokens)
            .with_temperature(self.config.temperature);
        if let Some(model) = &self.config.model {
            generation = generation.with_model(model.clone());
        }
        for image in images {
            generation = generation.with_image(image.data.clone(), image.mime_type.clone());
        }
        generation
    }

    /// Run one round and return the raw model text
    pub async fn generate_raw(
        &self,
        request: &DiagnosticRequest,
        images: &[NormalizedImage],
        mode: RoundMode,
    ) -> Result<String> {
        let generation = self.build_request(request, images, mode);
        let response = self.provider.generate(generation).await?;
        debug!(
            model = %response.model,
            chars = response.text.len(),
            finish_reason = ?response.finish_reason,
            "diagnosis generated"
        );
        Ok(response.text)
    }

    /// Run one diagnostic round.
    ///
    /// Images must already be normalized. Upstream failures surface as
    /// `GenerationUnavailable` without retry.
    #[instrument(skip(self, request, images), fields(
        provider = %self.provider.name(),
        history = request.conversation_history.len(),
        images = images.len(),
    ))]
    pub async fn diagnose(
        &self,
        request: &DiagnosticRequest,
        images: &[NormalizedImage],
    ) -> Result<AnalysisResult> {
        request.validate()?;

        let mode = RoundMode::from_history_len(request.conversation_history.len());
        let raw = self.generate_raw(request, images, mode).await?;

        let result = if mode.is_final() {
            normalize_final_analysis(&raw)?
        } else {
            normalize_analysis(&raw)?
        };

        info!(
            round = mode.round(),
            confidence = result.confidence,
            needs_more_info = result.needs_more_info,
            questions = result.questions.len(),
            "diagnosis round complete"
        );
        Ok(result)
    }
}
