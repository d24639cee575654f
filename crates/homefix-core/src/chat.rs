//! Chat Responder
//!
//! Single-turn follow-up answers grounded in a finished analysis. There is no
//! round or confidence state here and the reply is free text.

use crate::analysis::AnalysisResult;
use crate::error::{Error, Result};
use crate::prompt::compose_chat_prompt;
use homefix_llm::{GenerationProvider, GenerationRequest};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Who spoke a chat turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    /// The homeowner
    User,
    /// The assistant
    #[serde(alias = "model")]
    Assistant,
}

/// One prior chat turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    /// Speaker
    pub role: ChatRole,
    /// Message text
    pub content: String,
}

impl ChatTurn {
    /// A user turn
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    /// An assistant turn
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// Condensed analysis the chat is grounded in, as flattened text
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalysisContext {
    /// Short problem statement
    pub problem_summary: String,
    /// Materials, comma separated
    pub materials: String,
    /// Tools, comma separated
    pub tools: String,
    /// Numbered steps
    pub steps: String,
    /// Warnings, semicolon separated
    pub warnings: String,
}

impl AnalysisContext {
    /// Flatten a finished analysis
    #[must_use]
    pub fn from_result(result: &AnalysisResult) -> Self {
        let problem_summary = if result.problem_short.is_empty() {
            result.summary.clone()
        } else {
            result.problem_short.clone()
        };

        let materials = result
            .materials
            .iter()
            .map(|m| {
                if m.qty.is_empty() {
                    m.item.clone()
                } else {
                    format!("{} ({})", m.item, m.qty)
                }
            })
            .collect::<Vec<_>>()
            .join(", ");

        let tools = result
            .tools
            .iter()
            .map(|t| t.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");

        let steps = result
            .steps
            .iter()
            .enumerate()
            .map(|(i, step)| format!("{}. {}", i + 1, step))
            .collect::<Vec<_>>()
            .join(" ");

        Self {
            problem_summary,
            materials,
            tools,
            steps,
            warnings: result.warnings.join("; "),
        }
    }
}

/// A follow-up question about an analysis
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    /// The problem description the analysis answered
    pub original_description: String,
    /// Condensed analysis
    #[serde(default)]
    pub analysis_context: AnalysisContext,
    /// Earlier turns, oldest first
    #[serde(default)]
    pub history: Vec<ChatTurn>,
    /// The new question
    pub message: String,
}

impl ChatRequest {
    /// Reject empty message or description
    pub fn validate(&self) -> Result<()> {
        if self.original_description.trim().is_empty() {
            return Err(Error::invalid_input("originalDescription is required"));
        }
        if self.message.trim().is_empty() {
            return Err(Error::invalid_input("message is required"));
        }
        Ok(())
    }
}

/// Generation settings for chat replies
#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// Model override
    pub model: Option<String>,
    /// Output token ceiling
    pub max_tokens: u32,
    /// Sampling temperature
    pub temperature: f32,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            model: None,
            max_tokens: 1024,
            temperature: 0.7,
        }
    }
}

/// Answers follow-up questions with one generation call each
pub struct ChatResponder {
    provider: Arc<dyn GenerationProvider>,
    config: ChatConfig,
}

impl ChatResponder {
    /// Create a responder with default settings
    pub fn new(provider: Arc<dyn GenerationProvider>) -> Self {
        Self::with_config(provider, ChatConfig::default())
    }

    /// Create a responder with explicit settings
    pub fn with_config(provider: Arc<dyn GenerationProvider>, config: ChatConfig) -> Self {
        Self { provider, config }
    }

    /// Answer the new message; returns the model's trimmed text
    #[instrument(skip(self, request), fields(history = request.history.len()))]
    pub async fn respond(&self, request: &ChatRequest) -> Result<String> {
        request.validate()?;

        let mut generation = GenerationRequest::text(compose_chat_prompt(request))
            .with_max_tokens(self.config.max_tokens)
            .with_temperature(self.config.temperature);
        if let Some(model) = &self.config.model {
            generation = generation.with_model(model.clone());
        }

        let response = self.provider.generate(generation).await?;
        debug!(model = %response.model, chars = response.text.len(), "chat reply generated");
        Ok(response.text.trim().to_string())
    }
}
