//! Generation request and response types
//!
//! A request is an ordered list of prompt parts. Providers must preserve the
//! order: the diagnosis prompt is sent as one text part followed by images.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

/// One part of a generation prompt
#[derive(Debug, Clone, PartialEq)]
pub enum PromptPart {
    /// Plain text
    Text(String),
    /// Encoded image bytes sent inline
    InlineImage {
        /// Encoded image bytes
        data: Vec<u8>,
        /// MIME type of `data`
        mime_type: String,
    },
}

impl PromptPart {
    /// Create a text part
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Create an inline image part
    #[must_use]
    pub fn image(data: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self::InlineImage {
            data,
            mime_type: mime_type.into(),
        }
    }

    /// Text content, if this is a text part
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::InlineImage { .. } => None,
        }
    }

    /// Whether this part carries an image
    #[must_use]
    pub fn is_image(&self) -> bool {
        matches!(self, Self::InlineImage { .. })
    }

    /// Base64 encoding of the image payload
    #[must_use]
    pub fn base64_data(&self) -> Option<String> {
        match self {
            Self::InlineImage { data, .. } => Some(BASE64.encode(data)),
            Self::Text(_) => None,
        }
    }
}

/// Token usage information
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Prompt tokens
    pub prompt_tokens: u32,
    /// Completion tokens
    pub completion_tokens: u32,
    /// Total tokens
    pub total_tokens: u32,
}

/// Generation request
#[derive(Debug, Clone, Default)]
pub struct GenerationRequest {
    /// Ordered prompt parts
    pub parts: Vec<PromptPart>,
    /// Model override (provider default when `None`)
    pub model: Option<String>,
    /// Maximum tokens to generate
    pub max_tokens: Option<u32>,
    /// Temperature (0.0 - 2.0)
    pub temperature: Option<f32>,
}

impl GenerationRequest {
    /// Create a request with a single text part
    #[must_use]
    pub fn text(prompt: impl Into<String>) -> Self {
        Self {
            parts: vec![PromptPart::text(prompt)],
            ..Default::default()
        }
    }

    /// Append an inline image part
    #[must_use]
    pub fn with_image(mut self, data: Vec<u8>, mime_type: impl Into<String>) -> Self {
        self.parts.push(PromptPart::image(data, mime_type));
        self
    }

    /// Set the model
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set max tokens
    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set temperature
    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Concatenated text of all text parts
    #[must_use]
    pub fn prompt_text(&self) -> String {
        self.parts
            .iter()
            .filter_map(PromptPart::as_text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Number of image parts
    #[must_use]
    pub fn image_count(&self) -> usize {
        self.parts.iter().filter(|p| p.is_image()).count()
    }
}

/// Generation response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationResponse {
    /// Raw generated text
    pub text: String,
    /// Model used
    pub model: String,
    /// Finish reason
    pub finish_reason: Option<String>,
    /// Token usage
    pub usage: Option<TokenUsage>,
}

impl GenerationResponse {
    /// Create a response carrying only text
    #[must_use]
    pub fn from_text(text: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            model: model.into(),
            finish_reason: Some("stop".to_string()),
            usage: None,
        }
    }
}
