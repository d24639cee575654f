//! Prompt part conversion for Gemini API

use super::types::{GeminiContent, GeminiPart, GeminiResponse, InlineData};
use crate::request::PromptPart;

/// Convert ordered prompt parts into a single user turn
pub(crate) fn convert_parts(parts: &[PromptPart]) -> GeminiContent {
    let parts = parts
        .iter()
        .map(|part| match part {
            PromptPart::Text(text) => GeminiPart::Text { text: text.clone() },
            PromptPart::InlineImage { mime_type, .. } => GeminiPart::InlineData {
                inline_data: InlineData {
                    mime_type: mime_type.clone(),
                    data: part.base64_data().unwrap_or_default(),
                },
            },
        })
        .collect();

    GeminiContent {
        role: Some("user".to_string()),
        parts,
    }
}

/// Join all text parts of the first candidate
pub(crate) fn extract_text(response: &GeminiResponse) -> Option<String> {
    let content = response.candidates.first()?.content.as_ref()?;
    let text: String = content
        .parts
        .iter()
        .filter_map(|part| match part {
            GeminiPart::Text { text } => Some(text.as_str()),
            _ => None,
        })
        .collect();
    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}
