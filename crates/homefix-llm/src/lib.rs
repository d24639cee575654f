//! Homefix LLM - Generation port
//!
//! This crate provides the single narrow capability the diagnosis core
//! consumes from a model backend:
//! - Provider: the `GenerationProvider` trait (`generate(parts) -> text`)
//! - Request: ordered prompt parts (text and inline images)
//! - Gemini: Google Gemini provider over reqwest
//! - Mock: deterministic provider returning canned text, for tests

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod gemini;
pub mod provider;
pub mod request;
pub mod util;

pub use error::{Error, Result};
pub use gemini::{GeminiConfig, GeminiProvider};
pub use provider::{GenerationProvider, MockProvider};
pub use request::{GenerationRequest, GenerationResponse, PromptPart, TokenUsage};
