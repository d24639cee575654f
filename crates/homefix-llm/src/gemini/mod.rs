//! Gemini - Google Gemini API provider
//!
//! This module implements the generation port against the Gemini
//! `generateContent` endpoint using reqwest.

mod config;
mod convert;
mod provider;
mod security;
mod types;


pub use config::{GeminiConfig, DEFAULT_MODEL, MODELS};
pub use provider::GeminiProvider;
