//! Homefix Core - Diagnostic orchestration
//!
//! This crate turns a free-text problem description (plus optional photos and
//! home profile) into a structured repair diagnosis:
//! - Round: confidence-gated question rounds, derived from history length
//! - Prompt: deterministic prompt composition from accumulated context
//! - Normalize: repair of loosely structured model output into `AnalysisResult`
//! - Engine: one generation call per round through the injected provider
//! - Chat: single-turn follow-up answers grounded in a finished analysis
//! - Media: validation and canonical re-encoding of uploaded photos
//! - Service: the `diagnose` and `chat` entrypoints

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod analysis;
pub mod chat;
pub mod engine;
pub mod error;
pub mod media;
pub mod normalize;
pub mod prompt;
pub mod round;
pub mod service;
pub mod types;

pub use analysis::{
    AnalysisResult, ClarifyingQuestion, ConfidenceLevel, Damage, Difficulty, DiyFriendly,
    Material, Severity, Tool, CONFIDENCE_THRESHOLD,
};
pub use chat::{AnalysisContext, ChatConfig, ChatRequest, ChatResponder, ChatRole, ChatTurn};
pub use engine::{DiagnosticEngine, EngineConfig};
pub use error::{Error, Result};
pub use media::{ImageUpload, MediaConfig, MediaNormalizer, NormalizedImage, SupportedMediaType};
pub use normalize::{extract_json, normalize_analysis, normalize_final_analysis};
pub use round::{round_for_history, RoundMode, MAX_ROUNDS};
pub use service::{HomeRepairService, ServiceConfig};
pub use types::{
    DiagnosticRequest, GettingWorse, HomeProfile, Location, QaPair, RepairGoal, SurfaceCondition,
    WaterExposure,
};
