//! Web API module for Homefix
//!
//! Provides REST API endpoints for:
//! - Diagnosis rounds (multipart photos + metadata)
//! - Follow-up chat
//! - Saved home profiles and analyses (when persistence is enabled)

pub mod analyze;
pub mod chat;
pub mod error;
pub mod health;
pub mod profile;

#[cfg(test)]
mod tests;

use axum::routing::{get, post};
use axum::Router;
use serde::Serialize;

pub use error::ApiError;
pub use health::health_routes;

/// Standard success envelope
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

/// Create the API router with all endpoints.
///
/// Handlers read `Arc<HomeRepairService>` and an optional `Store` from
/// request extensions; the caller adds them as layers.
pub fn api_router() -> Router {
    Router::new()
        .route("/api/analyze", post(analyze::analyze))
        .route("/api/chat", post(chat::chat))
        .route(
            "/api/profile/:user_id",
            get(profile::get_profile)
                .put(profile::put_profile)
                .delete(profile::delete_profile),
        )
        .route("/api/analyses/:user_id", get(profile::list_analyses))
        .route(
            "/api/analysis/:id",
            get(profile::get_analysis).delete(profile::delete_analysis),
        )
}
