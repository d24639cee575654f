//! Follow-up chat endpoint

use super::error::ApiError;
use super::ApiResponse;
use axum::{extract::Extension, response::Json};
use homefix_core::{ChatRequest, HomeRepairService};
use serde::Serialize;
use std::sync::Arc;

/// Chat reply payload
#[derive(Debug, Serialize)]
pub struct ChatReply {
    pub reply: String,
}

/// Answer one follow-up question
pub async fn chat(
    Extension(service): Extension<Arc<HomeRepairService>>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ApiResponse<ChatReply>>, ApiError> {
    let reply = service.chat(request).await?;
    Ok(Json(ApiResponse::success(ChatReply { reply })))
}
