//! Diagnosis endpoint
//!
//! `POST /api/analyze` takes a multipart form: one `metadata` field holding
//! the JSON request and zero or more `images` file fields.

use super::error::ApiError;
use axum::{
    extract::{multipart::MultipartError, Extension, Multipart},
    http::StatusCode,
    response::Json,
};
use homefix_core::{AnalysisResult, DiagnosticRequest, HomeRepairService, ImageUpload};
use homefix_store::Store;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// The `metadata` form field
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeMetadata {
    #[serde(flatten)]
    request: DiagnosticRequest,
    /// Owner for persistence; anonymous when absent
    #[serde(default)]
    user_id: Option<String>,
}

/// Successful diagnosis response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeResponse {
    pub success: bool,
    pub data: AnalysisResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis_id: Option<Uuid>,
}

/// Body-limit overruns keep their 413; anything else is a malformed form
fn multipart_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::new(
            StatusCode::PAYLOAD_TOO_LARGE,
            "payload_too_large",
            "Upload is too large. Please send fewer or smaller photos.",
        )
    } else {
        ApiError::bad_request(format!("Invalid multipart body: {}", err.body_text()))
    }
}

/// Run one diagnostic round
pub async fn analyze(
    Extension(service): Extension<Arc<HomeRepairService>>,
    store: Option<Extension<Store>>,
    mut multipart: Multipart,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let mut metadata: Option<AnalyzeMetadata> = None;
    let mut uploads = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(multipart_error)?
    {
        match field.name().unwrap_or_default() {
            "metadata" => {
                let text = field
                    .text()
                    .await
                    .map_err(multipart_error)?;
                let parsed = serde_json::from_str(&text)
                    .map_err(|e| ApiError::bad_request(format!("Invalid metadata JSON: {}", e)))?;
                metadata = Some(parsed);
            }
            "images" | "images[]" | "image" => {
                // Reject the extra file before reading its bytes
                service.check_upload_count(uploads.len() + 1)?;
                let content_type = field.content_type().unwrap_or_default().to_string();
                let file_name = field.file_name().map(str::to_string);
                let data = field
                    .bytes()
                    .await
                    .map_err(multipart_error)?;
                let mut upload = ImageUpload::new(data.to_vec(), content_type);
                if let Some(name) = file_name {
                    upload = upload.with_file_name(name);
                }
                uploads.push(upload);
            }
            _ => {}
        }
    }

    let metadata = metadata.ok_or_else(|| ApiError::bad_request("metadata field is required"))?;
    let AnalyzeMetadata { request, user_id } = metadata;
    let description = request.description.clone();

    let result = service.diagnose(uploads, request).await?;

    // Questions-only rounds are not worth keeping
    let analysis_id = match store {
        Some(Extension(store)) if !result.needs_more_info => {
            match store
                .save_analysis(user_id.as_deref(), &description, &result)
                .await
            {
                Ok(id) => {
                    info!(analysis_id = %id, "Analysis saved");
                    Some(id)
                }
                Err(e) => {
                    warn!(error = %e, "Failed to save analysis");
                    None
                }
            }
        }
        _ => None,
    };

    Ok(Json(AnalyzeResponse {
        success: true,
        data: result,
        analysis_id,
    }))
}
