//! Saved home profiles and analyses
//!
//! All routes answer 503 `persistence_disabled` when the server runs
//! without a database.

use super::error::ApiError;
use super::ApiResponse;
use axum::{
    extract::{Extension, Path, Query},
    response::Json,
};
use homefix_core::HomeProfile;
use homefix_store::{SavedAnalysis, Store, StoredProfile};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const DEFAULT_LIST_LIMIT: u32 = 20;
const MAX_LIST_LIMIT: u32 = 100;

fn require_store(store: Option<Extension<Store>>) -> Result<Store, ApiError> {
    store
        .map(|Extension(store)| store)
        .ok_or_else(ApiError::persistence_disabled)
}

/// Deletion outcome
#[derive(Debug, Serialize)]
pub struct Deleted {
    pub deleted: bool,
}

pub async fn get_profile(
    Path(user_id): Path<String>,
    store: Option<Extension<Store>>,
) -> Result<Json<ApiResponse<StoredProfile>>, ApiError> {
    let store = require_store(store)?;
    let profile = store
        .get_profile(&user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Profile not found"))?;
    Ok(Json(ApiResponse::success(profile)))
}

pub async fn put_profile(
    Path(user_id): Path<String>,
    store: Option<Extension<Store>>,
    Json(profile): Json<HomeProfile>,
) -> Result<Json<ApiResponse<StoredProfile>>, ApiError> {
    let store = require_store(store)?;
    if user_id.trim().is_empty() {
        return Err(ApiError::bad_request("user id is required"));
    }
    let stored = store.upsert_profile(&user_id, &profile).await?;
    Ok(Json(ApiResponse::success(stored)))
}

pub async fn delete_profile(
    Path(user_id): Path<String>,
    store: Option<Extension<Store>>,
) -> Result<Json<ApiResponse<Deleted>>, ApiError> {
    let store = require_store(store)?;
    let deleted = store.delete_profile(&user_id).await?;
    Ok(Json(ApiResponse::success(Deleted { deleted })))
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    limit: Option<u32>,
}

pub async fn list_analyses(
    Path(user_id): Path<String>,
    Query(query): Query<ListQuery>,
    store: Option<Extension<Store>>,
) -> Result<Json<ApiResponse<Vec<SavedAnalysis>>>, ApiError> {
    let store = require_store(store)?;
    let limit = query
        .limit
        .unwrap_or(DEFAULT_LIST_LIMIT)
        .clamp(1, MAX_LIST_LIMIT);
    let analyses = store.list_analyses(&user_id, limit).await?;
    Ok(Json(ApiResponse::success(analyses)))
}

pub async fn get_analysis(
    Path(id): Path<String>,
    store: Option<Extension<Store>>,
) -> Result<Json<ApiResponse<SavedAnalysis>>, ApiError> {
    let store = require_store(store)?;
    let id = Uuid::parse_str(&id).map_err(|_| ApiError::bad_request("Invalid analysis id"))?;
    let analysis = store
        .get_analysis(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Analysis not found"))?;
    Ok(Json(ApiResponse::success(analysis)))
}

pub async fn delete_analysis(
    Path(id): Path<String>,
    store: Option<Extension<Store>>,
) -> Result<Json<ApiResponse<Deleted>>, ApiError> {
    let store = require_store(store)?;
    let id = Uuid::parse_str(&id).map_err(|_| ApiError::bad_request("Invalid analysis id"))?;
    let deleted = store.delete_analysis(id).await?;
    Ok(Json(ApiResponse::success(Deleted { deleted })))
}
