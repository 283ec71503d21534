//! Backlog API handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::{
    error::ApiResult,
    extract::{ApiJson, ApiQuery, CurrentOwner},
    AppState,
};
use crate::domain::{BacklogItem, BacklogItemUpdate, Category, ItemFilter, ItemId, NewBacklogItem};

/// Body of `PUT /api/backlog/reorder`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorderRequest {
    pub category: Category,
    pub ordered_ids: Vec<String>,
}

impl ReorderRequest {
    /// Parses every id, failing on the first malformed one
    pub fn parse_ids(&self) -> crate::error::Result<Vec<ItemId>> {
        self.ordered_ids.iter().map(|id| ItemId::from_str(id)).collect()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}

fn parse_id(raw: &str) -> ApiResult<ItemId> {
    Ok(ItemId::from_str(raw)?)
}

/// GET /api/health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        timestamp: Utc::now().to_rfc3339(),
    })
}

/// GET /api/backlog
pub async fn list(
    State(state): State<AppState>,
    CurrentOwner(owner): CurrentOwner,
    ApiQuery(filter): ApiQuery<ItemFilter>,
) -> ApiResult<Json<Vec<BacklogItem>>> {
    let items = state.backlog.list(&owner, &filter).await?;
    Ok(Json(items))
}

/// GET /api/backlog/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    CurrentOwner(owner): CurrentOwner,
    Path(id): Path<String>,
) -> ApiResult<Json<BacklogItem>> {
    let id = parse_id(&id)?;
    let item = state.backlog.get(&owner, &id).await?;
    Ok(Json(item))
}

/// POST /api/backlog
pub async fn create(
    State(state): State<AppState>,
    CurrentOwner(owner): CurrentOwner,
    ApiJson(payload): ApiJson<NewBacklogItem>,
) -> ApiResult<(StatusCode, Json<BacklogItem>)> {
    let item = state.backlog.create(&owner, payload).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// PUT /api/backlog/{id}
pub async fn update(
    State(state): State<AppState>,
    CurrentOwner(owner): CurrentOwner,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<BacklogItemUpdate>,
) -> ApiResult<Json<BacklogItem>> {
    let id = parse_id(&id)?;
    let item = state.backlog.update(&owner, &id, payload).await?;
    Ok(Json(item))
}

/// POST /api/backlog/{id}/complete
pub async fn complete(
    State(state): State<AppState>,
    CurrentOwner(owner): CurrentOwner,
    Path(id): Path<String>,
) -> ApiResult<Json<BacklogItem>> {
    let id = parse_id(&id)?;
    let item = state.backlog.complete(&owner, &id).await?;
    Ok(Json(item))
}

/// POST /api/backlog/{id}/uncomplete
pub async fn uncomplete(
    State(state): State<AppState>,
    CurrentOwner(owner): CurrentOwner,
    Path(id): Path<String>,
) -> ApiResult<Json<BacklogItem>> {
    let id = parse_id(&id)?;
    let item = state.backlog.uncomplete(&owner, &id).await?;
    Ok(Json(item))
}

/// DELETE /api/backlog/{id}
pub async fn delete(
    State(state): State<AppState>,
    CurrentOwner(owner): CurrentOwner,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let id = parse_id(&id)?;
    state.backlog.delete(&owner, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /api/backlog/reorder
///
/// Input is fully validated before the store is touched; unknown or foreign
/// ids are then dropped silently by the engine.
pub async fn reorder(
    State(state): State<AppState>,
    CurrentOwner(owner): CurrentOwner,
    ApiJson(payload): ApiJson<ReorderRequest>,
) -> ApiResult<StatusCode> {
    let ids = payload.parse_ids()?;
    state.backlog.reorder(&owner, payload.category, &ids).await?;
    Ok(StatusCode::NO_CONTENT)
}
