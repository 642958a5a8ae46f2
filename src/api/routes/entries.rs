//! Entry Routes
//!
//! - GET /api/v1/entries - Page through captured entries in arrival order
//! - GET /api/v1/entries/:id - Fetch one entry

use axum::{
    extract::{Path, Query, State},
    Json,
};
use std::sync::Arc;

use crate::api::dto::{EntriesQuery, EntriesResponse, EntryDto, MAX_PAGE_SIZE};
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::search::EntryId;

/// GET /api/v1/entries?offset=0&limit=100
pub async fn list_entries(
    State(state): State<Arc<AppState>>,
    Query(query): Query<EntriesQuery>,
) -> ApiResult<Json<EntriesResponse>> {
    if query.limit > MAX_PAGE_SIZE {
        return Err(ApiError::Validation(format!(
            "limit exceeds maximum of {}",
            MAX_PAGE_SIZE
        )));
    }

    let engine = state.engine.lock().await;
    let entries = engine
        .entries()
        .iter()
        .enumerate()
        .skip(query.offset)
        .take(query.limit)
        .map(|(id, entry)| EntryDto::new(id, entry.clone()))
        .collect();

    Ok(Json(EntriesResponse {
        total: engine.len(),
        offset: query.offset,
        entries,
    }))
}

/// GET /api/v1/entries/:id
pub async fn get_entry(
    State(state): State<Arc<AppState>>,
    Path(id): Path<EntryId>,
) -> ApiResult<Json<EntryDto>> {
    let engine = state.engine.lock().await;
    let entry = engine
        .entry(id)
        .ok_or_else(|| ApiError::NotFound(format!("entry {}", id)))?;

    Ok(Json(EntryDto::new(id, entry.clone())))
}
