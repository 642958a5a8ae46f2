//! Search Routes
//!
//! - POST /api/v1/search - Evaluate a filter over captured entries

use axum::{extract::State, Json};
use std::sync::Arc;
use std::time::Instant;

use crate::api::dto::{EntryDto, SearchMeta, SearchRequest, SearchResponse, MAX_PAGE_SIZE};
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;

/// POST /api/v1/search
///
/// Body is a filter (`searchText`, `method`, `path`, `ip`, `timeFrom`,
/// `timeTo`, `jsonPath`); every field is optional and an empty body
/// matches everything.
pub async fn search(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SearchRequest>,
) -> ApiResult<Json<SearchResponse>> {
    let limit = req.limit.unwrap_or(MAX_PAGE_SIZE);
    if limit > MAX_PAGE_SIZE {
        return Err(ApiError::Validation(format!(
            "limit exceeds maximum of {}",
            MAX_PAGE_SIZE
        )));
    }

    let start = Instant::now();
    let mut engine = state.engine.lock().await;
    let matches = engine.apply_filters(&req.filter);

    let entries: Option<Vec<EntryDto>> = req.include_entries.then(|| {
        matches
            .iter()
            .take(limit)
            .filter_map(|id| engine.entry(*id).map(|e| EntryDto::new(*id, e.clone())))
            .collect()
    });
    let total = engine.len();
    drop(engine);

    Ok(Json(SearchResponse {
        ids: matches.iter().copied().collect(),
        visible_count: matches.len(),
        total,
        entries,
        meta: SearchMeta {
            execution_time_us: start.elapsed().as_micros() as u64,
        },
    }))
}
