//! JSONPath Routes
//!
//! - POST /api/v1/jsonpath - Try an expression before using it as a filter

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::api::dto::{JsonPathRequest, JsonPathResponse};
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::search::is_truthy;

/// POST /api/v1/jsonpath
///
/// Evaluates against `value` if given, otherwise against the payload of
/// `entry_id`.
pub async fn evaluate(
    State(state): State<Arc<AppState>>,
    Json(req): Json<JsonPathRequest>,
) -> ApiResult<Json<JsonPathResponse>> {
    let mut engine = state.engine.lock().await;

    let target = match (req.value, req.entry_id) {
        (Some(value), _) => value,
        (None, Some(id)) => engine
            .entry(id)
            .map(|entry| entry.payload.clone())
            .ok_or_else(|| ApiError::NotFound(format!("entry {}", id)))?,
        (None, None) => {
            return Err(ApiError::Validation(
                "either value or entry_id is required".to_string(),
            ))
        }
    };

    let result = engine.evaluate_json_path(&target, &req.expression);
    let truthy = result.as_ref().map(is_truthy).unwrap_or(false);

    Ok(Json(JsonPathResponse { result, truthy }))
}
