//! Stats Routes
//!
//! - GET /api/v1/stats - Index, cache and traffic statistics

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::api::dto::StatsResponse;
use crate::api::state::AppState;

/// GET /api/v1/stats
pub async fn get_stats(State(state): State<Arc<AppState>>) -> Json<StatsResponse> {
    let engine = state.engine.lock().await.stats();

    Json(StatsResponse {
        engine,
        websocket_connections: state.ws_connection_count().await,
        uptime_seconds: state.uptime_seconds(),
    })
}
