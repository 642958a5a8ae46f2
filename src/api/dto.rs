//! Data Transfer Objects
//!
//! Request and response types for the API endpoints.
//! These types are serialized/deserialized to/from JSON.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::search::{EngineStats, Entry, EntryId, FilterSpec};

// ============================================
// CAPTURE DTOs
// ============================================

/// Response to a captured webhook
#[derive(Debug, Serialize, Deserialize)]
pub struct CaptureResponse {
    /// Status: "ok"
    pub status: String,
    /// ID assigned to the captured entry
    pub id: EntryId,
}

// ============================================
// ENTRY DTOs
// ============================================

/// An entry together with its ID
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryDto {
    pub id: EntryId,
    #[serde(flatten)]
    pub entry: Entry,
}

impl EntryDto {
    pub fn new(id: EntryId, entry: Entry) -> Self {
        Self { id, entry }
    }
}

/// Pagination for entry listings
#[derive(Debug, Deserialize)]
pub struct EntriesQuery {
    #[serde(default)]
    pub offset: usize,
    #[serde(default = "default_page_size")]
    pub limit: usize,
}

fn default_page_size() -> usize {
    100
}

/// Upper bound on entries returned by one request
pub const MAX_PAGE_SIZE: usize = 1000;

/// One page of entries
#[derive(Debug, Serialize, Deserialize)]
pub struct EntriesResponse {
    /// Entries stored in total
    pub total: usize,
    pub offset: usize,
    pub entries: Vec<EntryDto>,
}

// ============================================
// SEARCH DTOs
// ============================================

/// Search request: a filter plus output options
#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    #[serde(flatten)]
    pub filter: FilterSpec,
    /// Include matching entries, not just their IDs
    #[serde(default)]
    pub include_entries: bool,
    /// Cap on returned entries (IDs are never truncated)
    #[serde(default)]
    pub limit: Option<usize>,
}

/// Search response
#[derive(Debug, Serialize, Deserialize)]
pub struct SearchResponse {
    /// Matching IDs in ascending order
    pub ids: Vec<EntryId>,
    pub visible_count: usize,
    pub total: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entries: Option<Vec<EntryDto>>,
    pub meta: SearchMeta,
}

/// Search metadata
#[derive(Debug, Serialize, Deserialize)]
pub struct SearchMeta {
    /// Wall time spent under the engine lock, in microseconds
    pub execution_time_us: u64,
}

// ============================================
// JSONPATH DTOs
// ============================================

/// Evaluate an expression against a supplied value or a stored payload
#[derive(Debug, Deserialize)]
pub struct JsonPathRequest {
    pub expression: String,
    #[serde(default)]
    pub value: Option<Value>,
    #[serde(default)]
    pub entry_id: Option<EntryId>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JsonPathResponse {
    /// `null` when the path does not resolve
    pub result: Option<Value>,
    /// Whether the result would pass a JSONPath filter
    pub truthy: bool,
}

// ============================================
// STATS / HEALTH DTOs
// ============================================

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    #[serde(flatten)]
    pub engine: EngineStats,
    pub websocket_connections: usize,
    pub uptime_seconds: u64,
}

/// Full health status
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Overall status: "healthy"
    pub status: String,
    pub entries: usize,
    pub websocket_connections: usize,
    pub uptime_seconds: u64,
    pub version: String,
}
