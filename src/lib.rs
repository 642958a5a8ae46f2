//! # Hookscope
//!
//! Webhook inspector: captures incoming HTTP requests and keeps them
//! searchable in memory while they arrive.
//!
//! ## Features
//!
//! - **Incremental indexing**: each entry is tokenized once, on arrival
//! - **Multi-field filters**: method, path, client IP, free text, time range
//!   and JSONPath predicates, intersected
//! - **Memoization**: bounded caches for filter results and JSONPath
//! - **Real-time**: WebSocket feed with debounced per-client filtering
//!
//! ## Modules
//!
//! - [`search`]: Entry store, inverted index and query evaluation
//! - [`api`]: Webhook capture and REST API with Axum
//! - [`websocket`]: Live entry feed
//! - [`config`]: TOML and environment configuration
//!
//! ## Quick Start
//!
//! ```rust
//! use hookscope::search::{Entry, FilterSpec, SearchEngine};
//! use serde_json::json;
//!
//! let mut engine = SearchEngine::default();
//! engine.submit_entry(Entry::new("GET", "/a/b", "10.0.0.1"));
//! engine.submit_entry(
//!     Entry::new("POST", "/a/c", "10.0.0.2").payload(json!({"order": {"id": 7}})),
//! );
//!
//! let posts = engine.apply_filters(&FilterSpec::new().method("post"));
//! assert_eq!(posts.iter().copied().collect::<Vec<_>>(), vec![1]);
//!
//! let with_order = engine.apply_filters(&FilterSpec::new().path("a").json_path("$.order.id"));
//! assert_eq!(with_order.len(), 1);
//! ```

pub mod api;
pub mod config;
pub mod search;
pub mod websocket;

// Re-export top-level types for convenience
pub use search::{
    EngineStats, Entry, EntryId, FilterSpec, MatchSet, SearchConfig, SearchEngine,
};

pub use api::{build_router, serve, ApiError, AppState};

pub use websocket::{ClientMessage, ConnectionHub, HubConfig, HubError, ServerMessage, WsEvent};

pub use config::{Config, ConfigError, LoggingConfig, ServerConfig, WebsocketConfig};
