//! Application State
//!
//! Shared state accessible by all API handlers.
//! Wrapped in Arc for thread-safe sharing across async tasks.

use crate::config::Config;
use crate::search::SearchEngine;
use crate::websocket::{ConnectionHub, HubConfig};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;

/// Shared application state for all handlers
#[derive(Clone)]
pub struct AppState {
    /// Search engine; one lock serializes ingestion and evaluation
    pub engine: Arc<Mutex<SearchEngine>>,
    /// Full configuration
    pub config: Arc<Config>,
    /// Server start time for uptime tracking
    pub start_time: Instant,
    /// WebSocket connection hub for the live feed
    pub ws_hub: Arc<ConnectionHub>,
}

impl AppState {
    /// Create state with a fresh engine sized from `config`
    pub fn new(config: Config) -> Self {
        let engine = SearchEngine::new(config.search.engine_config());
        let hub = ConnectionHub::new(HubConfig::from(&config.websocket));

        Self {
            engine: Arc::new(Mutex::new(engine)),
            config: Arc::new(config),
            start_time: Instant::now(),
            ws_hub: Arc::new(hub),
        }
    }

    /// Get server uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Get WebSocket connection count
    pub async fn ws_connection_count(&self) -> usize {
        self.ws_hub.connection_count().await
    }
}
