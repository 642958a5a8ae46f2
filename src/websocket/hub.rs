//! WebSocket Connection Hub
//!
//! Tracks live inspector connections and fans new entries out to all of
//! them. Every connection sees every entry; filtering happens per
//! connection in the handler.

use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, RwLock};
use uuid::Uuid;

use super::messages::{ServerMessage, WsEvent};
use crate::config::WebsocketConfig;

/// Unique identifier for a WebSocket connection
pub type ConnectionId = String;

/// Manages all WebSocket connections
pub struct ConnectionHub {
    /// Active connections: ConnectionId → sender
    connections: Arc<RwLock<HashMap<ConnectionId, mpsc::UnboundedSender<ServerMessage>>>>,
    /// Broadcast channel for in-process listeners
    broadcast_tx: broadcast::Sender<WsEvent>,
    config: HubConfig,
}

/// Configuration for the connection hub
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Maximum number of concurrent connections
    pub max_connections: usize,
    /// Capacity of the broadcast channel
    pub broadcast_capacity: usize,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            max_connections: 1000,
            broadcast_capacity: 1024,
        }
    }
}

impl From<&WebsocketConfig> for HubConfig {
    fn from(config: &WebsocketConfig) -> Self {
        Self {
            max_connections: config.max_connections,
            broadcast_capacity: config.broadcast_capacity.max(1),
        }
    }
}

impl ConnectionHub {
    pub fn new(config: HubConfig) -> Self {
        let (broadcast_tx, _) = broadcast::channel(config.broadcast_capacity);

        Self {
            connections: Arc::new(RwLock::new(HashMap::new())),
            broadcast_tx,
            config,
        }
    }

    /// Register a new WebSocket connection
    ///
    /// Returns the connection ID on success, or an error if the connection
    /// limit has been reached.
    pub async fn register(
        &self,
        sender: mpsc::UnboundedSender<ServerMessage>,
    ) -> Result<ConnectionId, HubError> {
        let mut connections = self.connections.write().await;
        if connections.len() >= self.config.max_connections {
            return Err(HubError::TooManyConnections(self.config.max_connections));
        }

        let id = Uuid::new_v4().to_string();
        connections.insert(id.clone(), sender);

        tracing::info!(connection_id = %id, "WebSocket connected");
        Ok(id)
    }

    pub async fn unregister(&self, id: &str) {
        self.connections.write().await.remove(id);
        tracing::info!(connection_id = %id, "WebSocket disconnected");
    }

    /// Deliver an event to every connection and in-process listener.
    ///
    /// Returns the number of connections the message was queued for.
    pub async fn publish(&self, event: WsEvent) -> usize {
        let connections = self.connections.read().await;

        let mut sent_count = 0;
        for sender in connections.values() {
            if sender.send(event.message.clone()).is_ok() {
                sent_count += 1;
            }
        }

        if sent_count > 0 {
            tracing::trace!(connections = sent_count, "Broadcast event");
        }

        // No listeners is fine
        let _ = self.broadcast_tx.send(event);
        sent_count
    }

    /// Send a message directly to a specific connection
    pub async fn send_to(&self, id: &str, message: ServerMessage) -> Result<(), HubError> {
        let connections = self.connections.read().await;
        let sender = connections.get(id).ok_or(HubError::ConnectionNotFound)?;

        sender.send(message).map_err(|_| HubError::SendFailed)
    }

    /// Receive every published event in-process
    pub fn subscribe_broadcast(&self) -> broadcast::Receiver<WsEvent> {
        self.broadcast_tx.subscribe()
    }

    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }
}

/// Errors that can occur in the connection hub
#[derive(Debug, Error)]
pub enum HubError {
    #[error("Too many connections (limit: {0})")]
    TooManyConnections(usize),

    #[error("Connection not found")]
    ConnectionNotFound,

    #[error("Failed to send message")]
    SendFailed,
}
