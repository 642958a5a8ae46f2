//! WebSocket Message Types
//!
//! Defines all message types for WebSocket communication between
//! inspector clients and the Hookscope server.

use serde::{Deserialize, Serialize};

use crate::search::{Entry, EntryId, FilterSpec};

/// Messages sent from client to server
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Replace this connection's live filter (debounced)
    Filter {
        #[serde(default)]
        filter: FilterSpec,
    },
    /// Drop this connection's filter; every entry matches again
    ClearFilter,
    /// Ping for keepalive
    Ping,
}

/// Messages sent from server to client
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// A new webhook entry was captured
    Entry {
        id: EntryId,
        entry: Entry,
    },
    /// Result of evaluating this connection's filter
    Matches {
        /// Matching IDs in ascending order
        ids: Vec<EntryId>,
        visible_count: usize,
        total: usize,
    },
    /// Pong response to ping
    Pong,
    /// Error message
    Error {
        /// Error description
        message: String,
    },
    /// Connection established
    Connected {
        /// Unique connection identifier
        connection_id: String,
    },
}

/// Internal event fanned out through the hub
#[derive(Debug, Clone)]
pub struct WsEvent {
    pub message: ServerMessage,
}

impl WsEvent {
    /// A newly captured entry
    pub fn entry(id: EntryId, entry: Entry) -> Self {
        Self {
            message: ServerMessage::Entry { id, entry },
        }
    }
}
