//! WebSocket Live Feed
//!
//! Pushes captured webhooks to inspector clients as they arrive and
//! evaluates each client's filter on demand.
//!
//! ## Architecture
//!
//! - **ConnectionHub**: Tracks active connections and fans out new entries
//! - **Handler**: Handles WebSocket upgrade and per-connection filtering
//! - **Messages**: Defines client and server message formats
//!
//! ## Example
//!
//! ```javascript
//! // Browser
//! const ws = new WebSocket('ws://localhost:8080/ws');
//!
//! ws.onopen = () => {
//!   ws.send(JSON.stringify({type: 'filter', filter: {method: 'POST', search: 'invoice'}}));
//! };
//!
//! ws.onmessage = (event) => {
//!   const msg = JSON.parse(event.data);
//!   // msg.type is "entry" for new webhooks, "matches" for filter results
//! };
//! ```

mod handler;
mod hub;
mod messages;

pub use handler::{evaluate_filter, track_filter, websocket_handler};
pub use hub::{ConnectionHub, ConnectionId, HubConfig, HubError};
pub use messages::{ClientMessage, ServerMessage, WsEvent};
