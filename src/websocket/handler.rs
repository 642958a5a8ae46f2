//! WebSocket Handler
//!
//! Handles WebSocket upgrade requests and manages the connection lifecycle.
//!
//! Each connection runs four tasks: one forwarding outbound messages to
//! the socket, one reading client messages, one tracking the connection's
//! current filter, and one debounce loop that evaluates that filter after
//! the input has gone quiet. Newly captured entries re-signal the current
//! filter, so a client's match set follows the store.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, Mutex};

use super::hub::ConnectionHub;
use super::messages::{ClientMessage, ServerMessage, WsEvent};
use crate::api::AppState;
use crate::search::{self, FilterSpec, SearchEngine};

/// WebSocket upgrade handler
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Evaluate a filter and package the result for a client
pub async fn evaluate_filter(engine: &Mutex<SearchEngine>, spec: &FilterSpec) -> ServerMessage {
    let mut engine = engine.lock().await;
    let matches = engine.apply_filters(spec);

    ServerMessage::Matches {
        ids: matches.iter().copied().collect(),
        visible_count: matches.len(),
        total: engine.len(),
    }
}

/// Feed a connection's debouncer.
///
/// Client filter changes are forwarded as they arrive and remembered. Every
/// entry published after a filter has been set re-signals that filter, so a
/// burst of captures coalesces into one evaluation. Returns when the client
/// side closes.
pub async fn track_filter(
    mut client_filters: mpsc::UnboundedReceiver<FilterSpec>,
    mut events: broadcast::Receiver<WsEvent>,
    debounce_tx: mpsc::UnboundedSender<FilterSpec>,
) {
    let mut current: Option<FilterSpec> = None;
    let mut events_open = true;

    loop {
        let signal = tokio::select! {
            received = client_filters.recv() => match received {
                Some(spec) => {
                    current = Some(spec.clone());
                    Some(spec)
                }
                None => break,
            },
            event = events.recv(), if events_open => match event {
                Ok(event) if matches!(event.message, ServerMessage::Entry { .. }) => current.clone(),
                Ok(_) => None,
                // Missed entries still changed the store
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "Filter tracker lagged behind entry feed");
                    current.clone()
                }
                Err(broadcast::error::RecvError::Closed) => {
                    events_open = false;
                    None
                }
            },
        };

        if let Some(spec) = signal {
            if debounce_tx.send(spec).is_err() {
                break;
            }
        }
    }
}

/// Handle an established WebSocket connection
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let hub = Arc::clone(&state.ws_hub);
    let (mut sender, mut receiver) = socket.split();

    // Create channel for sending messages to this connection
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();

    let connection_id = match hub.register(tx.clone()).await {
        Ok(id) => id,
        Err(e) => {
            tracing::error!(error = %e, "Failed to register WebSocket connection");
            let error_msg = ServerMessage::Error {
                message: e.to_string(),
            };
            if let Ok(text) = serde_json::to_string(&error_msg) {
                let _ = sender.send(Message::Text(text)).await;
            }
            return;
        }
    };

    // Queued ahead of anything the hub publishes to this connection
    let _ = tx.send(ServerMessage::Connected {
        connection_id: connection_id.clone(),
    });

    let conn_id_for_send = connection_id.clone();

    // Task to forward messages from channel to WebSocket
    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            match serde_json::to_string(&msg) {
                Ok(text) => {
                    if sender.send(Message::Text(text)).await.is_err() {
                        tracing::debug!(
                            connection_id = %conn_id_for_send,
                            "WebSocket send failed, closing connection"
                        );
                        break;
                    }
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to serialize message");
                }
            }
        }
    });

    // Debounced filter evaluation, re-signalled by new entries
    let (filter_tx, filter_rx) = mpsc::unbounded_channel::<FilterSpec>();
    let (debounce_tx, debounce_rx) = mpsc::unbounded_channel::<FilterSpec>();
    let tracker_task = tokio::spawn(track_filter(
        filter_rx,
        hub.subscribe_broadcast(),
        debounce_tx,
    ));

    let engine = Arc::clone(&state.engine);
    let matches_tx = tx;
    let debounce_task = tokio::spawn(search::run_debounced(
        debounce_rx,
        state.config.search.debounce_window(),
        move |spec: FilterSpec| {
            let engine = Arc::clone(&engine);
            let matches_tx = matches_tx.clone();
            async move {
                let message = evaluate_filter(&engine, &spec).await;
                let _ = matches_tx.send(message);
            }
        },
    ));

    let hub_for_recv = Arc::clone(&hub);
    let conn_id_for_recv = connection_id.clone();

    // Task to receive messages from WebSocket and handle them
    let mut recv_task = tokio::spawn(async move {
        while let Some(result) = receiver.next().await {
            match result {
                Ok(msg) => {
                    if !handle_ws_message(&hub_for_recv, &conn_id_for_recv, &filter_tx, msg).await {
                        break;
                    }
                }
                Err(e) => {
                    tracing::debug!(
                        connection_id = %conn_id_for_recv,
                        error = %e,
                        "WebSocket receive error"
                    );
                    break;
                }
            }
        }
    });

    // Wait for either task to complete
    tokio::select! {
        _ = &mut send_task => {
            recv_task.abort();
        }
        _ = &mut recv_task => {
            send_task.abort();
        }
    }

    tracker_task.abort();
    debounce_task.abort();
    hub.unregister(&connection_id).await;
}

/// Handle a received WebSocket message
///
/// Returns false if the connection should be closed.
async fn handle_ws_message(
    hub: &ConnectionHub,
    connection_id: &str,
    filters: &mpsc::UnboundedSender<FilterSpec>,
    message: Message,
) -> bool {
    match message {
        Message::Text(text) => {
            match serde_json::from_str::<ClientMessage>(&text) {
                Ok(client_msg) => {
                    handle_client_message(hub, connection_id, filters, client_msg).await;
                }
                Err(e) => {
                    tracing::debug!(
                        connection_id = %connection_id,
                        error = %e,
                        "Invalid client message"
                    );
                    // Keep the connection open
                    let error_msg = ServerMessage::Error {
                        message: format!("Invalid message format: {}", e),
                    };
                    let _ = hub.send_to(connection_id, error_msg).await;
                }
            }
            true
        }
        Message::Binary(_) => {
            let error_msg = ServerMessage::Error {
                message: "Binary messages not supported".to_string(),
            };
            let _ = hub.send_to(connection_id, error_msg).await;
            true
        }
        // Axum answers pings itself
        Message::Ping(_) | Message::Pong(_) => true,
        Message::Close(_) => {
            tracing::debug!(connection_id = %connection_id, "Client requested close");
            false
        }
    }
}

/// Handle a parsed client message
async fn handle_client_message(
    hub: &ConnectionHub,
    connection_id: &str,
    filters: &mpsc::UnboundedSender<FilterSpec>,
    message: ClientMessage,
) {
    match message {
        ClientMessage::Filter { filter } => {
            tracing::trace!(connection_id = %connection_id, "Filter changed");
            let _ = filters.send(filter);
        }
        ClientMessage::ClearFilter => {
            let _ = filters.send(FilterSpec::new());
        }
        ClientMessage::Ping => {
            let _ = hub.send_to(connection_id, ServerMessage::Pong).await;
        }
    }
}
