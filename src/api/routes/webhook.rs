//! Webhook Capture
//!
//! Every request that is not addressed to the API, health or WebSocket
//! routes is recorded as an entry, indexed, and pushed to live clients.

use axum::{
    body::Bytes,
    extract::{ConnectInfo, State},
    http::{HeaderMap, Method, Uri},
    Json,
};
use chrono::Utc;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;

use crate::api::dto::CaptureResponse;
use crate::api::error::ApiResult;
use crate::api::state::AppState;
use crate::search::Entry;
use crate::websocket::WsEvent;

/// Fallback handler: capture the request as a webhook entry
pub async fn capture(
    State(state): State<Arc<AppState>>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<CaptureResponse>> {
    let peer = connect_info.map(|ConnectInfo(addr)| addr);
    let entry = build_entry(&method, &uri, &headers, &body, peer);

    // Published under the engine lock: broadcast order is id order
    let mut engine = state.engine.lock().await;
    let id = engine.submit_entry(entry.clone());

    tracing::info!(
        entry_id = id,
        method = %entry.method,
        path = %entry.path,
        client_ip = %entry.client_ip,
        body_bytes = body.len(),
        "Captured webhook"
    );

    state.ws_hub.publish(WsEvent::entry(id, entry)).await;
    drop(engine);

    Ok(Json(CaptureResponse {
        status: "ok".to_string(),
        id,
    }))
}

/// Turn a raw request into an entry received now
pub fn build_entry(
    method: &Method,
    uri: &Uri,
    headers: &HeaderMap,
    body: &[u8],
    peer: Option<SocketAddr>,
) -> Entry {
    Entry {
        timestamp: Utc::now(),
        client_ip: client_ip(headers, peer),
        method: method.as_str().to_string(),
        path: uri.path().to_string(),
        headers: header_map(headers),
        payload: payload(body),
    }
}

/// First `x-forwarded-for` hop, else the socket peer
fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|hop| !hop.is_empty())
        .map(str::to_string)
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
        .unwrap_or_default()
}

/// Repeated headers are joined with ", "
fn header_map(headers: &HeaderMap) -> BTreeMap<String, String> {
    let mut map: BTreeMap<String, String> = BTreeMap::new();

    for (name, value) in headers {
        let value = match value.to_str() {
            Ok(text) => text.to_string(),
            Err(_) => format!("<binary: {} bytes>", value.len()),
        };

        map.entry(name.as_str().to_string())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(&value);
            })
            .or_insert(value);
    }

    map
}

/// JSON body, or the lossy text wrapped as `anomaly_payload`
fn payload(body: &[u8]) -> Value {
    if body.is_empty() {
        return Value::Null;
    }

    serde_json::from_slice(body)
        .unwrap_or_else(|_| json!({ "anomaly_payload": String::from_utf8_lossy(body) }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn uri(s: &str) -> Uri {
        s.parse().unwrap()
    }

    #[test]
    fn test_json_body() {
        let entry = build_entry(
            &Method::POST,
            &uri("/hooks/github?delivery=1"),
            &HeaderMap::new(),
            br#"{"action": "opened"}"#,
            None,
        );

        assert_eq!(entry.method, "POST");
        assert_eq!(entry.path, "/hooks/github");
        assert_eq!(entry.payload, json!({"action": "opened"}));
        assert_eq!(entry.client_ip, "");
    }

    #[test]
    fn test_non_json_body_wrapped() {
        let entry = build_entry(&Method::PUT, &uri("/x"), &HeaderMap::new(), b"a=1&b=2", None);
        assert_eq!(entry.payload, json!({"anomaly_payload": "a=1&b=2"}));

        let entry = build_entry(&Method::GET, &uri("/x"), &HeaderMap::new(), b"", None);
        assert_eq!(entry.payload, Value::Null);
    }

    #[test]
    fn test_client_ip_prefers_forwarded_for() {
        let peer: SocketAddr = "10.1.1.1:5555".parse().unwrap();
        let mut headers = HeaderMap::new();

        assert_eq!(client_ip(&headers, Some(peer)), "10.1.1.1");

        headers.insert("x-forwarded-for", HeaderValue::from_static(" 203.0.113.9, 10.0.0.1"));
        assert_eq!(client_ip(&headers, Some(peer)), "203.0.113.9");
    }

    #[test]
    fn test_headers_binary_and_repeated() {
        let mut headers = HeaderMap::new();
        headers.append("x-tag", HeaderValue::from_static("a"));
        headers.append("x-tag", HeaderValue::from_static("b"));
        headers.insert("x-raw", HeaderValue::from_bytes(&[0xff, 0xfe, 0x41]).unwrap());

        let map = header_map(&headers);
        assert_eq!(map["x-tag"], "a, b");
        assert_eq!(map["x-raw"], "<binary: 3 bytes>");
    }
}
