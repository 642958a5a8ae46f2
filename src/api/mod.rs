//! Hookscope HTTP Surface
//!
//! Webhook capture plus the inspector API, built with Axum.
//!
//! # Endpoints
//!
//! ## Capture
//! - `ANY /*` - Any request not matched below is recorded as an entry
//!
//! ## Search
//! - `POST /api/v1/search` - Evaluate a filter
//! - `POST /api/v1/jsonpath` - Evaluate a JSONPath expression
//!
//! ## Entries
//! - `GET /api/v1/entries` - Page through entries
//! - `GET /api/v1/entries/:id` - Get an entry
//!
//! ## Stats
//! - `GET /api/v1/stats` - Index, cache and traffic statistics
//!
//! ## Health
//! - `GET /health/live` - Liveness probe
//! - `GET /health/ready` - Readiness probe
//! - `GET /health` - Full health status
//!
//! ## WebSocket
//! - `GET /ws` - Live entry feed with per-connection filtering
//!
//! # Example
//!
//! ```rust,ignore
//! use hookscope::api::{serve, AppState};
//! use hookscope::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let state = AppState::new(Config::default());
//!     serve(state).await?;
//!     Ok(())
//! }
//! ```

pub mod dto;
pub mod error;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use state::AppState;

use axum::{
    extract::DefaultBodyLimit,
    http::Uri,
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::websocket::websocket_handler;

/// Build the router with all routes and middleware
pub fn build_router(state: AppState) -> Router {
    let max_body_size = state.config.server.max_body_size;

    let api_routes = Router::new()
        .route("/search", post(routes::search::search))
        .route("/jsonpath", post(routes::jsonpath::evaluate))
        .route("/entries", get(routes::entries::list_entries))
        .route("/entries/:id", get(routes::entries::get_entry))
        .route("/stats", get(routes::stats::get_stats))
        // Unknown API paths are errors, not webhooks
        .fallback(api_not_found);

    let health_routes = Router::new()
        .route("/live", get(routes::health::liveness))
        .route("/ready", get(routes::health::readiness))
        .route("/", get(routes::health::full_health));

    let shared_state = Arc::new(state);

    Router::new()
        .nest("/api/v1", api_routes)
        .nest("/health", health_routes)
        .route("/ws", get(websocket_handler))
        .fallback(routes::webhook::capture)
        .layer(DefaultBodyLimit::max(max_body_size))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(shared_state)
}

async fn api_not_found(uri: Uri) -> ApiError {
    ApiError::NotFound(format!("no API route for {}", uri.path()))
}

/// Start the server
pub async fn serve(state: AppState) -> Result<(), ApiError> {
    let addr = state.config.server.addr();
    let router = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Hookscope listening on {}", addr);

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .map_err(|e| ApiError::Internal(format!("Server error: {}", e)))?;

    tracing::info!("Hookscope shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::websocket::{ConnectionHub, ServerMessage};
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        response::Response,
    };
    use serde_json::{json, Value};
    use tower::util::ServiceExt;

    fn create_test_app() -> (Router, Arc<ConnectionHub>) {
        let state = AppState::new(Config::default());
        let hub = Arc::clone(&state.ws_hub);
        (build_router(state), hub)
    }

    async fn send(app: &Router, request: Request<Body>) -> Response {
        app.clone().oneshot(request).await.unwrap()
    }

    async fn get(app: &Router, uri: &str) -> Response {
        send(app, Request::builder().uri(uri).body(Body::empty()).unwrap()).await
    }

    async fn post_json(app: &Router, uri: &str, body: Value) -> Response {
        send(
            app,
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("Content-Type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    async fn json_body(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn seed(app: &Router) {
        post_json(app, "/hooks/stripe", json!({"type": "invoice.paid", "amount": 1200})).await;
        post_json(app, "/hooks/github", json!({"action": "opened"})).await;
        get(app, "/ping/uptime").await;
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _) = create_test_app();

        assert_eq!(get(&app, "/health/live").await.status(), StatusCode::OK);
        assert_eq!(get(&app, "/health/ready").await.status(), StatusCode::OK);

        let response = get(&app, "/health").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["status"], "healthy");
    }

    #[tokio::test]
    async fn test_capture_assigns_ids_and_stores_entry() {
        let (app, _) = create_test_app();

        let response = post_json(&app, "/hooks/stripe", json!({"id": "evt_1"})).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["id"], 0);

        let response = get(&app, "/anything/else?x=1").await;
        assert_eq!(json_body(response).await["id"], 1);

        let entry = json_body(get(&app, "/api/v1/entries/0").await).await;
        assert_eq!(entry["id"], 0);
        assert_eq!(entry["method"], "POST");
        assert_eq!(entry["path"], "/hooks/stripe");
        assert_eq!(entry["payload"], json!({"id": "evt_1"}));

        let entry = json_body(get(&app, "/api/v1/entries/1").await).await;
        assert_eq!(entry["path"], "/anything/else");
    }

    #[tokio::test]
    async fn test_capture_publishes_to_hub() {
        let (app, hub) = create_test_app();
        let mut listener = hub.subscribe_broadcast();

        post_json(&app, "/hook", json!({})).await;

        let event = listener.try_recv().unwrap();
        assert!(matches!(event.message, ServerMessage::Entry { id: 0, .. }));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_captures_publish_in_id_order() {
        let (app, hub) = create_test_app();
        let mut listener = hub.subscribe_broadcast();

        let requests: Vec<_> = (0..32)
            .map(|i| {
                let app = app.clone();
                tokio::spawn(async move {
                    post_json(&app, &format!("/hooks/{}", i), json!({"n": i})).await
                })
            })
            .collect();
        for request in requests {
            assert_eq!(request.await.unwrap().status(), StatusCode::OK);
        }

        let mut published = Vec::new();
        while let Ok(event) = listener.try_recv() {
            if let ServerMessage::Entry { id, .. } = event.message {
                published.push(id);
            }
        }
        assert_eq!(published, (0..32).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_unknown_api_route_not_captured() {
        let (app, _) = create_test_app();

        let response = get(&app, "/api/v1/nope").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let listing = json_body(get(&app, "/api/v1/entries").await).await;
        assert_eq!(listing["total"], 0);
    }

    #[tokio::test]
    async fn test_missing_entry() {
        let (app, _) = create_test_app();
        let response = get(&app, "/api/v1/entries/42").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_search() {
        let (app, _) = create_test_app();
        seed(&app).await;

        let body = json_body(post_json(&app, "/api/v1/search", json!({"method": "post"})).await).await;
        assert_eq!(body["ids"], json!([0, 1]));
        assert_eq!(body["visible_count"], 2);
        assert_eq!(body["total"], 3);
        assert!(body.get("entries").is_none());

        let body = json_body(
            post_json(
                &app,
                "/api/v1/search",
                json!({"path": "hooks", "jsonPath": "$.amount", "include_entries": true}),
            )
            .await,
        )
        .await;
        assert_eq!(body["ids"], json!([0]));
        assert_eq!(body["entries"][0]["path"], "/hooks/stripe");

        let body = json_body(post_json(&app, "/api/v1/search", json!({})).await).await;
        assert_eq!(body["visible_count"], 3);
    }

    #[tokio::test]
    async fn test_search_invalid_json() {
        let (app, _) = create_test_app();

        let response = send(
            &app,
            Request::builder()
                .method("POST")
                .uri("/api/v1/search")
                .header("Content-Type", "application/json")
                .body(Body::from("not json"))
                .unwrap(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_jsonpath() {
        let (app, _) = create_test_app();
        seed(&app).await;

        let body = json_body(
            post_json(&app, "/api/v1/jsonpath", json!({"expression": "$.a.b", "value": {"a": {"b": [1]}}}))
                .await,
        )
        .await;
        assert_eq!(body["result"], json!([1]));
        assert_eq!(body["truthy"], true);

        let body = json_body(
            post_json(&app, "/api/v1/jsonpath", json!({"expression": "$.action", "entry_id": 1})).await,
        )
        .await;
        assert_eq!(body["result"], "opened");

        let response = post_json(&app, "/api/v1/jsonpath", json!({"expression": "$.x"})).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_stats() {
        let (app, _) = create_test_app();
        seed(&app).await;
        post_json(&app, "/api/v1/search", json!({"method": "GET"})).await;
        post_json(&app, "/api/v1/search", json!({"method": "get"})).await;

        let body = json_body(get(&app, "/api/v1/stats").await).await;
        assert_eq!(body["entries"], 3);
        assert_eq!(body["evaluations"], 1);
        assert_eq!(body["result_cache_hits"], 1);
        assert_eq!(body["traffic"]["method_counts"]["POST"], 2);
        assert_eq!(body["websocket_connections"], 0);
    }

    #[tokio::test]
    async fn test_entries_pagination() {
        let (app, _) = create_test_app();
        seed(&app).await;

        let body = json_body(get(&app, "/api/v1/entries?offset=1&limit=1").await).await;
        assert_eq!(body["total"], 3);
        assert_eq!(body["entries"].as_array().unwrap().len(), 1);
        assert_eq!(body["entries"][0]["id"], 1);

        let response = get(&app, "/api/v1/entries?limit=5000").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
