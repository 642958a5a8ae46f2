//! End-to-end tests through the public API

use chrono::{TimeZone, Utc};
use hookscope::search::{run_debounced, Entry, EntryId, FilterSpec, SearchEngine};
use hookscope::websocket::{evaluate_filter, ServerMessage};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};

fn ids(engine: &mut SearchEngine, spec: &FilterSpec) -> Vec<EntryId> {
    engine.apply_filters(spec).iter().copied().collect()
}

fn captured_messages() -> Vec<serde_json::Value> {
    vec![
        json!({
            "timestamp": "2024-05-01T10:00:00Z",
            "client_ip": "203.0.113.7",
            "method": "POST",
            "path": "/hooks/stripe",
            "headers": {"content-type": "application/json", "stripe-signature": "t=1,v1=abc"},
            "payload": {"type": "invoice.paid", "data": {"object": {"amount_paid": 4200}}}
        }),
        json!({
            "timestamp": "2024-05-01T10:05:00Z",
            "client_ip": "198.51.100.20",
            "method": "POST",
            "path": "/hooks/github",
            "headers": {"x-github-event": "pull_request"},
            "payload": {"action": "opened", "number": 12}
        }),
        json!({
            "timestamp": "2024-05-01T10:10:00Z",
            "client_ip": "203.0.113.7",
            "method": "GET",
            "path": "/health-check",
            "headers": {},
            "payload": null
        }),
        json!({
            "timestamp": "2024-05-01T10:15:00Z",
            "client_ip": "192.0.2.1",
            "method": "PUT",
            "path": "/legacy/form",
            "payload": {"anomaly_payload": "name=alice&plan=pro"}
        }),
    ]
}

fn loaded_engine() -> SearchEngine {
    let mut engine = SearchEngine::default();
    for (expected, message) in captured_messages().iter().enumerate() {
        assert_eq!(engine.submit_raw(message), expected);
    }
    engine
}

#[test]
fn test_two_entry_example() {
    let mut engine = SearchEngine::default();
    engine.submit_entry(Entry::new("GET", "/a/b", "10.0.0.1"));
    engine.submit_entry(Entry::new("POST", "/a/c", "10.0.0.2"));

    assert_eq!(ids(&mut engine, &FilterSpec::new().path("a")), vec![0, 1]);
    assert_eq!(ids(&mut engine, &FilterSpec::new().method("post")), vec![1]);
    assert!(ids(&mut engine, &FilterSpec::new().method("POST").path("b")).is_empty());
}

#[test]
fn test_filters_over_captured_traffic() {
    let mut engine = loaded_engine();

    assert_eq!(ids(&mut engine, &FilterSpec::new().ip("203.0.113")), vec![0, 2]);
    assert_eq!(ids(&mut engine, &FilterSpec::new().search_text("invoice")), vec![0]);
    assert_eq!(ids(&mut engine, &FilterSpec::new().search_text("opened alice")), vec![1, 3]);
    assert_eq!(
        ids(&mut engine, &FilterSpec::new().json_path("$.data.object.amount_paid")),
        vec![0]
    );
    assert_eq!(ids(&mut engine, &FilterSpec::new().json_path("$.anomaly_payload")), vec![3]);

    let from = Utc.with_ymd_and_hms(2024, 5, 1, 10, 5, 0).unwrap();
    let to = Utc.with_ymd_and_hms(2024, 5, 1, 10, 10, 0).unwrap();
    assert_eq!(ids(&mut engine, &FilterSpec::new().time_from(from).time_to(to)), vec![1, 2]);
    assert!(ids(&mut engine, &FilterSpec::new().time_from(to).time_to(from)).is_empty());

    assert_eq!(
        ids(&mut engine, &FilterSpec::new().method("all").search_text("   ")),
        vec![0, 1, 2, 3]
    );
}

#[test]
fn test_filter_from_client_json() {
    let mut engine = loaded_engine();
    let spec: FilterSpec = serde_json::from_value(json!({
        "searchText": "",
        "method": "post",
        "path": "hooks",
        "ip": "",
        "jsonPath": "$.number"
    }))
    .unwrap();

    assert_eq!(ids(&mut engine, &spec), vec![1]);
}

#[test]
fn test_stats_reflect_ingestion() {
    let engine = loaded_engine();
    let stats = engine.stats();

    assert_eq!(stats.entries, 4);
    assert_eq!(stats.index.time_entries, 4);
    assert_eq!(stats.traffic.method_counts["POST"], 2);
    assert_eq!(stats.traffic.method_counts["GET"], 1);
    assert_eq!(stats.traffic.method_counts["PUT"], 1);
}

#[tokio::test(start_paused = true)]
async fn test_debounced_filtering_evaluates_only_last_filter() {
    let engine = Arc::new(Mutex::new(loaded_engine()));
    let (filter_tx, filter_rx) = mpsc::unbounded_channel::<FilterSpec>();
    let (out_tx, mut out_rx) = mpsc::unbounded_channel();

    let fire_engine = Arc::clone(&engine);
    let driver = tokio::spawn(run_debounced(
        filter_rx,
        Duration::from_millis(250),
        move |spec: FilterSpec| {
            let engine = Arc::clone(&fire_engine);
            let out_tx = out_tx.clone();
            async move {
                let _ = out_tx.send(evaluate_filter(&engine, &spec).await);
            }
        },
    ));

    // Typing "hooks" one keystroke at a time
    for prefix in ["h", "ho", "hoo", "hook", "hooks"] {
        filter_tx.send(FilterSpec::new().path(prefix)).unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    tokio::time::sleep(Duration::from_millis(400)).await;

    match out_rx.try_recv().unwrap() {
        ServerMessage::Matches {
            ids,
            visible_count,
            total,
        } => {
            assert_eq!(ids, vec![0, 1]);
            assert_eq!(visible_count, 2);
            assert_eq!(total, 4);
        }
        other => panic!("Expected Matches, got {:?}", other),
    }
    assert!(out_rx.try_recv().is_err());
    assert_eq!(engine.lock().await.evaluations(), 1);

    drop(filter_tx);
    driver.await.unwrap();
}
