//! Benchmarks for the Hookscope search engine
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion, Throughput};
use hookscope::search::{Entry, FilterSpec, JsonPathEvaluator, SearchConfig, SearchEngine};
use serde_json::json;

const METHODS: [&str; 5] = ["GET", "POST", "PUT", "DELETE", "PATCH"];

fn create_test_entries(count: usize) -> Vec<Entry> {
    (0..count)
        .map(|i| {
            Entry::new(
                METHODS[i % METHODS.len()],
                format!("/hooks/service{}/events", i % 20),
                format!("10.0.{}.{}", i % 7, i % 250),
            )
            .timestamp_ms(1_700_000_000_000 + i as i64 * 1000)
            .header("content-type", "application/json")
            .payload(json!({
                "event": format!("order.{}", if i % 3 == 0 { "paid" } else { "created" }),
                "order": {"id": i, "amount": (i * 37) % 1000, "currency": "usd"},
            }))
        })
        .collect()
}

fn engine_with(entries: &[Entry]) -> SearchEngine {
    let mut engine = SearchEngine::default();
    for entry in entries {
        engine.submit_entry(entry.clone());
    }
    engine
}

fn bench_ingest(c: &mut Criterion) {
    let mut group = c.benchmark_group("ingest");

    for size in [100, 1000, 10000] {
        let entries = create_test_entries(size);
        group.throughput(Throughput::Elements(size as u64));

        group.bench_function(format!("submit_{}", size), |b| {
            b.iter_batched(
                || entries.clone(),
                |entries| {
                    let mut engine = SearchEngine::default();
                    for entry in entries {
                        engine.submit_entry(entry);
                    }
                    engine
                },
                BatchSize::LargeInput,
            )
        });
    }

    group.finish();
}

fn bench_filters(c: &mut Criterion) {
    let mut group = c.benchmark_group("filters");
    let entries = create_test_entries(10_000);

    let specs = [
        ("method", FilterSpec::new().method("post")),
        ("path_substring", FilterSpec::new().path("service1")),
        ("text", FilterSpec::new().search_text("paid")),
        ("combined", FilterSpec::new().method("GET").ip("10.0.3").search_text("order")),
        ("json_path", FilterSpec::new().method("PUT").json_path("$.order.amount")),
    ];

    for (name, spec) in &specs {
        // Cold: a fresh result cache per iteration
        group.bench_function(format!("cold_{}", name), |b| {
            b.iter_batched(
                || {
                    SearchEngine::new(SearchConfig {
                        result_cache_capacity: 1,
                        ..Default::default()
                    })
                },
                |mut engine| {
                    for entry in &entries[..1000] {
                        engine.submit_entry(entry.clone());
                    }
                    engine.apply_filters(black_box(spec))
                },
                BatchSize::LargeInput,
            )
        });

        let mut engine = engine_with(&entries);
        engine.apply_filters(spec);
        group.bench_function(format!("cached_{}", name), |b| {
            b.iter(|| engine.apply_filters(black_box(spec)))
        });
    }

    group.finish();
}

fn bench_json_path(c: &mut Criterion) {
    let mut group = c.benchmark_group("jsonpath");
    let value = json!({"data": {"object": {"customer": {"id": "cus_123"}}}});

    group.bench_function("evaluate_cached", |b| {
        let mut evaluator = JsonPathEvaluator::new(500);
        b.iter(|| evaluator.evaluate(black_box(&value), "$.data.object.customer.id"))
    });

    group.bench_function("evaluate_uncached", |b| {
        b.iter(|| hookscope::search::evaluate_json_path(black_box(&value), "$.data.object.customer.id"))
    });

    group.finish();
}

criterion_group!(benches, bench_ingest, bench_filters, bench_json_path);
criterion_main!(benches);
