//! Traffic analytics
//!
//! Incrementally maintained at ingestion time alongside the index:
//! per-method counts, running average payload size, and a bounded timeline
//! of recent `(timestamp, method)` points for charting.

use crate::search::entry::Entry;
use crate::search::tokenizer::normalize_method;
use serde::Serialize;
use std::collections::{BTreeMap, VecDeque};

/// Default number of timeline points retained
pub const DEFAULT_TIMELINE_CAPACITY: usize = 500;

/// Methods charted individually; everything else counts as `OTHER`
const TRACKED_METHODS: [&str; 5] = ["GET", "POST", "PUT", "DELETE", "PATCH"];

/// Bucket for untracked methods
pub const OTHER_METHOD: &str = "OTHER";

/// One point on the traffic timeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimelinePoint {
    pub timestamp_ms: i64,
    pub method: String,
}

/// Serializable snapshot of traffic analytics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrafficSnapshot {
    pub total: u64,
    pub method_counts: BTreeMap<String, u64>,
    pub average_payload_bytes: f64,
    pub timeline: Vec<TimelinePoint>,
}

#[derive(Debug)]
pub struct TrafficStats {
    method_counts: BTreeMap<String, u64>,
    total: u64,
    payload_bytes: u64,
    timeline: VecDeque<TimelinePoint>,
    timeline_capacity: usize,
}

impl Default for TrafficStats {
    fn default() -> Self {
        Self::new(DEFAULT_TIMELINE_CAPACITY)
    }
}

impl TrafficStats {
    pub fn new(timeline_capacity: usize) -> Self {
        let method_counts = TRACKED_METHODS
            .iter()
            .chain(std::iter::once(&OTHER_METHOD))
            .map(|m| (m.to_string(), 0))
            .collect();

        Self {
            method_counts,
            total: 0,
            payload_bytes: 0,
            timeline: VecDeque::new(),
            timeline_capacity,
        }
    }

    /// Account for a newly ingested entry
    pub fn record(&mut self, entry: &Entry) {
        let method = normalize_method(&entry.method);
        let bucket = if TRACKED_METHODS.contains(&method.as_str()) {
            method.clone()
        } else {
            OTHER_METHOD.to_string()
        };
        *self.method_counts.entry(bucket).or_insert(0) += 1;

        self.total += 1;
        self.payload_bytes += serde_json::to_string(&entry.payload)
            .map(|s| s.len() as u64)
            .unwrap_or(0);

        if self.timeline_capacity > 0 {
            self.timeline.push_back(TimelinePoint {
                timestamp_ms: entry.timestamp_millis(),
                method,
            });
            while self.timeline.len() > self.timeline_capacity {
                self.timeline.pop_front();
            }
        }
    }

    pub fn count(&self, method: &str) -> u64 {
        self.method_counts.get(method).copied().unwrap_or(0)
    }

    pub fn average_payload_bytes(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.payload_bytes as f64 / self.total as f64
        }
    }

    pub fn snapshot(&self) -> TrafficSnapshot {
        TrafficSnapshot {
            total: self.total,
            method_counts: self.method_counts.clone(),
            average_payload_bytes: self.average_payload_bytes(),
            timeline: self.timeline.iter().cloned().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_method_buckets() {
        let mut stats = TrafficStats::default();
        stats.record(&Entry::new("get", "/", "::1"));
        stats.record(&Entry::new("POST", "/", "::1"));
        stats.record(&Entry::new("OPTIONS", "/", "::1"));
        stats.record(&Entry::new("", "/", "::1"));

        assert_eq!(stats.count("GET"), 1);
        assert_eq!(stats.count("POST"), 1);
        assert_eq!(stats.count("PUT"), 0);
        assert_eq!(stats.count(OTHER_METHOD), 2);
        assert_eq!(stats.snapshot().total, 4);
    }

    #[test]
    fn test_average_payload_size() {
        let mut stats = TrafficStats::default();
        assert_eq!(stats.average_payload_bytes(), 0.0);

        // "null" is 4 bytes, {"a":1} is 7 bytes
        stats.record(&Entry::new("GET", "/", "::1"));
        stats.record(&Entry::new("GET", "/", "::1").payload(json!({"a": 1})));

        assert_eq!(stats.average_payload_bytes(), 5.5);
    }

    #[test]
    fn test_timeline_bounded() {
        let mut stats = TrafficStats::new(2);
        for ms in [10, 20, 30] {
            stats.record(&Entry::new("PUT", "/", "::1").timestamp_ms(ms));
        }

        let snapshot = stats.snapshot();
        let times: Vec<i64> = snapshot.timeline.iter().map(|p| p.timestamp_ms).collect();
        assert_eq!(times, vec![20, 30]);
        assert_eq!(snapshot.timeline[0].method, "PUT");
    }
}
