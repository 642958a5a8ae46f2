//! Search Engine - owns the entry store, indexes and caches
//!
//! One [`SearchEngine`] is an independent, process-scoped instance; there is
//! no shared global state, so tests can run many side by side.
//!
//! # Data Flow
//!
//! ```text
//! submit_entry → EntryStore (assigns ID) → Tokenizer → InvertedIndex
//!                                                    → TrafficStats
//!
//! apply_filters → ResultCache hit? ── yes ──→ cached MatchSet
//!                        │ no
//!                        ↓
//!                 QueryEvaluator (+ JsonPathEvaluator) → ResultCache
//! ```
//!
//! The engine is not internally synchronized: ingestion and evaluation take
//! `&mut self` and therefore never interleave. Callers sharing an engine
//! across tasks wrap it in a single lock.

use crate::search::cache::FifoCache;
use crate::search::entry::{Entry, EntryId, EntryStore};
use crate::search::executor::QueryEvaluator;
use crate::search::filter::FilterSpec;
use crate::search::index::{IndexStats, InvertedIndex};
use crate::search::jsonpath::{JsonPathEvaluator, DEFAULT_JSONPATH_CACHE_CAPACITY};
use crate::search::stats::{TrafficSnapshot, TrafficStats, DEFAULT_TIMELINE_CAPACITY};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Matching entry IDs, shared with the result cache
pub type MatchSet = Arc<BTreeSet<EntryId>>;

/// Default number of memoized filter results
pub const DEFAULT_RESULT_CACHE_CAPACITY: usize = 100;

/// Engine sizing
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Capacity of the JSONPath evaluation cache
    pub jsonpath_cache_capacity: usize,
    /// Capacity of the filter result cache
    pub result_cache_capacity: usize,
    /// Number of points kept on the traffic timeline
    pub timeline_capacity: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            jsonpath_cache_capacity: DEFAULT_JSONPATH_CACHE_CAPACITY,
            result_cache_capacity: DEFAULT_RESULT_CACHE_CAPACITY,
            timeline_capacity: DEFAULT_TIMELINE_CAPACITY,
        }
    }
}

/// Point-in-time engine statistics
#[derive(Debug, Clone, Serialize)]
pub struct EngineStats {
    pub entries: usize,
    pub index: IndexStats,
    pub result_cache_entries: usize,
    pub jsonpath_cache_entries: usize,
    pub evaluations: u64,
    pub result_cache_hits: u64,
    pub jsonpath_cache_hits: u64,
    pub traffic: TrafficSnapshot,
}

/// In-memory multi-field search engine over captured webhook entries
#[derive(Debug)]
pub struct SearchEngine {
    store: EntryStore,
    index: InvertedIndex,
    json_path: JsonPathEvaluator,
    results: FifoCache<String, MatchSet>,
    traffic: TrafficStats,
    evaluations: u64,
    result_cache_hits: u64,
}

impl Default for SearchEngine {
    fn default() -> Self {
        Self::new(SearchConfig::default())
    }
}

impl SearchEngine {
    pub fn new(config: SearchConfig) -> Self {
        Self {
            store: EntryStore::new(),
            index: InvertedIndex::new(),
            json_path: JsonPathEvaluator::new(config.jsonpath_cache_capacity),
            results: FifoCache::new(config.result_cache_capacity),
            traffic: TrafficStats::new(config.timeline_capacity),
            evaluations: 0,
            result_cache_hits: 0,
        }
    }

    // ==================== Ingestion ====================

    /// Store and index an entry, returning its ID.
    ///
    /// Each entry is indexed exactly once, here. Cached filter results are
    /// dropped since they were computed over fewer entries.
    pub fn submit_entry(&mut self, entry: Entry) -> EntryId {
        let id = self.store.push(entry);
        let entry = &self.store.as_slice()[id];

        self.index.index_entry(id, entry);
        self.traffic.record(entry);
        self.results.clear();

        tracing::debug!(
            entry_id = id,
            method = %entry.method,
            path = %entry.path,
            client_ip = %entry.client_ip,
            "Indexed entry"
        );

        id
    }

    /// Store and index an entry given as an arbitrary JSON message
    pub fn submit_raw(&mut self, message: &Value) -> EntryId {
        self.submit_entry(Entry::from_value(message))
    }

    // ==================== Reads ====================

    /// All entries, indexed by ID
    pub fn entries(&self) -> &[Entry] {
        self.store.as_slice()
    }

    pub fn entry(&self, id: EntryId) -> Option<&Entry> {
        self.store.get(id)
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn index(&self) -> &InvertedIndex {
        &self.index
    }

    // ==================== Queries ====================

    /// Evaluate a filter, answering from the result cache when possible.
    ///
    /// A cache hit returns the same shared set as the original evaluation.
    pub fn apply_filters(&mut self, spec: &FilterSpec) -> MatchSet {
        let key = spec.cache_key();

        if let Some(cached) = self.results.get(&key) {
            self.result_cache_hits += 1;
            tracing::trace!(matches = cached.len(), "Using cached filter result");
            return Arc::clone(cached);
        }

        self.evaluations += 1;
        let matches: MatchSet = Arc::new(
            QueryEvaluator::new(&self.store, &self.index, &mut self.json_path).evaluate(spec),
        );
        self.results.put(key, Arc::clone(&matches));
        matches
    }

    /// Evaluate a restricted JSONPath expression, memoized
    pub fn evaluate_json_path(&mut self, value: &Value, expression: &str) -> Option<Value> {
        self.json_path.evaluate(value, expression)
    }

    /// Number of times the query evaluator actually ran
    pub fn evaluations(&self) -> u64 {
        self.evaluations
    }

    pub fn stats(&self) -> EngineStats {
        EngineStats {
            entries: self.store.len(),
            index: self.index.stats(),
            result_cache_entries: self.results.len(),
            jsonpath_cache_entries: self.json_path.cache_len(),
            evaluations: self.evaluations,
            result_cache_hits: self.result_cache_hits,
            jsonpath_cache_hits: self.json_path.hits(),
            traffic: self.traffic.snapshot(),
        }
    }
}
