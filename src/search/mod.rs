//! Webhook Search Core
//!
//! In-memory, incrementally maintained search over captured webhook
//! entries:
//!
//! - **EntryStore**: append-only entries, ID = arrival position
//! - **InvertedIndex**: method / path segment / IP / free-text postings plus
//!   a time-ordered timeline
//! - **JsonPathEvaluator**: restricted `$.a.b` evaluation with memoization
//! - **QueryEvaluator**: intersects the active filter dimensions
//! - **SearchEngine**: ties it together and memoizes filter results
//! - **Debouncer**: coalesces bursts of filter changes
//!
//! # Architecture
//!
//! ```text
//! Filter: method=POST, path="hooks", jsonPath="$.order.id"
//!        ↓
//! ResultCache: seen this exact filter since the last ingestion? → done
//!        ↓
//! InvertedIndex: method ∩ path → small candidate set
//!        ↓
//! JsonPathEvaluator: keep candidates with a truthy result
//! ```

mod cache;
mod debounce;
mod engine;
mod entry;
mod executor;
mod filter;
mod index;
mod jsonpath;
mod stats;
mod tokenizer;

pub use cache::FifoCache;
pub use debounce::{run as run_debounced, Debouncer, DEFAULT_DEBOUNCE_WINDOW};
pub use engine::{
    EngineStats, MatchSet, SearchConfig, SearchEngine, DEFAULT_RESULT_CACHE_CAPACITY,
};
pub use entry::{Entry, EntryId, EntryStore};
pub use executor::QueryEvaluator;
pub use filter::{Constraint, FilterSpec, ANY_METHOD};
pub use index::{IndexStats, InvertedIndex, TimeEntry};
pub use jsonpath::{
    evaluate as evaluate_json_path, is_truthy, JsonPath, JsonPathEvaluator,
    DEFAULT_JSONPATH_CACHE_CAPACITY,
};
pub use stats::{
    TimelinePoint, TrafficSnapshot, TrafficStats, DEFAULT_TIMELINE_CAPACITY, OTHER_METHOD,
};
pub use tokenizer::{normalize_ip, normalize_method, path_segments, terms, tokenize, TokenSet, MIN_TERM_LEN};
