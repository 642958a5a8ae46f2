//! Inverted Index - token → entry-ID sets for every filter dimension
//!
//! Four independent mappings plus a time-ordered index:
//!
//! - **methods**: uppercased method → IDs (exactly one bucket per entry)
//! - **paths**: lowercase path segment → IDs (zero or more buckets)
//! - **ips**: lowercase client IP → IDs (exactly one bucket per entry)
//! - **terms**: free-text fragment → IDs (zero or more buckets)
//! - **timeline**: `(timestamp_ms, id)` kept in a B-tree, so insertion is
//!   O(log n) and range queries never need a sort pass
//!
//! # Design Notes
//! - Updated incrementally, once per entry, at ingestion time. Insertion
//!   cost is proportional to the number of tokens in the entry.
//! - There is no removal: entries are permanent.
//! - Indexing the same ID twice is not guarded against. Callers (the
//!   engine) index each ID exactly once, right after the store assigns it.

use crate::search::entry::{Entry, EntryId};
use crate::search::tokenizer::{self, TokenSet};
use std::collections::{BTreeSet, HashMap, HashSet};

type Postings = HashMap<String, HashSet<EntryId>>;

/// Timeline element, ordered by timestamp first and then arrival
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeEntry {
    pub timestamp_ms: i64,
    pub entry_id: EntryId,
}

/// Statistics about index contents
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct IndexStats {
    /// Distinct method tokens
    pub methods: usize,
    /// Distinct path segments
    pub path_segments: usize,
    /// Distinct client IPs
    pub ips: usize,
    /// Distinct free-text terms
    pub terms: usize,
    /// Entries on the timeline
    pub time_entries: usize,
}

/// Multi-dimension inverted index over entry IDs
#[derive(Debug, Default)]
pub struct InvertedIndex {
    methods: Postings,
    paths: Postings,
    ips: Postings,
    terms: Postings,
    timeline: BTreeSet<TimeEntry>,
}

impl InvertedIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tokenize and index a newly stored entry
    pub fn index_entry(&mut self, entry_id: EntryId, entry: &Entry) {
        self.insert_tokens(entry_id, tokenizer::tokenize(entry));
    }

    /// Index a pre-computed token set
    pub fn insert_tokens(&mut self, entry_id: EntryId, tokens: TokenSet) {
        add(&mut self.methods, tokens.method, entry_id);
        add(&mut self.ips, tokens.ip, entry_id);

        for segment in tokens.path_segments {
            add(&mut self.paths, segment, entry_id);
        }
        for term in tokens.terms {
            add(&mut self.terms, term, entry_id);
        }

        self.timeline.insert(TimeEntry {
            timestamp_ms: tokens.timestamp_ms,
            entry_id,
        });
    }

    // ==================== Lookups ====================

    /// Exact method match (the argument is normalized first)
    pub fn match_method(&self, method: &str) -> HashSet<EntryId> {
        self.methods
            .get(&tokenizer::normalize_method(method))
            .cloned()
            .unwrap_or_default()
    }

    /// Union of all path-segment buckets containing `needle` (case-insensitive)
    pub fn match_path(&self, needle: &str) -> HashSet<EntryId> {
        union_containing(&self.paths, &[needle.to_lowercase()])
    }

    /// Union of all IP buckets containing `needle` (case-insensitive)
    pub fn match_ip(&self, needle: &str) -> HashSet<EntryId> {
        union_containing(&self.ips, &[needle.to_lowercase()])
    }

    /// Union of all term buckets containing any of `words` (case-insensitive)
    pub fn match_terms(&self, words: &[&str]) -> HashSet<EntryId> {
        let words: Vec<String> = words.iter().map(|w| w.to_lowercase()).collect();
        union_containing(&self.terms, &words)
    }

    /// Entries whose timestamp lies in `[from, to]`; a missing bound is open
    pub fn match_time_range(&self, from_ms: Option<i64>, to_ms: Option<i64>) -> HashSet<EntryId> {
        let lower = TimeEntry {
            timestamp_ms: from_ms.unwrap_or(i64::MIN),
            entry_id: EntryId::MIN,
        };
        let upper = TimeEntry {
            timestamp_ms: to_ms.unwrap_or(i64::MAX),
            entry_id: EntryId::MAX,
        };

        if lower > upper {
            return HashSet::new();
        }

        self.timeline
            .range(lower..=upper)
            .map(|t| t.entry_id)
            .collect()
    }

    // ==================== Introspection ====================

    /// Timeline in ascending timestamp order
    pub fn timeline(&self) -> impl Iterator<Item = &TimeEntry> {
        self.timeline.iter()
    }

    pub fn has_term(&self, term: &str) -> bool {
        self.terms.contains_key(term)
    }

    pub fn has_path_segment(&self, segment: &str) -> bool {
        self.paths.contains_key(segment)
    }

    /// Distinct method tokens seen so far
    pub fn methods(&self) -> Vec<String> {
        let mut methods: Vec<String> = self.methods.keys().cloned().collect();
        methods.sort();
        methods
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats {
            methods: self.methods.len(),
            path_segments: self.paths.len(),
            ips: self.ips.len(),
            terms: self.terms.len(),
            time_entries: self.timeline.len(),
        }
    }
}

fn add(postings: &mut Postings, token: String, entry_id: EntryId) {
    postings.entry(token).or_default().insert(entry_id);
}

/// Scan every distinct token of a dimension and union the matching buckets
fn union_containing(postings: &Postings, needles: &[String]) -> HashSet<EntryId> {
    let mut result = HashSet::new();
    for (token, ids) in postings {
        if needles.iter().any(|needle| token.contains(needle.as_str())) {
            result.extend(ids.iter().copied());
        }
    }
    result
}
