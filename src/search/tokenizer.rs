//! Tokenizer - turns an entry into index tokens for every dimension
//!
//! Pure and deterministic: the same entry always yields the same
//! [`TokenSet`]. Runs in time linear in the serialized size of the entry.
//!
//! | Dimension | Token |
//! |-----------|-------|
//! | method | uppercased method |
//! | path | each non-empty lowercase `/`-separated segment (no length cutoff) |
//! | ip | lowercase client IP |
//! | term | lowercase fragments of the serialized entry, longer than 2 chars |

use crate::search::entry::Entry;
use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

/// Free-text fragments must be at least this many characters long
pub const MIN_TERM_LEN: usize = 3;

/// Separators for the free-text dimension: whitespace and JSON punctuation
const TERM_SEPARATORS: &str = r#"[\s,.:\-_/\[\]{}()"]+"#;

fn term_splitter() -> &'static Regex {
    static SPLITTER: OnceLock<Regex> = OnceLock::new();
    SPLITTER.get_or_init(|| Regex::new(TERM_SEPARATORS).expect("separator pattern is valid"))
}

/// Tokens extracted from a single entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenSet {
    pub method: String,
    pub path_segments: Vec<String>,
    pub ip: String,
    pub terms: Vec<String>,
    pub timestamp_ms: i64,
}

/// Tokenize an entry for all dimensions
pub fn tokenize(entry: &Entry) -> TokenSet {
    TokenSet {
        method: normalize_method(&entry.method),
        path_segments: path_segments(&entry.path),
        ip: normalize_ip(&entry.client_ip),
        terms: terms(&serde_json::to_string(entry).unwrap_or_default()),
        timestamp_ms: entry.timestamp_millis(),
    }
}

/// Canonical form of a method token (also used for lookups)
pub fn normalize_method(method: &str) -> String {
    method.trim().to_uppercase()
}

/// Distinct non-empty lowercase path segments, in first-seen order
pub fn path_segments(path: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    path.to_lowercase()
        .split('/')
        .filter(|segment| !segment.is_empty())
        .filter(|segment| seen.insert(segment.to_string()))
        .map(str::to_string)
        .collect()
}

/// Distinct free-text terms of a piece of text, in first-seen order
pub fn terms(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    let mut seen = HashSet::new();
    term_splitter()
        .split(&lowered)
        .filter(|term| term.chars().count() >= MIN_TERM_LEN)
        .filter(|term| seen.insert(*term))
        .map(str::to_string)
        .collect()
}

/// Canonical form of an IP token
pub fn normalize_ip(ip: &str) -> String {
    ip.trim().to_lowercase()
}
