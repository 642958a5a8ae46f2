//! Restricted JSONPath evaluation with memoization
//!
//! Grammar:
//!
//! ```text
//! path  := "$" ( "." field )*
//! field := one or more characters other than "."
//! ```
//!
//! `$` is the identity; each `.field` projects an object member (or an
//! array element when `field` is a decimal index). Traversal yields `None`
//! as soon as a step is missing or the current value is not traversable.
//! Any other expression form yields `None`. Evaluation never fails.

use crate::search::cache::FifoCache;
use nom::{
    bytes::complete::take_while1,
    character::complete::char,
    combinator::all_consuming,
    multi::many0,
    sequence::preceded,
    IResult,
};
use serde_json::Value;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Default number of memoized evaluations
pub const DEFAULT_JSONPATH_CACHE_CAPACITY: usize = 500;

/// Parsed expression: the field names after `$`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonPath {
    fields: Vec<String>,
}

impl JsonPath {
    /// Parse an expression; `None` for anything outside the grammar
    pub fn parse(expression: &str) -> Option<Self> {
        all_consuming(path)(expression.trim())
            .ok()
            .map(|(_, fields)| Self {
                fields: fields.into_iter().map(str::to_string).collect(),
            })
    }

    pub fn is_root(&self) -> bool {
        self.fields.is_empty()
    }

    /// Walk the fields from `value`
    pub fn select<'a>(&self, value: &'a Value) -> Option<&'a Value> {
        self.fields
            .iter()
            .try_fold(value, |current, field| step(current, field))
    }
}

fn path(input: &str) -> IResult<&str, Vec<&str>> {
    preceded(char('$'), many0(preceded(char('.'), take_while1(|c: char| c != '.'))))(input)
}

fn step<'a>(current: &'a Value, field: &str) -> Option<&'a Value> {
    match current {
        Value::Object(map) => map.get(field),
        Value::Array(items) => field.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    }
}

/// Evaluate an expression without caching
pub fn evaluate(value: &Value, expression: &str) -> Option<Value> {
    JsonPath::parse(expression)?
        .select(value)
        .cloned()
}

/// Truthiness of an evaluation result.
///
/// `null`, `false`, `0`, `NaN`-like numbers and `""` are falsy; everything
/// else, including empty arrays and objects, is truthy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Cache key: the expression plus a fingerprint of the full serialized target
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct EvalKey {
    expression: String,
    fingerprint: u64,
}

fn fingerprint(value: &Value) -> u64 {
    let mut hasher = DefaultHasher::new();
    serde_json::to_string(value)
        .unwrap_or_default()
        .hash(&mut hasher);
    hasher.finish()
}

/// Memoizing evaluator
#[derive(Debug)]
pub struct JsonPathEvaluator {
    cache: FifoCache<EvalKey, Option<Value>>,
    hits: u64,
    misses: u64,
}

impl Default for JsonPathEvaluator {
    fn default() -> Self {
        Self::new(DEFAULT_JSONPATH_CACHE_CAPACITY)
    }
}

impl JsonPathEvaluator {
    pub fn new(capacity: usize) -> Self {
        Self {
            cache: FifoCache::new(capacity),
            hits: 0,
            misses: 0,
        }
    }

    /// Evaluate `expression` against `value`, consulting the cache first.
    ///
    /// Results, including `None`, are cached. An empty expression is
    /// answered with `None` without touching the cache.
    pub fn evaluate(&mut self, value: &Value, expression: &str) -> Option<Value> {
        if expression.trim().is_empty() {
            return None;
        }

        let key = EvalKey {
            expression: expression.to_string(),
            fingerprint: fingerprint(value),
        };

        if let Some(cached) = self.cache.get(&key) {
            self.hits += 1;
            return cached.clone();
        }

        self.misses += 1;
        let result = evaluate(value, expression);
        self.cache.put(key, result.clone());
        result
    }

    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }
}
