//! Query Evaluator
//!
//! Turns a [`FilterSpec`] into the set of matching entry IDs.
//!
//! # Evaluation Pipeline
//!
//! ```text
//! all IDs → method ∩ → ip ∩ → path ∩ → time ∩ → text ∩ → JSONPath per candidate
//! ```
//!
//! Every step is a set intersection, so the result does not depend on the
//! order; the order only keeps the candidate set small before the
//! per-candidate JSONPath pass. Steps never widen the result.

use crate::search::entry::{EntryId, EntryStore};
use crate::search::filter::{Constraint, FilterSpec};
use crate::search::index::InvertedIndex;
use crate::search::jsonpath::{is_truthy, JsonPathEvaluator};
use std::collections::{BTreeSet, HashSet};
use std::time::Instant;

/// Evaluates filter specs against a read-consistent view of the store and index
pub struct QueryEvaluator<'a> {
    store: &'a EntryStore,
    index: &'a InvertedIndex,
    json_path: &'a mut JsonPathEvaluator,
}

impl<'a> QueryEvaluator<'a> {
    pub fn new(
        store: &'a EntryStore,
        index: &'a InvertedIndex,
        json_path: &'a mut JsonPathEvaluator,
    ) -> Self {
        Self {
            store,
            index,
            json_path,
        }
    }

    /// Evaluate a spec; an empty spec matches every stored entry
    pub fn evaluate(&mut self, spec: &FilterSpec) -> BTreeSet<EntryId> {
        let start = Instant::now();
        let mut candidates: BTreeSet<EntryId> = (0..self.store.len()).collect();

        for constraint in spec.constraints() {
            if candidates.is_empty() {
                break;
            }

            let before = candidates.len();
            match &constraint {
                Constraint::JsonPath(expression) => {
                    self.retain_json_path(&mut candidates, expression);
                }
                indexed => {
                    let matches = index_matches(self.index, indexed);
                    candidates.retain(|id| matches.contains(id));
                }
            }

            tracing::trace!(
                dimension = constraint.dimension(),
                before,
                after = candidates.len(),
                "Applied filter dimension"
            );
        }

        tracing::debug!(
            matches = candidates.len(),
            total = self.store.len(),
            elapsed_us = start.elapsed().as_micros() as u64,
            "Evaluated filter"
        );

        candidates
    }

    /// Keep candidates whose payload yields a truthy JSONPath result
    fn retain_json_path(&mut self, candidates: &mut BTreeSet<EntryId>, expression: &str) {
        let store = self.store;
        let json_path = &mut *self.json_path;

        candidates.retain(|id| {
            store
                .get(*id)
                .and_then(|entry| json_path.evaluate(&entry.payload, expression))
                .map(|result| is_truthy(&result))
                .unwrap_or(false)
        });
    }
}

/// Matching set for an index-backed dimension
fn index_matches(index: &InvertedIndex, constraint: &Constraint<'_>) -> HashSet<EntryId> {
    match constraint {
        Constraint::Method(method) => index.match_method(method),
        Constraint::Ip(needle) => index.match_ip(needle),
        Constraint::Path(needle) => index.match_path(needle),
        Constraint::TimeRange { from_ms, to_ms } => index.match_time_range(*from_ms, *to_ms),
        Constraint::Text(words) => index.match_terms(words),
        Constraint::JsonPath(_) => HashSet::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::entry::Entry;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    struct Fixture {
        store: EntryStore,
        index: InvertedIndex,
        json_path: JsonPathEvaluator,
    }

    impl Fixture {
        fn new(entries: Vec<Entry>) -> Self {
            let mut store = EntryStore::new();
            let mut index = InvertedIndex::new();
            for entry in entries {
                let id = store.push(entry.clone());
                index.index_entry(id, &entry);
            }
            Self {
                store,
                index,
                json_path: JsonPathEvaluator::new(100),
            }
        }

        fn eval(&mut self, spec: &FilterSpec) -> Vec<EntryId> {
            QueryEvaluator::new(&self.store, &self.index, &mut self.json_path)
                .evaluate(spec)
                .into_iter()
                .collect()
        }
    }

    fn fixture() -> Fixture {
        Fixture::new(vec![
            Entry::new("GET", "/api/users", "10.0.0.1")
                .timestamp_ms(1_000)
                .payload(json!({"active": true})),
            Entry::new("POST", "/api/orders", "10.0.0.2")
                .timestamp_ms(2_000)
                .payload(json!({"order": {"id": 7, "status": "paid"}})),
            Entry::new("POST", "/hooks/stripe", "172.16.0.5")
                .timestamp_ms(3_000)
                .payload(json!({"order": {"id": 0, "status": "refunded"}})),
        ])
    }

    #[test]
    fn test_empty_spec_returns_everything() {
        let mut f = fixture();
        assert_eq!(f.eval(&FilterSpec::new()), vec![0, 1, 2]);
    }

    #[test]
    fn test_empty_store() {
        let mut f = Fixture::new(vec![]);
        assert!(f.eval(&FilterSpec::new()).is_empty());
        assert!(f.eval(&FilterSpec::new().method("GET")).is_empty());
    }

    #[test]
    fn test_dimensions_intersect() {
        let mut f = fixture();
        assert_eq!(f.eval(&FilterSpec::new().method("post")), vec![1, 2]);
        assert_eq!(f.eval(&FilterSpec::new().method("post").path("api")), vec![1]);
        assert_eq!(f.eval(&FilterSpec::new().method("post").ip("172")), vec![2]);
        assert!(f.eval(&FilterSpec::new().method("GET").path("stripe")).is_empty());
    }

    #[test]
    fn test_unknown_method_yields_empty() {
        let mut f = fixture();
        assert!(f.eval(&FilterSpec::new().method("BREW")).is_empty());
    }

    #[test]
    fn test_text_words_are_or_within_dimension() {
        let mut f = fixture();
        assert_eq!(f.eval(&FilterSpec::new().search_text("refund")), vec![2]);
        assert_eq!(f.eval(&FilterSpec::new().search_text("refund users")), vec![0, 2]);
        assert_eq!(f.eval(&FilterSpec::new().search_text("refund users").method("GET")), vec![0]);
    }

    #[test]
    fn test_time_range_inclusive_bounds() {
        let mut f = fixture();
        let at = |ms| Utc.timestamp_millis_opt(ms).unwrap();

        assert_eq!(f.eval(&FilterSpec::new().time_from(at(2_000)).time_to(at(3_000))), vec![1, 2]);
        assert_eq!(f.eval(&FilterSpec::new().time_to(at(1_000))), vec![0]);
        assert_eq!(f.eval(&FilterSpec::new().time_from(at(3_000))), vec![2]);
    }

    #[test]
    fn test_json_path_truthiness() {
        let mut f = fixture();
        assert_eq!(f.eval(&FilterSpec::new().json_path("$.order")), vec![1, 2]);
        // id 0 is falsy
        assert_eq!(f.eval(&FilterSpec::new().json_path("$.order.id")), vec![1]);
        assert_eq!(f.eval(&FilterSpec::new().json_path("$.active")), vec![0]);
        assert!(f.eval(&FilterSpec::new().json_path("not a path")).is_empty());
    }

    #[test]
    fn test_json_path_only_runs_on_survivors() {
        let mut f = fixture();
        assert!(f.eval(&FilterSpec::new().method("DELETE").json_path("$.order")).is_empty());
        assert_eq!(f.json_path.misses(), 0);

        f.eval(&FilterSpec::new().method("POST").json_path("$.order"));
        assert_eq!(f.json_path.misses(), 2);
    }

    #[test]
    fn test_narrowing_is_monotonic() {
        let mut f = fixture();
        let a = FilterSpec::new().method("POST");
        let b = FilterSpec::new().search_text("paid");
        let both = FilterSpec::new().method("POST").search_text("paid");

        let ra: BTreeSet<_> = f.eval(&a).into_iter().collect();
        let rb: BTreeSet<_> = f.eval(&b).into_iter().collect();
        let rboth: BTreeSet<_> = f.eval(&both).into_iter().collect();

        assert!(rboth.is_subset(&ra.intersection(&rb).copied().collect()));
    }
}
