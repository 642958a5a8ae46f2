//! Filter specifications
//!
//! A [`FilterSpec`] is a fixed set of optional fields; an empty field means
//! "no constraint on this dimension". [`FilterSpec::constraints`] turns the
//! active fields into [`Constraint`] variants in a fixed evaluation order,
//! cheapest and most selective first, with JSONPath always last since it
//! runs per surviving candidate.

use chrono::{DateTime, Utc};
use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::entry::parse_timestamp;

/// Method value that the UI uses for "any method"
pub const ANY_METHOD: &str = "all";

/// The complete set of query constraints for one evaluation
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FilterSpec {
    /// Whitespace-separated words matched against free-text terms
    #[serde(alias = "search")]
    pub search_text: String,
    /// Exact method, case-insensitive
    pub method: String,
    /// Substring of any path segment
    #[serde(alias = "path")]
    pub path_substring: String,
    /// Substring of the client IP
    #[serde(alias = "ip")]
    pub ip_substring: String,
    /// Inclusive lower time bound
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_time_bound"
    )]
    pub time_from: Option<DateTime<Utc>>,
    /// Inclusive upper time bound
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_time_bound"
    )]
    pub time_to: Option<DateTime<Utc>>,
    /// Restricted JSONPath evaluated against each candidate's payload
    #[serde(alias = "jsonPath")]
    pub json_path_expr: String,
}

/// Time bounds take the same forms as entry timestamps; null or blank is unset
fn deserialize_time_bound<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(value) => parse_timestamp(&value)
            .map(Some)
            .ok_or_else(|| de::Error::custom(format!("invalid time bound: {}", value))),
    }
}

/// One active filter dimension
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constraint<'a> {
    Method(&'a str),
    Ip(&'a str),
    Path(&'a str),
    TimeRange {
        from_ms: Option<i64>,
        to_ms: Option<i64>,
    },
    Text(Vec<&'a str>),
    JsonPath(&'a str),
}

impl Constraint<'_> {
    /// Short dimension name for logging
    pub fn dimension(&self) -> &'static str {
        match self {
            Constraint::Method(_) => "method",
            Constraint::Ip(_) => "ip",
            Constraint::Path(_) => "path",
            Constraint::TimeRange { .. } => "time",
            Constraint::Text(_) => "text",
            Constraint::JsonPath(_) => "jsonpath",
        }
    }
}

impl FilterSpec {
    /// Match-all filter
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set free-text search
    pub fn search_text(mut self, text: impl Into<String>) -> Self {
        self.search_text = text.into();
        self
    }

    /// Builder method: set method
    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    /// Builder method: set path substring
    pub fn path(mut self, needle: impl Into<String>) -> Self {
        self.path_substring = needle.into();
        self
    }

    /// Builder method: set IP substring
    pub fn ip(mut self, needle: impl Into<String>) -> Self {
        self.ip_substring = needle.into();
        self
    }

    /// Builder method: set inclusive lower time bound
    pub fn time_from(mut self, from: DateTime<Utc>) -> Self {
        self.time_from = Some(from);
        self
    }

    /// Builder method: set inclusive upper time bound
    pub fn time_to(mut self, to: DateTime<Utc>) -> Self {
        self.time_to = Some(to);
        self
    }

    /// Builder method: set JSONPath predicate
    pub fn json_path(mut self, expression: impl Into<String>) -> Self {
        self.json_path_expr = expression.into();
        self
    }

    /// Active constraints in evaluation order
    pub fn constraints(&self) -> Vec<Constraint<'_>> {
        let mut constraints = Vec::new();

        let method = self.method.trim();
        if !method.is_empty() && !method.eq_ignore_ascii_case(ANY_METHOD) {
            constraints.push(Constraint::Method(method));
        }

        let ip = self.ip_substring.trim();
        if !ip.is_empty() {
            constraints.push(Constraint::Ip(ip));
        }

        let path = self.path_substring.trim();
        if !path.is_empty() {
            constraints.push(Constraint::Path(path));
        }

        if self.time_from.is_some() || self.time_to.is_some() {
            constraints.push(Constraint::TimeRange {
                from_ms: self.time_from.map(|t| t.timestamp_millis()),
                to_ms: self.time_to.map(|t| t.timestamp_millis()),
            });
        }

        let words: Vec<&str> = self.search_text.split_whitespace().collect();
        if !words.is_empty() {
            constraints.push(Constraint::Text(words));
        }

        let expression = self.json_path_expr.trim();
        if !expression.is_empty() {
            constraints.push(Constraint::JsonPath(expression));
        }

        constraints
    }

    /// True when no dimension is constrained
    pub fn is_match_all(&self) -> bool {
        self.constraints().is_empty()
    }

    /// Canonical serialized form, used as the result-cache key.
    ///
    /// Specs that differ only in case or surrounding whitespace of
    /// case-insensitive fields share a key.
    pub fn cache_key(&self) -> String {
        let method = self.method.trim();
        let method = if method.eq_ignore_ascii_case(ANY_METHOD) {
            String::new()
        } else {
            method.to_uppercase()
        };

        let normalized = FilterSpec {
            search_text: self
                .search_text
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ")
                .to_lowercase(),
            method,
            path_substring: self.path_substring.trim().to_lowercase(),
            ip_substring: self.ip_substring.trim().to_lowercase(),
            time_from: self.time_from,
            time_to: self.time_to,
            json_path_expr: self.json_path_expr.trim().to_string(),
        };

        serde_json::to_string(&normalized).unwrap_or_default()
    }
}
