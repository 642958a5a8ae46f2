//! Webhook entries and the append-only entry store
//!
//! An [`Entry`] is one captured HTTP request. Entries are immutable once
//! stored and are referenced everywhere else by their [`EntryId`], which is
//! the zero-based arrival position in the [`EntryStore`].

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Dense, zero-based arrival index of an entry
pub type EntryId = usize;

/// One captured webhook request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Entry {
    /// Receipt time (UTC)
    pub timestamp: DateTime<Utc>,
    /// Address of the sender
    #[serde(default, alias = "clientIp", alias = "ip")]
    pub client_ip: String,
    /// HTTP method as received
    #[serde(default)]
    pub method: String,
    /// Request path, without query string
    #[serde(default)]
    pub path: String,
    /// Request headers
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// Request body, parsed as JSON when possible
    #[serde(default)]
    pub payload: Value,
}

impl Entry {
    /// Create an entry received now
    pub fn new(method: impl Into<String>, path: impl Into<String>, client_ip: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            client_ip: client_ip.into(),
            method: method.into(),
            path: path.into(),
            headers: BTreeMap::new(),
            payload: Value::Null,
        }
    }

    /// Builder method: set timestamp
    pub fn timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Builder method: set timestamp from Unix milliseconds
    pub fn timestamp_ms(mut self, millis: i64) -> Self {
        if let Some(ts) = Utc.timestamp_millis_opt(millis).single() {
            self.timestamp = ts;
        }
        self
    }

    /// Builder method: add a header
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Builder method: set payload
    pub fn payload(mut self, payload: Value) -> Self {
        self.payload = payload;
        self
    }

    /// Receipt time as Unix milliseconds
    pub fn timestamp_millis(&self) -> i64 {
        self.timestamp.timestamp_millis()
    }

    /// Build an entry from an arbitrary JSON message.
    ///
    /// Never fails: missing or mistyped fields become empty values, scalar
    /// values in string positions are stringified, and an unreadable
    /// timestamp falls back to the time of the call.
    pub fn from_value(value: &Value) -> Self {
        let field = |names: &[&str]| names.iter().find_map(|name| value.get(*name));

        let text = |names: &[&str]| -> String {
            match field(names) {
                Some(Value::String(s)) => s.clone(),
                Some(Value::Null) | None => String::new(),
                Some(v @ (Value::Number(_) | Value::Bool(_))) => v.to_string(),
                Some(_) => String::new(),
            }
        };

        let headers = match field(&["headers"]) {
            Some(Value::Object(map)) => map
                .iter()
                .map(|(k, v)| {
                    let v = match v {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    };
                    (k.clone(), v)
                })
                .collect(),
            _ => BTreeMap::new(),
        };

        let timestamp = field(&["timestamp"])
            .and_then(parse_timestamp)
            .unwrap_or_else(Utc::now);

        Self {
            timestamp,
            client_ip: text(&["client_ip", "clientIp", "ip"]),
            method: text(&["method"]),
            path: text(&["path"]),
            headers,
            payload: field(&["payload"]).cloned().unwrap_or(Value::Null),
        }
    }
}

/// Zone-less forms sent by `datetime-local` inputs, read as UTC
const NAIVE_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"];

/// Accepts RFC 3339 strings, zone-less local date-times or Unix milliseconds
pub(crate) fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            DateTime::parse_from_rfc3339(s)
                .map(|ts| ts.with_timezone(&Utc))
                .ok()
                .or_else(|| {
                    NAIVE_FORMATS
                        .iter()
                        .find_map(|format| NaiveDateTime::parse_from_str(s, format).ok())
                        .map(|naive| naive.and_utc())
                })
        }
        Value::Number(n) => n
            .as_i64()
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single()),
        _ => None,
    }
}

/// Append-only, ordered collection of entries
///
/// Source of truth for entry IDs: the ID of an entry is its position.
#[derive(Debug, Default)]
pub struct EntryStore {
    entries: Vec<Entry>,
}

impl EntryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry and return its ID
    pub fn push(&mut self, entry: Entry) -> EntryId {
        let id = self.entries.len();
        self.entries.push(entry);
        id
    }

    pub fn get(&self, id: EntryId) -> Option<&Entry> {
        self.entries.get(id)
    }

    /// All entries in arrival order
    pub fn as_slice(&self) -> &[Entry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
