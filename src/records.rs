//! Record kinds and the schemaless record type shared by registrations and
//! contacts.

use chrono::{NaiveDateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use crate::error::IntakeError;
use crate::time_utils::parse_timestamp;

pub const FIELD_ID: &str = "id";
pub const FIELD_SUBMIT_TIME: &str = "submitTime";
pub const FIELD_TIMESTAMP: &str = "timestamp";
pub const FIELD_STATUS: &str = "status";

/// Status a record is considered to have when it carries none.
pub const DEFAULT_STATUS: &str = "pending";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Registration,
    Contact,
}

impl RecordKind {
    pub const ALL: [RecordKind; 2] = [RecordKind::Registration, RecordKind::Contact];

    pub fn file_name(self) -> &'static str {
        match self {
            RecordKind::Registration => "registrations.json",
            RecordKind::Contact => "contacts.json",
        }
    }

    /// Plural name used in URLs, export file names and CLI flags.
    pub fn plural(self) -> &'static str {
        match self {
            RecordKind::Registration => "registrations",
            RecordKind::Contact => "contacts",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKind::Registration => write!(f, "registration"),
            RecordKind::Contact => write!(f, "contact"),
        }
    }
}

impl FromStr for RecordKind {
    type Err = IntakeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "registration" | "registrations" => Ok(RecordKind::Registration),
            "contact" | "contacts" => Ok(RecordKind::Contact),
            other => Err(IntakeError::InvalidInput(format!(
                "Unknown record kind '{}'. Use 'registrations' or 'contacts'",
                other
            ))),
        }
    }
}

/// One stored submission: an ordered bag of fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    pub fn new() -> Self {
        Self(Map::new())
    }

    pub fn from_object(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_fields(self) -> Map<String, Value> {
        self.0
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(field.into(), value.into());
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.get(field).is_some_and(|v| !v.is_null())
    }

    /// Field as text; numbers and booleans are rendered, arrays are joined.
    pub fn get_str(&self, field: &str) -> Option<String> {
        self.0.get(field).and_then(value_text)
    }

    pub fn id(&self) -> Option<&Value> {
        self.0.get(FIELD_ID).filter(|v| !v.is_null())
    }

    /// Lookup key: textual `id`, falling back to `timestamp`.
    pub fn key(&self) -> Option<String> {
        self.get_str(FIELD_ID)
            .filter(|k| !k.is_empty())
            .or_else(|| self.get_str(FIELD_TIMESTAMP).filter(|k| !k.is_empty()))
    }

    pub fn matches_key(&self, key: &str) -> bool {
        self.key().is_some_and(|k| k == key.trim())
    }

    /// Submission time, from `submitTime` or else `timestamp`.
    pub fn submitted_at(&self) -> Option<NaiveDateTime> {
        [FIELD_SUBMIT_TIME, FIELD_TIMESTAMP]
            .iter()
            .filter_map(|f| self.get_str(f))
            .find_map(|raw| parse_timestamp(&raw))
    }

    pub fn status(&self) -> String {
        self.get_str(FIELD_STATUS)
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_STATUS.to_string())
    }
}

impl From<Map<String, Value>> for Record {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

/// Render a JSON value as the text an operator would expect to see.
pub fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(value_text)
                .collect::<Vec<_>>()
                .join(", "),
        ),
        Value::Object(_) => Some(value.to_string()),
    }
}

/// Server-assigned identifier: wall-clock milliseconds.
///
/// Two submissions within the same millisecond get the same id.
pub fn generate_id() -> i64 {
    Utc::now().timestamp_millis()
}

/// Identifier for imported records that arrive without one.
pub fn generate_import_id() -> String {
    let millis = Utc::now().timestamp_millis().max(0) as u64;
    let suffix: u64 = rand::rng().random();
    format!("{}{}", to_base36(millis), to_base36(suffix))
}

fn to_base36(mut n: u64) -> String {
    const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if n == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while n > 0 {
        out.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

/// Newest first; records without a parseable time keep file order at the end.
pub fn sort_newest_first(records: &mut [Record]) {
    records.sort_by(|a, b| match (a.submitted_at(), b.submitted_at()) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
}
