//! Building records from incoming submissions and imports.

use chrono::{DateTime, Local};
use serde_json::{Map, Value};

use crate::error::{IntakeError, Result};
use crate::records::{
    generate_id, generate_import_id, Record, RecordKind, FIELD_ID, FIELD_SUBMIT_TIME,
    FIELD_TIMESTAMP,
};
use crate::time_utils::{contact_time, iso_local};

const FIELD_IP: &str = "ip";
const FIELD_TYPE: &str = "type";
const DEFAULT_CONTACT_TYPE: &str = "contact";

/// Build a registration from url-encoded form pairs.
///
/// A key submitted once is stored as a string, a repeated key (multi-select
/// checkboxes) as an array in submission order.
pub fn new_registration(
    pairs: Vec<(String, String)>,
    client_ip: Option<String>,
    now: DateTime<Local>,
) -> Record {
    let mut record = Record::new();
    record.insert(FIELD_ID, generate_id());
    record.insert(FIELD_SUBMIT_TIME, iso_local(now));

    let mut fields: Map<String, Value> = Map::new();
    for (key, value) in pairs {
        if key == FIELD_ID || key == FIELD_SUBMIT_TIME {
            continue;
        }
        match fields.get_mut(&key) {
            None => {
                fields.insert(key, Value::String(value));
            },
            Some(Value::Array(items)) => items.push(Value::String(value)),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, Value::String(value)]);
            },
        }
    }

    for (key, value) in fields {
        record.insert(key, value);
    }
    if let Some(ip) = client_ip {
        record.insert(FIELD_IP, ip);
    }
    record
}

/// Build a contact request from a JSON body.
pub fn new_contact(
    body: Value,
    client_ip: Option<String>,
    now: DateTime<Local>,
) -> Result<Record> {
    let Value::Object(submitted) = body else {
        return Err(IntakeError::InvalidInput(
            "Contact request must be a JSON object".to_string(),
        ));
    };

    let mut record = Record::new();
    record.insert(FIELD_ID, generate_id());
    record.insert("name", text_or_empty(submitted.get("name")));
    record.insert("phone", text_or_empty(submitted.get("phone")));
    record.insert(
        FIELD_TIMESTAMP,
        submitted
            .get(FIELD_TIMESTAMP)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| iso_local(now)),
    );
    record.insert(
        FIELD_TYPE,
        submitted
            .get(FIELD_TYPE)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_CONTACT_TYPE)
            .to_string(),
    );
    record.insert(FIELD_SUBMIT_TIME, contact_time(now));

    for (key, value) in submitted {
        if !record.fields().contains_key(&key) {
            record.insert(key, value);
        }
    }
    if let Some(ip) = client_ip {
        record.insert(FIELD_IP, ip);
    }
    Ok(record)
}

fn text_or_empty(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

/// Normalise imported items so each one is addressable and dated.
pub fn prepare_import(
    kind: RecordKind,
    items: Vec<Value>,
    now: DateTime<Local>,
) -> Result<Vec<Record>> {
    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| {
            let Value::Object(fields) = item else {
                return Err(IntakeError::InvalidInput(format!(
                    "Import item {} is not a JSON object",
                    i
                )));
            };
            let mut record = Record::from_object(fields);

            if !record.contains(FIELD_ID) && !record.contains(FIELD_TIMESTAMP) {
                record.insert(FIELD_ID, generate_import_id());
            }
            if !record.contains(FIELD_TIMESTAMP) && !record.contains(FIELD_SUBMIT_TIME) {
                record.insert(FIELD_TIMESTAMP, iso_local(now));
            }
            if kind == RecordKind::Contact {
                if !record.contains(FIELD_SUBMIT_TIME) {
                    let submitted = record
                        .get_str(FIELD_TIMESTAMP)
                        .unwrap_or_else(|| iso_local(now));
                    record.insert(FIELD_SUBMIT_TIME, submitted);
                }
                if !record.contains(FIELD_TYPE) {
                    record.insert(FIELD_TYPE, DEFAULT_CONTACT_TYPE);
                }
            }
            Ok(record)
        })
        .collect()
}
