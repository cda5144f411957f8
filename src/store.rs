//! JSON-array persistence.
//!
//! Each record kind lives in one file holding a single JSON array. Every
//! mutation reads the whole array, changes it in memory and writes it back.
//! Writes go through a per-store mutex so two requests in this process never
//! interleave a read-modify-write cycle.

use chrono::Local;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

use crate::error::{IntakeError, Result};
use crate::records::{Record, RecordKind, FIELD_ID};
use crate::time_utils::iso_local;

pub struct RecordStore {
    kind: RecordKind,
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl RecordStore {
    pub fn new(kind: RecordKind, path: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn kind(&self) -> RecordKind {
        self.kind
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every record. A missing file is an empty store.
    pub async fn load(&self) -> Result<Vec<Record>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        let root: Value = serde_json::from_str(&content).map_err(|e| self.corrupt(e.to_string()))?;
        let Value::Array(items) = root else {
            return Err(self.corrupt("top-level value is not an array".to_string()));
        };

        items
            .into_iter()
            .enumerate()
            .map(|(i, item)| match item {
                Value::Object(fields) => Ok(Record::from_object(fields)),
                _ => Err(self.corrupt(format!("element {} is not an object", i))),
            })
            .collect()
    }

    /// Rewrite the whole file.
    pub async fn save(&self, records: &[Record]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let mut content = serde_json::to_string_pretty(records)?;
        content.push('\n');

        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, content).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    pub async fn append(&self, record: Record) -> Result<Record> {
        let _guard = self.write_lock.lock().await;
        let mut records = self.load().await?;
        records.push(record.clone());
        self.save(&records).await?;

        tracing::info!(kind = %self.kind, id = ?record.key(), total = records.len(), "Record stored");
        Ok(record)
    }

    pub async fn find(&self, key: &str) -> Result<Option<Record>> {
        Ok(self.load().await?.into_iter().find(|r| r.matches_key(key)))
    }

    /// Shallow-merge `patch` into the record with `key`. The record keeps its id.
    pub async fn update(&self, key: &str, patch: Map<String, Value>) -> Result<Record> {
        let _guard = self.write_lock.lock().await;
        let mut records = self.load().await?;
        let index = self.position(&records, key)?;

        let record = &mut records[index];
        let original_id = record.id().cloned();
        for (field, value) in patch {
            record.insert(field, value);
        }
        if let Some(id) = original_id {
            record.insert(FIELD_ID, id);
        }
        record.insert("updatedAt", iso_local(Local::now()));

        let updated = record.clone();
        self.save(&records).await?;

        tracing::info!(kind = %self.kind, id = key, "Record updated");
        Ok(updated)
    }

    /// Remove the first record with `key` and return it.
    pub async fn delete(&self, key: &str) -> Result<Record> {
        let _guard = self.write_lock.lock().await;
        let mut records = self.load().await?;
        let index = self.position(&records, key)?;

        let removed = records.remove(index);
        self.save(&records).await?;

        tracing::info!(kind = %self.kind, id = key, "Record deleted");
        Ok(removed)
    }

    /// Remove every record whose key is listed. Returns how many were removed.
    pub async fn delete_many(&self, keys: &[String]) -> Result<usize> {
        if keys.is_empty() {
            return Err(IntakeError::InvalidInput(
                "Provide at least one record id to delete".to_string(),
            ));
        }

        let _guard = self.write_lock.lock().await;
        let records = self.load().await?;
        let before = records.len();
        let kept: Vec<Record> = records
            .into_iter()
            .filter(|r| !keys.iter().any(|k| r.matches_key(k)))
            .collect();
        let deleted = before - kept.len();

        if deleted > 0 {
            self.save(&kept).await?;
        }

        tracing::info!(kind = %self.kind, requested = keys.len(), deleted, "Batch delete");
        Ok(deleted)
    }

    /// Append `incoming` to the stored records, or replace them. Returns the new total.
    pub async fn import(&self, incoming: Vec<Record>, replace: bool) -> Result<usize> {
        let _guard = self.write_lock.lock().await;
        let imported = incoming.len();
        let records = if replace {
            incoming
        } else {
            let mut existing = self.load().await?;
            existing.extend(incoming);
            existing
        };
        self.save(&records).await?;

        tracing::info!(kind = %self.kind, imported, replace, total = records.len(), "Records imported");
        Ok(records.len())
    }

    fn position(&self, records: &[Record], key: &str) -> Result<usize> {
        records
            .iter()
            .position(|r| r.matches_key(key))
            .ok_or_else(|| IntakeError::RecordNotFound {
                kind: self.kind,
                id: key.to_string(),
            })
    }

    fn corrupt(&self, reason: String) -> IntakeError {
        IntakeError::CorruptStore {
            path: self.path.display().to_string(),
            reason,
        }
    }
}

/// The data directory with one store per record kind.
pub struct Datastore {
    data_dir: PathBuf,
    registrations: RecordStore,
    contacts: RecordStore,
}

impl Datastore {
    /// Open (and create if needed) the data directory.
    pub async fn open(data_dir: impl Into<PathBuf>) -> Result<Self> {
        let data_dir = data_dir.into();
        tokio::fs::create_dir_all(&data_dir).await?;

        Ok(Self {
            registrations: RecordStore::new(
                RecordKind::Registration,
                data_dir.join(RecordKind::Registration.file_name()),
            ),
            contacts: RecordStore::new(
                RecordKind::Contact,
                data_dir.join(RecordKind::Contact.file_name()),
            ),
            data_dir,
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn store(&self, kind: RecordKind) -> &RecordStore {
        match kind {
            RecordKind::Registration => &self.registrations,
            RecordKind::Contact => &self.contacts,
        }
    }

    pub fn registrations(&self) -> &RecordStore {
        &self.registrations
    }

    pub fn contacts(&self) -> &RecordStore {
        &self.contacts
    }
}
