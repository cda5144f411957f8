//! CSV and JSON exports of stored records.

use chrono::NaiveDate;
use std::str::FromStr;

use crate::error::{IntakeError, Result};
use crate::records::{Record, RecordKind};

/// Byte-order mark so spreadsheet software detects UTF-8.
const UTF8_BOM: char = '\u{FEFF}';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Json,
    Csv,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            ExportFormat::Json => "application/json; charset=utf-8",
            ExportFormat::Csv => "text/csv; charset=utf-8",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = IntakeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            other => Err(IntakeError::InvalidInput(format!(
                "Unknown export format '{}'. Use 'csv' or 'json'",
                other
            ))),
        }
    }
}

struct Column {
    header: &'static str,
    cell: fn(&Record) -> String,
}

fn field(record: &Record, name: &str) -> String {
    record.get_str(name).unwrap_or_default()
}

fn submitted(record: &Record) -> String {
    record
        .submitted_at()
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_default()
}

fn status_label(record: &Record) -> String {
    match record.status().as_str() {
        "completed" => "Completed",
        "cancelled" => "Cancelled",
        _ => "Pending",
    }
    .to_string()
}

const REGISTRATION_COLUMNS: &[Column] = &[
    Column { header: "Name", cell: |r| field(r, "name") },
    Column { header: "Phone", cell: |r| field(r, "phone") },
    Column { header: "Course", cell: |r| field(r, "course") },
    Column { header: "Age", cell: |r| field(r, "age") },
    Column { header: "Gender", cell: |r| field(r, "gender") },
    Column { header: "Education", cell: |r| field(r, "education") },
    Column { header: "Experience", cell: |r| field(r, "experience") },
    Column { header: "Submitted", cell: submitted },
    Column { header: "Status", cell: status_label },
    Column { header: "Remarks", cell: |r| field(r, "remarks") },
];

const CONTACT_COLUMNS: &[Column] = &[
    Column { header: "Name", cell: |r| field(r, "name") },
    Column { header: "Phone", cell: |r| field(r, "phone") },
    Column { header: "Type", cell: |r| field(r, "type") },
    Column { header: "Message", cell: |r| field(r, "message") },
    Column { header: "Submitted", cell: submitted },
];

fn columns(kind: RecordKind) -> &'static [Column] {
    match kind {
        RecordKind::Registration => REGISTRATION_COLUMNS,
        RecordKind::Contact => CONTACT_COLUMNS,
    }
}

fn quote(cell: &str) -> String {
    format!("\"{}\"", cell.replace('"', "\"\""))
}

/// Render records as a BOM-prefixed CSV document.
pub fn to_csv(kind: RecordKind, records: &[Record]) -> String {
    let columns = columns(kind);
    let mut lines = Vec::with_capacity(records.len() + 1);
    lines.push(
        columns
            .iter()
            .map(|c| c.header)
            .collect::<Vec<_>>()
            .join(","),
    );
    for record in records {
        lines.push(
            columns
                .iter()
                .map(|c| quote(&(c.cell)(record)))
                .collect::<Vec<_>>()
                .join(","),
        );
    }

    let mut out = String::new();
    out.push(UTF8_BOM);
    out.push_str(&lines.join("\n"));
    out
}

pub fn to_json(records: &[Record]) -> Result<String> {
    Ok(serde_json::to_string_pretty(records)?)
}

pub fn render(kind: RecordKind, format: ExportFormat, records: &[Record]) -> Result<String> {
    match format {
        ExportFormat::Csv => Ok(to_csv(kind, records)),
        ExportFormat::Json => to_json(records),
    }
}

pub fn export_file_name(kind: RecordKind, format: ExportFormat, today: NaiveDate) -> String {
    format!(
        "{}_{}.{}",
        kind.plural(),
        today.format("%Y-%m-%d"),
        format.extension()
    )
}
