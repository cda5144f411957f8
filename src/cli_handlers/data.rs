use chrono::Local;
use serde_json::Value;
use std::path::{Path, PathBuf};

use crate::error::{IntakeError, Result};
use crate::export::{self, ExportFormat};
use crate::intake;
use crate::records::RecordKind;
use crate::search::RecordFilter;
use crate::store::Datastore;

/// Flags accepted by `intake export`
#[derive(Debug, Clone, Default)]
pub struct ExportOptions {
    pub format: ExportFormat,
    pub output: Option<PathBuf>,
    pub status: Option<String>,
    pub course: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
}

/// Export to a file, or to stdout when no output path is given
pub async fn handle_export_command(
    store: &Datastore,
    kind: RecordKind,
    options: ExportOptions,
) -> Result<()> {
    let filter = RecordFilter::from_raw(
        None,
        options.status.as_deref(),
        options.course.as_deref(),
        options.from.as_deref(),
        options.to.as_deref(),
    )?;
    let records = filter.apply(store.store(kind).load().await?);
    let body = export::render(kind, options.format, &records)?;

    match options.output {
        Some(path) => {
            tokio::fs::write(&path, body).await?;
            println!(
                "✓ Exported {} {}(s) to {}",
                records.len(),
                kind,
                path.display()
            );
        },
        None => print!("{}", body),
    }

    tracing::debug!(kind = %kind, count = records.len(), "Export finished");
    Ok(())
}

pub async fn handle_import_command(
    store: &Datastore,
    kind: RecordKind,
    file: &Path,
    replace: bool,
) -> Result<()> {
    let raw = tokio::fs::read_to_string(file).await?;
    let Value::Array(items) = serde_json::from_str(&raw)? else {
        return Err(IntakeError::InvalidInput(format!(
            "{} must contain a JSON array",
            file.display()
        )));
    };

    let records = intake::prepare_import(kind, items, Local::now())?;
    let imported = records.len();
    let total = store.store(kind).import(records, replace).await?;

    println!(
        "✓ Imported {} {}(s) from {} ({} {})",
        imported,
        kind,
        file.display(),
        total,
        if replace { "stored, previous data replaced" } else { "stored" }
    );
    Ok(())
}
