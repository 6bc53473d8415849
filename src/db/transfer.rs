use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::{SecondsFormat, Utc};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use super::collections::{load_collections, save_collections};
use super::records::{load_records, save_records};
use crate::models::Record;

/// Shape of an export file.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    pub records: Vec<Record>,
    pub collections: Vec<String>,
    pub exported_at: String,
}

/// Counts reported after an import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImportSummary {
    pub records: usize,
    pub collections: usize,
}

/// Snapshot both stores into a pretty-printed export document.
pub fn export_to_json(conn: &Connection) -> Result<String> {
    let document = ExportDocument {
        records: load_records(conn),
        collections: load_collections(conn),
        exported_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    };
    serde_json::to_string_pretty(&document).context("failed to serialize export")
}

/// File name for an export taken today.
pub fn export_file_name() -> String {
    format!("movie_book_records_{}.json", Utc::now().format("%Y-%m-%d"))
}

/// Write an export into `dir`, returning the path of the new file.
pub fn export_to_dir(conn: &Connection, dir: &Path) -> Result<PathBuf> {
    let body = export_to_json(conn)?;
    fs::create_dir_all(dir).context("failed to create export directory")?;
    let path = dir.join(export_file_name());
    fs::write(&path, body).with_context(|| format!("failed to write {}", path.display()))?;
    info!(path = %path.display(), "exported diary");
    Ok(path)
}

/// Replace the stores with whatever arrays `text` carries. A key that is
/// absent, or present but not an array, leaves its store alone. Malformed
/// JSON is returned as an error and nothing is written; a store that cannot
/// be written is an error too.
pub fn import_from_json(conn: &Connection, text: &str) -> Result<ImportSummary> {
    let document: Value = serde_json::from_str(text).context("import file is not valid JSON")?;

    let records = match document.get("records") {
        Some(value @ Value::Array(_)) => Some(
            serde_json::from_value::<Vec<Record>>(value.clone())
                .context("import file has malformed records")?,
        ),
        _ => None,
    };
    let collections = match document.get("collections") {
        Some(value @ Value::Array(_)) => Some(
            serde_json::from_value::<Vec<String>>(value.clone())
                .context("import file has malformed collections")?,
        ),
        _ => None,
    };

    let mut summary = ImportSummary::default();
    if let Some(records) = records {
        if !save_records(conn, &records) {
            bail!("failed to store imported records");
        }
        summary.records = records.len();
    }
    if let Some(collections) = collections {
        if !save_collections(conn, &collections) {
            bail!("failed to store imported collections");
        }
        summary.collections = collections.len();
    }

    info!(
        records = summary.records,
        collections = summary.collections,
        "imported diary"
    );
    Ok(summary)
}

/// Read an export file from disk and import it.
pub fn import_from_file(conn: &Connection, path: &Path) -> Result<ImportSummary> {
    let text =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    import_from_json(conn, &text)
}
