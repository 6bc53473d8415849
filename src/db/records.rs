use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::Connection;
use tracing::{debug, error};
use uuid::Uuid;

use super::connection::{read_blob, write_blob};
use crate::models::Record;

/// Key of the records blob. Shared with export files of older diaries.
pub const RECORDS_KEY: &str = "movie_book_records";

/// Load every record in stored order. A missing blob is an empty diary; a
/// blob that cannot be read or parsed is logged and also treated as empty so
/// the UI can keep going.
pub fn load_records(conn: &Connection) -> Vec<Record> {
    match try_load_records(conn) {
        Ok(records) => records,
        Err(err) => {
            error!(error = %format!("{err:#}"), "failed to load records");
            Vec::new()
        }
    }
}

fn try_load_records(conn: &Connection) -> Result<Vec<Record>> {
    match read_blob(conn, RECORDS_KEY)? {
        Some(raw) => serde_json::from_str(&raw).context("records blob is corrupt"),
        None => Ok(Vec::new()),
    }
}

/// Serialize the whole sequence back to storage. Returns `false` (after
/// logging) instead of an error when the write fails.
pub fn save_records(conn: &Connection, records: &[Record]) -> bool {
    let result = serde_json::to_string(records)
        .context("failed to serialize records")
        .and_then(|raw| write_blob(conn, RECORDS_KEY, &raw));

    match result {
        Ok(()) => {
            debug!(count = records.len(), "saved records");
            true
        }
        Err(err) => {
            error!(error = %format!("{err:#}"), "failed to save records");
            false
        }
    }
}

/// Insert-or-replace by id. Existing records are merged in place (the
/// incoming values win, `created_at` survives, `updated_at` is refreshed);
/// new records get an id if they lack one, both timestamps, and go to the
/// front of the list. Returns the record as stored.
pub fn upsert_record(conn: &Connection, record: Record) -> Record {
    let mut records = load_records(conn);
    let now = now_millis();

    let stored = match records.iter_mut().find(|r| !record.id.is_empty() && r.id == record.id) {
        Some(existing) => {
            let created_at = record.created_at.or(existing.created_at);
            *existing = Record {
                created_at,
                updated_at: Some(now),
                ..record
            };
            existing.clone()
        }
        None => {
            let id = if record.id.is_empty() {
                generate_id()
            } else {
                record.id.clone()
            };
            let fresh = Record {
                id,
                created_at: Some(now),
                updated_at: Some(now),
                ..record
            };
            records.insert(0, fresh.clone());
            fresh
        }
    };

    save_records(conn, &records);
    stored
}

/// Remove the record with `id`. Unknown ids leave the store untouched.
pub fn delete_record(conn: &Connection, id: &str) {
    let mut records = load_records(conn);
    let before = records.len();
    records.retain(|r| r.id != id);
    if records.len() != before {
        save_records(conn, &records);
    }
}

/// Globally unique record id.
pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}

/// Current wall-clock time in Unix epoch milliseconds.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}
