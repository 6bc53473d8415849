use anyhow::{Context, Result};
use rusqlite::Connection;
use tracing::error;

use super::connection::{read_blob, write_blob};

/// Key of the collection-name blob.
pub const COLLECTIONS_KEY: &str = "collections";

/// Load every collection name in insertion order, or nothing when the blob is
/// missing or unreadable.
pub fn load_collections(conn: &Connection) -> Vec<String> {
    let result: Result<Vec<String>> = read_blob(conn, COLLECTIONS_KEY).and_then(|raw| match raw {
        Some(raw) => serde_json::from_str(&raw).context("collections blob is corrupt"),
        None => Ok(Vec::new()),
    });

    result.unwrap_or_else(|err| {
        error!(error = %format!("{err:#}"), "failed to load collections");
        Vec::new()
    })
}

/// Overwrite the stored collection list. Failures are logged and reported as
/// `false`.
pub fn save_collections(conn: &Connection, names: &[String]) -> bool {
    let result = serde_json::to_string(names)
        .context("failed to serialize collections")
        .and_then(|raw| write_blob(conn, COLLECTIONS_KEY, &raw));

    if let Err(err) = result {
        error!(error = %format!("{err:#}"), "failed to save collections");
        return false;
    }
    true
}

/// Append `name` unless an identical name already exists. Returns the list
/// after the call.
pub fn add_collection(conn: &Connection, name: &str) -> Vec<String> {
    let mut names = load_collections(conn);
    if !names.iter().any(|existing| existing == name) {
        names.push(name.to_string());
        save_collections(conn, &names);
    }
    names
}
