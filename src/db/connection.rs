use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use directories::ProjectDirs;
use rusqlite::{params, Connection, OptionalExtension};

/// SQLite file name stored inside the application data directory.
const DB_FILE_NAME: &str = "diary.sqlite";

/// Open (or create) the key-value database inside `data_dir` and make sure the
/// blob table exists.
pub fn open_store(data_dir: &Path) -> Result<Connection> {
    fs::create_dir_all(data_dir).context("failed to create data directory")?;

    let conn = Connection::open(data_dir.join(DB_FILE_NAME))
        .context("failed to open SQLite database")?;
    ensure_schema(&conn)?;
    Ok(conn)
}

/// Create the single `kv` table. Each row holds one whole JSON blob, so a
/// write replaces a value in one statement and readers never observe a
/// half-written snapshot.
pub fn ensure_schema(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS kv (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )",
        [],
    )
    .context("failed to create kv table")?;
    Ok(())
}

/// Fetch the raw blob stored under `key`, if any.
pub(crate) fn read_blob(conn: &Connection, key: &str) -> Result<Option<String>> {
    conn.query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
        row.get(0)
    })
    .optional()
    .with_context(|| format!("failed to read '{key}'"))
}

/// Replace the blob stored under `key`.
pub(crate) fn write_blob(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO kv (key, value) VALUES (?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        params![key, value],
    )
    .with_context(|| format!("failed to write '{key}'"))?;
    Ok(())
}

/// Resolve the default data directory for the current platform.
pub fn default_data_dir() -> Result<PathBuf> {
    let dirs = ProjectDirs::from("", "", "media-diary")
        .ok_or_else(|| anyhow!("could not locate home directory"))?;
    Ok(dirs.data_dir().to_path_buf())
}
