//! SQLite connection for the persistent vector collections.
//!
//! All collections under one `persist_dir` share a single database file,
//! `collections.sqlite`, opened in WAL mode so a `retrieve` can read while
//! an `ingest` writes.

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const DB_FILE_NAME: &str = "collections.sqlite";

pub fn db_path(persist_dir: &Path) -> PathBuf {
    persist_dir.join(DB_FILE_NAME)
}

pub async fn connect(persist_dir: &Path) -> Result<SqlitePool> {
    std::fs::create_dir_all(persist_dir).with_context(|| {
        format!(
            "Failed to create persist directory: {}",
            persist_dir.display()
        )
    })?;

    let path = db_path(persist_dir);
    let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", path.display()))?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
        .with_context(|| format!("Failed to open database: {}", path.display()))?;

    Ok(pool)
}
