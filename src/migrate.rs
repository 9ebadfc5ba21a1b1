use anyhow::Result;
use sqlx::SqlitePool;

/// Create the collection schema. Safe to run on every open.
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    // One row per named collection, pinned to the model that filled it
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS collections (
            name TEXT PRIMARY KEY,
            model TEXT NOT NULL,
            dims INTEGER NOT NULL,
            created_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS entries (
            collection TEXT NOT NULL,
            id TEXT NOT NULL,
            document TEXT NOT NULL,
            file TEXT NOT NULL,
            heading TEXT NOT NULL,
            embedding BLOB NOT NULL,
            updated_at INTEGER NOT NULL,
            PRIMARY KEY (collection, id),
            FOREIGN KEY (collection) REFERENCES collections(name)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_entries_file ON entries(collection, file)")
        .execute(pool)
        .await?;

    Ok(())
}
