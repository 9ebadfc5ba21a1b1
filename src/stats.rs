//! Collection statistics.
//!
//! Used by `dq stats` to show what is indexed: entries per collection,
//! the embedding model that produced them, and the largest source files.

use anyhow::Result;

use crate::config::Config;
use crate::db;
use crate::sqlite_store::SqliteCollections;

const TOP_FILES: usize = 10;

pub async fn run_stats(config: &Config) -> Result<()> {
    let collections = SqliteCollections::open(&config.store.persist_dir).await?;
    let db_path = db::db_path(&config.store.persist_dir);
    let db_size = std::fs::metadata(&db_path).map(|m| m.len()).unwrap_or(0);

    println!("Collections");
    println!("===========");
    println!();
    println!("  Database:    {}", db_path.display());
    println!("  Size:        {}", format_bytes(db_size));
    println!();

    let all = collections.list().await?;
    if all.is_empty() {
        println!("  No collections yet. Run `dq ingest`.");
        collections.close().await;
        return Ok(());
    }

    for info in &all {
        let marker = if info.name == config.store.collection {
            " (configured)"
        } else {
            ""
        };
        let created = chrono::DateTime::from_timestamp(info.created_at, 0)
            .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default();

        let files = collections.file_breakdown(&info.name).await?;

        println!("  {}{}", info.name, marker);
        println!("    model:     {} ({} dims)", info.model, info.dims);
        println!("    entries:   {}", info.entries);
        println!("    files:     {}", files.len());
        println!("    created:   {}", created);
        for (file, n) in files.iter().take(TOP_FILES) {
            println!("      {:>6}  {}", n, file);
        }
        println!();
    }

    collections.close().await;
    Ok(())
}

fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
