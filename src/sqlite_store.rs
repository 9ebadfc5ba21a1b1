//! SQLite-backed [`VectorStore`] implementation.
//!
//! A [`SqliteCollections`] handle owns the pool for one `persist_dir` and
//! hands out [`SqliteCollection`]s by name. Each collection records the
//! embedding model and dimensionality that filled it; opening it with a
//! different provider fails with [`CollectionError::ModelMismatch`] unless
//! the caller is about to replace every entry.
//!
//! Similarity search is brute force: every vector in the collection is
//! decoded and scored with cosine similarity, then ranked with
//! [`rank_hits`].

use anyhow::Result;
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use std::path::Path;

use docs_rag_core::embedding::{blob_to_vec, cosine_similarity, vec_to_blob};
use docs_rag_core::index::ReingestPolicy;
use docs_rag_core::models::{EntryMetadata, IndexedEntry, QueryHit};
use docs_rag_core::store::{rank_hits, VectorStore};
use docs_rag_core::PipelineError;

use crate::db;
use crate::migrate;

#[derive(Debug, thiserror::Error)]
pub enum CollectionError {
    #[error(
        "collection '{collection}' was built with model '{stored_model}' ({stored_dims} dims) \
         but the configured model is '{model}' ({dims} dims); re-ingest with reingest = \"replace\""
    )]
    ModelMismatch {
        collection: String,
        stored_model: String,
        stored_dims: usize,
        model: String,
        dims: usize,
    },

    #[error("collection '{0}' does not exist; run `dq ingest` first")]
    NotFound(String),
}

/// Stored identity and size of one collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionInfo {
    pub name: String,
    pub model: String,
    pub dims: usize,
    pub created_at: i64,
    pub entries: u64,
}

impl CollectionInfo {
    fn matches(&self, model: &str, dims: usize) -> bool {
        self.model == model && self.dims == dims
    }

    fn mismatch(&self, model: &str, dims: usize) -> CollectionError {
        CollectionError::ModelMismatch {
            collection: self.name.clone(),
            stored_model: self.model.clone(),
            stored_dims: self.dims,
            model: model.to_string(),
            dims,
        }
    }
}

/// All collections persisted under one directory.
pub struct SqliteCollections {
    pool: SqlitePool,
}

impl SqliteCollections {
    /// Open (creating if needed) the database under `persist_dir` and
    /// bring its schema up to date.
    pub async fn open(persist_dir: &Path) -> Result<Self> {
        let pool = db::connect(persist_dir).await?;
        migrate::run_migrations(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn info(&self, name: &str) -> Result<Option<CollectionInfo>> {
        let row = sqlx::query(
            r#"
            SELECT c.name, c.model, c.dims, c.created_at,
                   (SELECT COUNT(*) FROM entries e WHERE e.collection = c.name) AS entries
            FROM collections c
            WHERE c.name = ?
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| info_from_row(&r)))
    }

    pub async fn list(&self) -> Result<Vec<CollectionInfo>> {
        let rows = sqlx::query(
            r#"
            SELECT c.name, c.model, c.dims, c.created_at,
                   (SELECT COUNT(*) FROM entries e WHERE e.collection = c.name) AS entries
            FROM collections c
            ORDER BY c.name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(info_from_row).collect())
    }

    /// Open `name` for writing with the given provider identity.
    ///
    /// A missing collection is created. An existing one must match
    /// `model`/`dims`, except under [`ReingestPolicy::Replace`], where the
    /// stored identity is rewritten together with the entries.
    pub async fn open_for_ingest(
        &self,
        name: &str,
        model: &str,
        dims: usize,
        policy: ReingestPolicy,
    ) -> Result<SqliteCollection> {
        match self.info(name).await? {
            None => {
                sqlx::query(
                    "INSERT INTO collections (name, model, dims, created_at) VALUES (?, ?, ?, ?)",
                )
                .bind(name)
                .bind(model)
                .bind(dims as i64)
                .bind(chrono::Utc::now().timestamp())
                .execute(&self.pool)
                .await?;
                tracing::info!(collection = name, model, dims, "created collection");
            }
            Some(info) if info.matches(model, dims) => {}
            Some(info) => {
                if policy != ReingestPolicy::Replace {
                    return Err(info.mismatch(model, dims).into());
                }
                tracing::warn!(
                    collection = name,
                    old_model = %info.model,
                    new_model = model,
                    "embedding model changed, collection will be rebuilt"
                );
            }
        }

        Ok(self.handle(name, model, dims))
    }

    /// Open an existing collection for querying with the given provider
    /// identity.
    pub async fn open_for_query(
        &self,
        name: &str,
        model: &str,
        dims: usize,
    ) -> Result<SqliteCollection> {
        let info = self
            .info(name)
            .await?
            .ok_or_else(|| CollectionError::NotFound(name.to_string()))?;
        if !info.matches(model, dims) {
            return Err(info.mismatch(model, dims).into());
        }
        Ok(self.handle(name, model, dims))
    }

    fn handle(&self, name: &str, model: &str, dims: usize) -> SqliteCollection {
        SqliteCollection {
            pool: self.pool.clone(),
            name: name.to_string(),
            model: model.to_string(),
            dims,
        }
    }

    /// Entry counts per source file, largest first.
    pub async fn file_breakdown(&self, name: &str) -> Result<Vec<(String, u64)>> {
        let rows = sqlx::query(
            r#"
            SELECT file, COUNT(*) AS n
            FROM entries
            WHERE collection = ?
            GROUP BY file
            ORDER BY n DESC, file ASC
            "#,
        )
        .bind(name)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|r| (r.get::<String, _>("file"), r.get::<i64, _>("n") as u64))
            .collect())
    }

    pub async fn close(self) {
        self.pool.close().await;
    }
}

fn info_from_row(row: &sqlx::sqlite::SqliteRow) -> CollectionInfo {
    CollectionInfo {
        name: row.get("name"),
        model: row.get("model"),
        dims: row.get::<i64, _>("dims") as usize,
        created_at: row.get("created_at"),
        entries: row.get::<i64, _>("entries") as u64,
    }
}

/// One named collection bound to a provider identity.
pub struct SqliteCollection {
    pool: SqlitePool,
    name: String,
    model: String,
    dims: usize,
}

impl SqliteCollection {
    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn dims(&self) -> usize {
        self.dims
    }

    async fn insert_entries(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
        entries: &[IndexedEntry],
    ) -> Result<()> {
        let now = chrono::Utc::now().timestamp();
        for entry in entries {
            sqlx::query(
                r#"
                INSERT INTO entries (collection, id, document, file, heading, embedding, updated_at)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                ON CONFLICT(collection, id) DO UPDATE SET
                    document = excluded.document,
                    file = excluded.file,
                    heading = excluded.heading,
                    embedding = excluded.embedding,
                    updated_at = excluded.updated_at
                "#,
            )
            .bind(&self.name)
            .bind(&entry.id)
            .bind(&entry.document)
            .bind(&entry.metadata.file)
            .bind(&entry.metadata.heading)
            .bind(vec_to_blob(&entry.vector))
            .bind(now)
            .execute(&mut **tx)
            .await?;
        }
        Ok(())
    }
}

#[async_trait]
impl VectorStore for SqliteCollection {
    fn name(&self) -> &str {
        &self.name
    }

    async fn upsert(&self, entries: &[IndexedEntry]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        self.insert_entries(&mut tx, entries).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn replace_all(&self, entries: &[IndexedEntry]) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM entries WHERE collection = ?")
            .bind(&self.name)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            r#"
            INSERT INTO collections (name, model, dims, created_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(name) DO UPDATE SET
                model = excluded.model,
                dims = excluded.dims
            "#,
        )
        .bind(&self.name)
        .bind(&self.model)
        .bind(self.dims as i64)
        .bind(chrono::Utc::now().timestamp())
        .execute(&mut *tx)
        .await?;

        self.insert_entries(&mut tx, entries).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<QueryHit>> {
        if self.dims != 0 && vector.len() != self.dims {
            return Err(PipelineError::DimensionMismatch {
                expected: self.dims,
                got: vector.len(),
            }
            .into());
        }

        let rows = sqlx::query(
            "SELECT id, document, file, heading, embedding FROM entries WHERE collection = ?",
        )
        .bind(&self.name)
        .fetch_all(&self.pool)
        .await?;

        let hits = rows
            .iter()
            .map(|row| {
                let blob: Vec<u8> = row.get("embedding");
                QueryHit {
                    id: row.get("id"),
                    document: row.get("document"),
                    metadata: EntryMetadata {
                        file: row.get("file"),
                        heading: row.get("heading"),
                    },
                    score: cosine_similarity(vector, &blob_to_vec(&blob)),
                }
            })
            .collect();

        Ok(rank_hits(hits, top_k))
    }

    async fn clear(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM entries WHERE collection = ?")
            .bind(&self.name)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn count(&self) -> Result<u64> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM entries WHERE collection = ?")
            .bind(&self.name)
            .fetch_one(&self.pool)
            .await?;
        Ok(n as u64)
    }
}
