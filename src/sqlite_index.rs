//! SQLite-backed [`VectorIndex`] implementation.
//!
//! Entries live in the `entries` table with their embedding stored as a
//! little-endian `f32` BLOB. Queries load a collection's vectors and rank
//! them in process, the same brute-force scan the in-memory index performs.

use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};

use librarian_core::embedding::{blob_to_vec, vec_to_blob, Distance};
use librarian_core::models::{Candidate, IndexedDocument, Metadata};
use librarian_core::store::{rank_candidates, VectorIndex};

use crate::db;
use crate::migrate::ensure_schema;

/// Per-collection summary, as shown by `librarian stats`.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionStats {
    pub name: String,
    pub distance: String,
    pub dims: Option<i64>,
    pub entries: i64,
    /// Latest entry write, Unix seconds.
    pub last_updated: Option<i64>,
}

/// SQLite implementation of the [`VectorIndex`] trait.
pub struct SqliteIndex {
    pool: SqlitePool,
}

impl SqliteIndex {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to the index file and make sure the schema exists.
    pub async fn open(path: &Path) -> Result<Self> {
        let pool = db::connect(path)
            .await
            .with_context(|| format!("Failed to open index: {}", path.display()))?;
        ensure_schema(&pool).await?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// All collections with their entry counts, by name.
    pub async fn collections(&self) -> Result<Vec<CollectionStats>> {
        let rows = sqlx::query(
            r#"
            SELECT c.name, c.distance, c.dims, COUNT(e.id) AS entries,
                   MAX(e.updated_at) AS last_updated
            FROM collections c
            LEFT JOIN entries e ON e.collection = c.name
            GROUP BY c.name
            ORDER BY c.name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| CollectionStats {
                name: row.get("name"),
                distance: row.get("distance"),
                dims: row.get("dims"),
                entries: row.get("entries"),
                last_updated: row.get("last_updated"),
            })
            .collect())
    }

    async fn collection_info(&self, name: &str) -> Result<Option<(Distance, Option<usize>)>> {
        let row = sqlx::query("SELECT distance, dims FROM collections WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let distance: String = row.get("distance");
                let dims: Option<i64> = row.get("dims");
                Ok(Some((distance.parse()?, dims.map(|d| d as usize))))
            }
            None => Ok(None),
        }
    }
}

#[async_trait]
impl VectorIndex for SqliteIndex {
    async fn get_or_create_collection(&self, name: &str, distance: Distance) -> Result<()> {
        let now = chrono::Utc::now().timestamp();
        sqlx::query(
            r#"
            INSERT INTO collections (name, distance, dims, created_at)
            VALUES (?, ?, NULL, ?)
            ON CONFLICT(name) DO NOTHING
            "#,
        )
        .bind(name)
        .bind(distance.as_str())
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_collection(&self, name: &str) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM entries WHERE collection = ?")
            .bind(name)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM collections WHERE name = ?")
            .bind(name)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn upsert(&self, collection: &str, documents: &[IndexedDocument]) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query("SELECT dims FROM collections WHERE name = ?")
            .bind(collection)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| anyhow!("collection not found: {}", collection))?;
        let stored: Option<i64> = row.get("dims");

        let mut dims = stored.map(|d| d as usize);
        for doc in documents {
            match dims {
                Some(d) if d != doc.embedding.len() => bail!(
                    "embedding for '{}' has {} dimensions, collection '{}' expects {}",
                    doc.id,
                    doc.embedding.len(),
                    collection,
                    d
                ),
                _ => dims = Some(doc.embedding.len()),
            }
        }

        if stored.is_none() {
            if let Some(d) = dims {
                sqlx::query("UPDATE collections SET dims = ? WHERE name = ?")
                    .bind(d as i64)
                    .bind(collection)
                    .execute(&mut *tx)
                    .await?;
            }
        }

        let now = chrono::Utc::now().timestamp();
        for doc in documents {
            let metadata_json = serde_json::to_string(&doc.metadata)?;
            sqlx::query(
                r#"
                INSERT INTO entries (collection, id, document, metadata_json, embedding, updated_at)
                VALUES (?, ?, ?, ?, ?, ?)
                ON CONFLICT(collection, id) DO UPDATE SET
                    document = excluded.document,
                    metadata_json = excluded.metadata_json,
                    embedding = excluded.embedding,
                    updated_at = excluded.updated_at
                "#,
            )
            .bind(collection)
            .bind(&doc.id)
            .bind(&doc.document)
            .bind(&metadata_json)
            .bind(vec_to_blob(&doc.embedding))
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn query(&self, collection: &str, vector: &[f32], k: usize) -> Result<Vec<Candidate>> {
        let (distance, dims) = match self.collection_info(collection).await? {
            Some(info) => info,
            None => return Ok(Vec::new()),
        };

        if let Some(d) = dims {
            if d != vector.len() {
                bail!(
                    "query vector has {} dimensions, collection '{}' expects {}",
                    vector.len(),
                    collection,
                    d
                );
            }
        }

        let rows = sqlx::query(
            "SELECT id, document, metadata_json, embedding FROM entries WHERE collection = ?",
        )
        .bind(collection)
        .fetch_all(&self.pool)
        .await?;

        let mut candidates = Vec::with_capacity(rows.len());
        for row in &rows {
            let id: String = row.get("id");
            let metadata_json: String = row.get("metadata_json");
            let metadata: Metadata = serde_json::from_str(&metadata_json)
                .with_context(|| format!("corrupt metadata for entry '{}'", id))?;
            let blob: Vec<u8> = row.get("embedding");
            let embedding = blob_to_vec(&blob);

            candidates.push(Candidate {
                id,
                document: row.get("document"),
                metadata,
                distance: distance.between(vector, &embedding),
            });
        }

        rank_candidates(&mut candidates, k);
        Ok(candidates)
    }

    async fn count(&self, collection: &str) -> Result<usize> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM entries WHERE collection = ?")
            .bind(collection)
            .fetch_one(&self.pool)
            .await?;
        Ok(count as usize)
    }
}
