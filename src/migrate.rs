use anyhow::Result;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::db;

/// Create the index file and its schema (`librarian init`).
pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(&config.index.path).await?;
    ensure_schema(&pool).await?;
    pool.close().await;
    Ok(())
}

/// Create the index tables if they do not exist. Idempotent.
pub async fn ensure_schema(pool: &SqlitePool) -> Result<()> {
    // One row per collection; dims is fixed by the first upsert
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS collections (
            name TEXT PRIMARY KEY,
            distance TEXT NOT NULL,
            dims INTEGER,
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
            metadata_json TEXT NOT NULL DEFAULT '{}',
            embedding BLOB NOT NULL,
            updated_at INTEGER NOT NULL,
            PRIMARY KEY (collection, id),
            FOREIGN KEY (collection) REFERENCES collections(name)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_entries_collection ON entries(collection)")
        .execute(pool)
        .await?;

    Ok(())
}
