//! `librarian ingest`: load the corpus file and (re)build the index.

use std::path::PathBuf;

use anyhow::Result;

use librarian_core::ingest::{ingest, IngestReport};

use crate::config::Config;
use crate::corpus::load_records;
use crate::embedding::create_embedder;
use crate::sqlite_index::SqliteIndex;

pub async fn run_ingest(config: &Config, input: Option<PathBuf>, reset: bool) -> Result<()> {
    let path = input.unwrap_or_else(|| config.corpus.path.clone());
    let records = load_records(&path)?;

    let index = SqliteIndex::open(&config.index.path).await?;
    let embedder = create_embedder(&config.embedding)?;
    let params = config.ingest_params();

    let report = ingest(embedder.as_ref(), &index, &params, &records, reset).await?;
    let cost = config
        .price_table()
        .embedding_cost(embedder.model_name(), report.embedding_tokens);

    print_report(&params.collection, &path, &report, embedder.model_name(), cost);
    index.pool().close().await;
    Ok(())
}

fn print_report(
    collection: &str,
    input: &std::path::Path,
    report: &IngestReport,
    model: &str,
    cost: f64,
) {
    println!("ingest {} <- {}", collection, input.display());
    println!("  documents upserted: {}", report.documents);
    println!("  batches: {}", report.batches);
    println!("  embedding tokens: {}", report.embedding_tokens);
    println!("  estimated cost: ${:.6} ({})", cost, model);
    println!("ok");
}
