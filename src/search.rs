//! `librarian search`: retrieval only, no completion call.

use anyhow::Result;

use librarian_core::models::metadata_text;
use librarian_core::retrieve::{retrieve, Retrieval};

use crate::config::Config;
use crate::embedding::create_embedder;
use crate::sqlite_index::SqliteIndex;

pub async fn run_search(config: &Config, query: &str) -> Result<()> {
    if query.trim().is_empty() {
        println!("No results.");
        return Ok(());
    }

    let index = SqliteIndex::open(&config.index.path).await?;
    let embedder = create_embedder(&config.embedding)?;

    let result = retrieve(
        embedder.as_ref(),
        &index,
        &config.retrieval_params(),
        query.trim(),
    )
    .await?;

    print_results(&result);
    index.pool().close().await;
    Ok(())
}

fn print_results(result: &Retrieval) {
    if result.candidates.is_empty() {
        println!("No results.");
    }

    for (i, c) in result.candidates.iter().enumerate() {
        let title = c.title();
        let title_display = if title.is_empty() { "(untitled)" } else { title.as_str() };
        println!("{}. [{:.4}] {}", i + 1, c.distance, title_display);

        let authors = metadata_text(&c.metadata, "authors");
        if !authors.is_empty() {
            println!("    authors: {}", authors);
        }
        let year = metadata_text(&c.metadata, "year");
        if !year.is_empty() {
            println!("    year: {}", year);
        }
        let themes = metadata_text(&c.metadata, "themes");
        if !themes.is_empty() {
            println!("    themes: {}", themes);
        }
        println!("    id: {}", c.id);
        println!();
    }

    println!("embedding tokens: {}", result.embedding_tokens);
}
