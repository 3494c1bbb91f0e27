//! Assembling the query pipeline from configuration.

use std::sync::Arc;

use anyhow::Result;

use librarian_core::Librarian;

use crate::completion::create_completer;
use crate::config::Config;
use crate::corpus::CorpusFile;
use crate::embedding::create_embedder;
use crate::sqlite_index::SqliteIndex;

/// Build a [`Librarian`] over the SQLite index, the configured gateways and
/// the corpus file.
pub async fn open_librarian(config: &Config) -> Result<Librarian> {
    let index = SqliteIndex::open(&config.index.path).await?;
    let embedder = create_embedder(&config.embedding)?;
    let completer = create_completer(&config.completion)?;

    Ok(Librarian::new(
        embedder,
        completer,
        Arc::new(index),
        Arc::new(CorpusFile::new(&config.corpus.path)),
        config.librarian_settings(),
    ))
}
