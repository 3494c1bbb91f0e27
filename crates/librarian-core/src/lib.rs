//! # Smart Librarian Core
//!
//! Shared, WASM-safe logic for Smart Librarian: the book data model,
//! document composition, capability traits for the embedding, completion
//! and vector-index backends, and the retrieval-augmented recommendation
//! pipeline built on top of them.
//!
//! This crate contains no tokio, sqlx, HTTP, or filesystem I/O. Concrete
//! backends (OpenAI-compatible gateways, the SQLite index, the corpus file)
//! live in the `smart-librarian` app crate; tests substitute in-memory fakes.
//!
//! ## Query path
//!
//! ```text
//! query ─▶ retrieve (embed + kNN) ─▶ prompt ─▶ completion ─▶ parse title
//!                                                               │
//!                              usage + cost ◀── summary lookup ◀┘
//! ```
//!
//! ## Ingestion path
//!
//! ```text
//! records ─▶ compose ─▶ embed (batches of 128) ─▶ upsert
//! ```

pub mod catalog;
pub mod completion;
pub mod compose;
pub mod embedding;
pub mod error;
pub mod ingest;
pub mod librarian;
pub mod models;
pub mod parse;
pub mod pricing;
pub mod prompt;
pub mod retrieve;
pub mod store;

pub use error::GatewayError;
pub use librarian::{Librarian, LibrarianSettings, Recommendation};
pub use models::{BookRecord, Candidate, IndexedDocument, Metadata, MetadataValue};
