//! # Smart Librarian
//!
//! A retrieval-augmented book recommender. A curated corpus of book records
//! is embedded into a local vector index; at query time the closest books
//! ground a chat model that recommends exactly one of them, and the full
//! synopsis of the chosen title is looked up in the corpus.
//!
//! The pipeline itself lives in [`librarian_core`]. This crate supplies the
//! concrete backends and the surfaces around it.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌──────────────┐   ┌──────────────┐
//! │ books.json  │──▶│ compose+embed │──▶│ SQLite index │
//! └─────────────┘   └──────────────┘   └──────┬───────┘
//!                                             │ kNN
//!                      ┌──────────────────────┤
//!                      ▼                      ▼
//!                 ┌──────────┐          ┌──────────┐
//!                 │   CLI    │          │   HTTP   │
//!                 │(librarian)│         │  (axum)  │
//!                 └──────────┘          └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! export OPENAI_API_KEY=sk-...
//! librarian init
//! librarian ingest --reset
//! librarian ask "I want a story about friendship and magic"
//! librarian serve
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration and environment overrides |
//! | [`openai`] | Retrying client for OpenAI-compatible endpoints |
//! | [`embedding`] | Embedding gateways |
//! | [`completion`] | Chat completion gateways |
//! | [`sqlite_index`] | SQLite-backed vector index |
//! | [`corpus`] | Corpus file loading and summary lookup |
//! | [`server`] | HTTP endpoint |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema creation |

pub mod app;
pub mod ask;
pub mod completion;
pub mod config;
pub mod corpus;
pub mod db;
pub mod embedding;
pub mod ingest;
pub mod migrate;
pub mod openai;
pub mod search;
pub mod server;
pub mod sqlite_index;
pub mod stats;
