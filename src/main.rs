//! # Smart Librarian CLI (`librarian`)
//!
//! ## Usage
//!
//! ```bash
//! librarian --config ./config/librarian.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `librarian init` | Create the SQLite index and its schema |
//! | `librarian ingest` | Embed the corpus into the index |
//! | `librarian ask "<query>"` | Recommend one book (interactive without a query) |
//! | `librarian search "<query>"` | Show the retrieved candidates only |
//! | `librarian summary "<title>"` | Print a title's synopsis from the corpus |
//! | `librarian stats` | Per-collection entry counts |
//! | `librarian serve` | Start the HTTP endpoint |
//!
//! Logging goes to stderr and is controlled by `RUST_LOG` (default `warn`).

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use smart_librarian::{ask, config, corpus, ingest, migrate, search, server, stats};

/// Smart Librarian: book recommendations grounded in a local vector index.
#[derive(Parser)]
#[command(
    name = "librarian",
    about = "Smart Librarian: retrieval-augmented book recommendations",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/librarian.toml`. Built-in defaults are used
    /// when the file does not exist.
    #[arg(long, global = true, default_value = "./config/librarian.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the index schema. Safe to run repeatedly.
    Init,

    /// Embed the corpus and upsert it into the index.
    Ingest {
        /// Corpus file to read instead of `[corpus].path`.
        #[arg(long)]
        input: Option<PathBuf>,

        /// Drop the collection before ingesting.
        #[arg(long)]
        reset: bool,
    },

    /// Ask for a recommendation.
    ///
    /// Without a query, reads one query per line from stdin until EOF.
    Ask {
        /// The reader's question.
        query: Option<String>,
    },

    /// Show the candidates retrieved for a query, without a completion call.
    Search {
        /// The search query string.
        query: String,
    },

    /// Print the full synopsis of a title from the corpus.
    Summary {
        /// Book title (matched case-insensitively).
        title: String,
    },

    /// Show index statistics.
    Stats,

    /// Start the HTTP server on `[server].bind`.
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Index initialized at {}", cfg.index.path.display());
        }
        Commands::Ingest { input, reset } => {
            ingest::run_ingest(&cfg, input, reset).await?;
        }
        Commands::Ask { query } => {
            ask::run_ask(&cfg, query).await?;
        }
        Commands::Search { query } => {
            search::run_search(&cfg, &query).await?;
        }
        Commands::Summary { title } => {
            corpus::run_summary(&cfg, &title)?;
        }
        Commands::Stats => {
            stats::run_stats(&cfg).await?;
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}
