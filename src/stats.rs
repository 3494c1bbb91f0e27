//! Index statistics.
//!
//! `librarian stats` prints the index file, its size, and per-collection
//! entry counts, to confirm an ingestion run landed where expected.

use anyhow::Result;

use crate::config::Config;
use crate::sqlite_index::SqliteIndex;

/// Run the stats command: query the index and print a summary.
pub async fn run_stats(config: &Config) -> Result<()> {
    let index = SqliteIndex::open(&config.index.path).await?;
    let collections = index.collections().await?;

    let db_size = std::fs::metadata(&config.index.path)
        .map(|m| m.len())
        .unwrap_or(0);

    println!("Smart Librarian: Index Stats");
    println!("============================");
    println!();
    println!("  Index:       {}", config.index.path.display());
    println!("  Size:        {}", format_bytes(db_size));
    println!("  Corpus:      {}", config.corpus.path.display());
    println!();

    if collections.is_empty() {
        println!("  No collections. Run `librarian ingest` first.");
    } else {
        println!(
            "  {:<24} {:>8} {:>8} {:>6}   {}",
            "COLLECTION", "DISTANCE", "ENTRIES", "DIMS", "LAST WRITE"
        );
        println!("  {}", "-".repeat(70));
        for c in &collections {
            let dims = c.dims.map(|d| d.to_string()).unwrap_or_else(|| "-".into());
            let written = match c.last_updated {
                Some(ts) => format_ts_relative(ts),
                None => "never".to_string(),
            };
            println!(
                "  {:<24} {:>8} {:>8} {:>6}   {}",
                c.name, c.distance, c.entries, dims, written
            );
        }
    }

    println!();
    index.pool().close().await;
    Ok(())
}

/// Format a byte count as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

/// Format a Unix timestamp relative to now (e.g. "3 hours ago").
fn format_ts_relative(ts: i64) -> String {
    let delta = chrono::Utc::now().timestamp() - ts;

    if delta < 0 {
        format_ts_iso(ts)
    } else if delta < 60 {
        "just now".to_string()
    } else if delta < 3600 {
        plural(delta / 60, "min")
    } else if delta < 86400 {
        plural(delta / 3600, "hour")
    } else if delta < 86400 * 30 {
        plural(delta / 86400, "day")
    } else {
        format_ts_iso(ts)
    }
}

fn plural(n: i64, unit: &str) -> String {
    format!("{} {}{} ago", n, unit, if n == 1 { "" } else { "s" })
}

fn format_ts_iso(ts: i64) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| ts.to_string())
}
