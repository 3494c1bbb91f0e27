//! `librarian ask`: one-shot or interactive recommendations.

use anyhow::{bail, Result};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use librarian_core::{Librarian, Recommendation};

use crate::app::open_librarian;
use crate::config::Config;

pub async fn run_ask(config: &Config, query: Option<String>) -> Result<()> {
    let librarian = open_librarian(config).await?;

    match query {
        Some(query) => {
            if query.trim().is_empty() {
                bail!("query must not be empty");
            }
            let rec = librarian.recommend(query.trim()).await?;
            println!("{}", render(&rec));
        }
        None => prompt_loop(&librarian).await?,
    }

    Ok(())
}

/// Read queries from stdin, one per line, until EOF. Blank lines are
/// skipped; a failed query or an undecodable line is reported and the loop
/// continues.
async fn prompt_loop(librarian: &Librarian) -> Result<()> {
    eprintln!("Smart Librarian: ask about themes or interests (Ctrl+D to exit)");
    run_prompt_loop(
        librarian,
        BufReader::new(tokio::io::stdin()),
        tokio::io::stderr(),
    )
    .await
}

async fn run_prompt_loop<R, W>(librarian: &Librarian, input: R, mut prompt: W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.split(b'\n');

    loop {
        prompt.write_all(b"? ").await?;
        prompt.flush().await?;

        let bytes = match lines.next_segment().await? {
            Some(bytes) => bytes,
            None => break,
        };
        let line = match String::from_utf8(bytes) {
            Ok(line) => line,
            Err(_) => {
                prompt.write_all(b"Error: input line is not valid UTF-8\n").await?;
                continue;
            }
        };
        let query = line.trim();
        if query.is_empty() {
            continue;
        }

        match librarian.recommend(query).await {
            Ok(rec) => println!("{}\n", render(&rec)),
            Err(e) => {
                prompt
                    .write_all(format!("Error: {:#}\n", e).as_bytes())
                    .await?;
            }
        }
    }

    prompt.flush().await?;
    Ok(())
}

/// Terminal rendering: answer, resolved summary, usage footer.
pub fn render(rec: &Recommendation) -> String {
    let mut out = rec.answer.clone();
    if let Some(summary) = &rec.summary {
        out.push_str(&format!("\n\nSummary for: {}\n{}", rec.title, summary));
    }
    out.push_str("\n\n");
    out.push_str(&rec.usage.footer());
    out
}
