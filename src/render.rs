use clap::ValueEnum;
use serde::Serialize;
use std::io::{self, Write};

use crate::results::SearchResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

/// One query's results as emitted by `search --output json`.
#[derive(Debug, Serialize)]
pub struct QueryReport<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<&'a str>,
    pub query: String,
    pub results: &'a [SearchResult],
}

pub fn render_results<W: Write>(out: &mut W, results: &[SearchResult], format: OutputFormat) -> io::Result<()> {
    match format {
        OutputFormat::Json => write_json(out, results),
        OutputFormat::Table => render_table(out, results),
    }
}

fn render_table<W: Write>(out: &mut W, results: &[SearchResult]) -> io::Result<()> {
    if results.is_empty() {
        writeln!(out, "No matches found.")?;
        return Ok(());
    }

    for item in results {
        writeln!(out, "{} :: {} (score {:.2})", item.repository, item.path, item.score)?;
        writeln!(out, "  {}", item.url)?;
        if let Some(snippet) = item.snippet.as_deref().filter(|s| !s.is_empty()) {
            writeln!(out, "  Snippet:\n  {}", snippet.replace('\n', "\n  "))?;
        }
        writeln!(out)?;
    }
    Ok(())
}

/// Pretty JSON (two-space indent) followed by a newline.
pub fn write_json<W: Write, T: Serialize + ?Sized>(out: &mut W, value: &T) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)
}
