//! Subcommand handlers. Each returns the process exit code on success.

use futures::StreamExt;
use std::fs;
use std::io::{self, Write};
use tracing::info;

use crate::args::{
    Args, Command, FetchArgs, QueriesCommand, QuerySource, SearchArgs, SweepArgs, TokenCommand,
};
use crate::config::{delete_token, resolve_token, store_token, token_status, TOKEN_ENV_VAR};
use crate::error::{Error, Result};
use crate::github_searcher::GitHubSearcher;
use crate::query::{build_specs, parse_qualifiers, QuerySpec};
use crate::render::{render_results, write_json, OutputFormat, QueryReport};
use crate::results::SearchResult;
use crate::runner::SearchRunner;
use crate::saved_queries::QueryStore;

pub async fn run(args: Args) -> Result<u8> {
    match args.command {
        Command::Search(search) => handle_search(&args.api_url, search).await,
        Command::Sweep(sweep) => handle_sweep(&args.api_url, sweep).await,
        Command::Queries { command } => handle_queries(command),
        Command::Token { command } => handle_token(command),
    }
}

/// A query to execute plus the label it is reported under.
struct Job {
    name: Option<String>,
    spec: QuerySpec,
}

async fn handle_search(api_url: &str, args: SearchArgs) -> Result<u8> {
    let qualifiers = parse_qualifiers(&args.fetch.qualifiers);
    let texts = collect_query_texts(&args.source)?;
    let specs = build_specs(&texts, &qualifiers, args.split_lines);
    if specs.is_empty() {
        return Err(Error::Config("No queries to execute".to_string()));
    }

    let jobs = specs
        .into_iter()
        .map(|spec| Job { name: None, spec })
        .collect();
    execute(api_url, &args.fetch, jobs).await?;
    Ok(0)
}

async fn handle_sweep(api_url: &str, args: SweepArgs) -> Result<u8> {
    let extra = parse_qualifiers(&args.fetch.qualifiers);
    let names = (!args.names.is_empty()).then_some(args.names.as_slice());
    let saved = QueryStore::open_default().specs(names)?;
    if saved.is_empty() {
        return Err(Error::Config("No saved queries found".to_string()));
    }

    let jobs = saved
        .into_iter()
        .map(|(name, spec)| Job {
            name: Some(name),
            spec: spec.with_extra(&extra),
        })
        .collect();
    execute(api_url, &args.fetch, jobs).await?;
    Ok(0)
}

/// Run every job and print the results, stopping at the first failure.
///
/// Table output streams query by query; JSON output is written only once
/// every query has succeeded.
async fn execute(api_url: &str, fetch: &FetchArgs, jobs: Vec<Job>) -> Result<()> {
    let token = resolve_token(fetch.token.as_deref(), None)?;
    let searcher = GitHubSearcher::with_base_url(&token, api_url)?;
    let runner = SearchRunner::new(&searcher, fetch.options(), fetch.concurrency);

    let specs: Vec<QuerySpec> = jobs.iter().map(|job| job.spec.clone()).collect();
    let mut outcomes = std::pin::pin!(runner.run(specs));
    let multiple = jobs.len() > 1;
    let mut stdout = io::stdout();
    let mut collected: Vec<(&Job, Vec<SearchResult>)> = Vec::with_capacity(jobs.len());

    for (idx, job) in jobs.iter().enumerate() {
        let results = match outcomes.next().await {
            Some(outcome) => outcome?,
            None => break,
        };

        match fetch.output {
            OutputFormat::Json => collected.push((job, results)),
            OutputFormat::Table => {
                match &job.name {
                    Some(name) => writeln!(stdout, "=== {}: {}", name, job.spec.build())?,
                    None if multiple => writeln!(stdout, "=== Query {}: {}", idx + 1, job.spec.build())?,
                    None => {}
                }
                render_results(&mut stdout, &results, OutputFormat::Table)?;
            }
        }
    }

    if fetch.output == OutputFormat::Json {
        let reports: Vec<QueryReport<'_>> = collected
            .iter()
            .map(|(job, results)| QueryReport {
                name: job.name.as_deref(),
                query: job.spec.build(),
                results: results.as_slice(),
            })
            .collect();
        write_json(&mut stdout, &reports)?;
    }

    info!("All searches completed successfully");
    Ok(())
}

fn collect_query_texts(source: &QuerySource) -> Result<Vec<String>> {
    let mut texts = Vec::new();
    if let Some(query) = source.query.as_ref().filter(|q| !q.is_empty()) {
        texts.push(query.clone());
    }
    if let Some(path) = &source.query_file {
        let text = fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Could not read query file {}: {}", path.display(), e))
        })?;
        texts.push(text);
    }
    Ok(texts)
}

fn handle_queries(command: QueriesCommand) -> Result<u8> {
    let store = QueryStore::open_default();
    let mut stdout = io::stdout();

    match command {
        QueriesCommand::Add {
            name,
            source,
            qualifiers,
        } => {
            let qualifiers = parse_qualifiers(&qualifiers);
            let text = collect_query_texts(&source)?.join("\n");
            let text = text.trim();
            if text.is_empty() {
                return Err(Error::Config("Query text is empty".to_string()));
            }
            store.save(&name, text, &qualifiers)?;
            writeln!(stdout, "Saved query '{}'", name)?;
            Ok(0)
        }
        QueriesCommand::Remove { names } => {
            let mut removed = 0;
            for name in &names {
                if store.delete(name)? {
                    writeln!(stdout, "Removed query '{}'", name)?;
                    removed += 1;
                } else {
                    eprintln!("Query '{}' not found", name);
                }
            }
            Ok(if removed == 0 { 1 } else { 0 })
        }
        QueriesCommand::List => {
            let names = store.list()?;
            if names.is_empty() {
                writeln!(stdout, "No saved queries.")?;
            }
            for name in names {
                writeln!(stdout, "{}", name)?;
            }
            Ok(0)
        }
    }
}

fn handle_token(command: TokenCommand) -> Result<u8> {
    let mut stdout = io::stdout();

    match command {
        TokenCommand::Set { token } => {
            let token = match token {
                Some(token) => token,
                None => inquire::Password::new("GitHub token:")
                    .without_confirmation()
                    .prompt()
                    .map_err(|e| Error::Prompt(e.to_string()))?,
            };
            let path = store_token(&token, None)?;
            writeln!(stdout, "Token stored at {}", path.display())?;
        }
        TokenCommand::Clear => {
            delete_token(None)?;
            writeln!(stdout, "Stored token cleared.")?;
        }
        TokenCommand::Info => {
            let status = token_status(None)?;
            if status.env {
                writeln!(stdout, "Token available via {} environment variable.", TOKEN_ENV_VAR)?;
            }
            if let Some(path) = &status.config_path {
                writeln!(stdout, "Token stored at {}", path.display())?;
            }
            if !status.env && status.config_path.is_none() {
                writeln!(stdout, "No token sources found.")?;
            }
        }
    }
    Ok(0)
}
