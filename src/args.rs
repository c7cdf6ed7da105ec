use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::github_searcher::{SearchOptions, DEFAULT_BASE_URL};
use crate::render::OutputFormat;

/// Search GitHub code, save query presets and sweep them in bulk.
#[derive(Parser, Debug)]
#[clap(
    name = "bugzero",
    author,
    version,
    about,
    long_about = "Run GitHub code searches with qualifiers, keep named query presets, and sweep them with rate-limit aware retries."
)]
pub struct Args {
    #[clap(subcommand)]
    pub command: Command,

    /// GitHub API root, e.g. a GitHub Enterprise `/api/v3` URL.
    #[clap(long, env = "GITHUB_API_URL", default_value = DEFAULT_BASE_URL, global = true)]
    pub api_url: String,

    /// Print debug logs to stderr.
    #[clap(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a direct GitHub code search
    Search(SearchArgs),

    /// Run saved queries in sequence
    Sweep(SweepArgs),

    /// Manage saved queries
    Queries {
        #[clap(subcommand)]
        command: QueriesCommand,
    },

    /// Manage GitHub tokens
    Token {
        #[clap(subcommand)]
        command: TokenCommand,
    },
}

/// Where the query text comes from. Exactly one is required.
#[derive(clap::Args, Debug)]
#[group(required = true, multiple = false)]
pub struct QuerySource {
    /// Search query string
    #[clap(short, long)]
    pub query: Option<String>,

    /// File containing the search query
    #[clap(long, value_name = "PATH")]
    pub query_file: Option<PathBuf>,
}

/// Options shared by every command that talks to the API.
#[derive(clap::Args, Debug)]
pub struct FetchArgs {
    /// Add a search qualifier (may be repeated)
    #[clap(short = 'Q', long = "qualifier", value_name = "key=value")]
    pub qualifiers: Vec<String>,

    /// Items per API page
    #[clap(long, default_value = "30", value_parser = clap::value_parser!(u32).range(1..))]
    pub per_page: u32,

    /// Number of pages to fetch per query
    #[clap(long, default_value = "1", value_parser = clap::value_parser!(u32).range(1..))]
    pub pages: u32,

    /// Output format
    #[clap(long, value_enum, default_value = "table")]
    pub output: OutputFormat,

    /// Explicit GitHub token
    #[clap(long)]
    pub token: Option<String>,

    /// Maximum number of queries in flight at once
    #[clap(short = 'c', long, default_value = "1")]
    pub concurrency: usize,

    /// Skip requesting text-match fragments
    #[clap(long)]
    pub no_text_matches: bool,
}

impl FetchArgs {
    pub fn options(&self) -> SearchOptions {
        SearchOptions {
            per_page: self.per_page,
            pages: self.pages,
            text_matches: !self.no_text_matches,
        }
    }
}

#[derive(clap::Args, Debug)]
pub struct SearchArgs {
    #[clap(flatten)]
    pub source: QuerySource,

    /// Treat each non-empty line as an individual query
    #[clap(long)]
    pub split_lines: bool,

    #[clap(flatten)]
    pub fetch: FetchArgs,
}

#[derive(clap::Args, Debug)]
pub struct SweepArgs {
    /// Specific query names to run (default: all)
    pub names: Vec<String>,

    #[clap(flatten)]
    pub fetch: FetchArgs,
}

#[derive(Subcommand, Debug)]
pub enum QueriesCommand {
    /// Add or update a saved query
    Add {
        /// Name for the saved query
        name: String,

        #[clap(flatten)]
        source: QuerySource,

        /// Qualifiers stored with the query
        #[clap(short = 'Q', long = "qualifier", value_name = "key=value")]
        qualifiers: Vec<String>,
    },

    /// Delete saved queries
    Remove {
        /// Query names to remove
        #[clap(required = true)]
        names: Vec<String>,
    },

    /// List saved queries
    List,
}

#[derive(Subcommand, Debug)]
pub enum TokenCommand {
    /// Store a GitHub token in the config file
    Set {
        /// Token value (omit to be prompted)
        #[clap(long)]
        token: Option<String>,
    },

    /// Remove the stored token
    Clear,

    /// Show where a token would be taken from
    Info,
}
