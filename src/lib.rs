//! # BugZero
//!
//! A command-line client for the GitHub code search API: builds queries from
//! free text and qualifiers, pages through results with rate-limit aware
//! retries, and keeps named query presets for repeated sweeps.
//!
//! ## Main Components
//!
//! - [`QuerySpec`]: free text plus ordered qualifiers, rendered with [`QuerySpec::build`]
//! - [`GitHubSearcher`]: the authenticated client; [`GitHubSearcher::search_code`] runs one query
//! - [`SearchResult`]: one normalized hit
//! - [`Args`]: command line definition for the `bugzero` binary
//!
//! ## Example
//!
//! ```no_run
//! use bugzero_lib::{GitHubSearcher, QuerySpec, SearchOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), bugzero_lib::Error> {
//!     let token = bugzero_lib::config::resolve_token(None, None)?;
//!     let searcher = GitHubSearcher::new(&token)?;
//!
//!     let spec = QuerySpec::new("memory leak", vec![("language".into(), "go".into())]);
//!     let results = searcher.search_code(&spec, SearchOptions::default()).await?;
//!     for hit in results {
//!         println!("{} {}", hit.repository, hit.path);
//!     }
//!     Ok(())
//! }
//! ```

pub mod args;
pub mod commands;
pub mod config;
mod error;
mod github_searcher;
mod query;
pub mod rate_limit;
pub mod render;
mod results;
pub mod runner;
pub mod saved_queries;

pub use crate::args::Args;
pub use crate::error::{Error, Result};
pub use crate::github_searcher::{GitHubSearcher, SearchOptions, DEFAULT_BASE_URL};
pub use crate::query::{build_specs, merge_qualifiers, parse_qualifier, parse_qualifiers, Qualifier, QuerySpec};
pub use crate::results::{parse_items, SearchResult};
