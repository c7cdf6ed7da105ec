//! Runs a batch of queries through one searcher.
//!
//! Queries may overlap up to the configured concurrency, but results always
//! come back in input order, and each query still fetches its pages one at a
//! time.

use futures::stream::{self, Stream, StreamExt};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::time::Duration;
use tracing::{debug, info};

use crate::error::Result;
use crate::github_searcher::{GitHubSearcher, SearchOptions};
use crate::query::QuerySpec;
use crate::results::SearchResult;

pub struct SearchRunner<'a> {
    searcher: &'a GitHubSearcher,
    options: SearchOptions,
    concurrency: usize,
    progress: MultiProgress,
}

impl<'a> SearchRunner<'a> {
    pub fn new(searcher: &'a GitHubSearcher, options: SearchOptions, concurrency: usize) -> Self {
        Self {
            searcher,
            options,
            concurrency: concurrency.max(1),
            progress: MultiProgress::new(),
        }
    }

    /// Draw spinners into `progress` instead of a fresh stderr target.
    pub fn with_progress(mut self, progress: MultiProgress) -> Self {
        self.progress = progress;
        self
    }

    /// Execute `specs`, yielding one outcome per spec in input order.
    ///
    /// Dropping the stream after an error cancels the queries still pending.
    pub fn run(&self, specs: Vec<QuerySpec>) -> impl Stream<Item = Result<Vec<SearchResult>>> + '_ {
        stream::iter(specs)
            .map(move |spec| async move {
                let pb = self.spinner(&spec);
                let outcome = self
                    .searcher
                    .search_code_with_progress(&spec, self.options, &pb)
                    .await;

                match &outcome {
                    Ok(results) => info!("Completed '{}' with {} results", spec.build(), results.len()),
                    Err(e) => debug!("Search for '{}' failed: {}", spec.build(), e),
                }
                pb.finish_and_clear();
                outcome
            })
            .buffered(self.concurrency)
    }

    fn spinner(&self, spec: &QuerySpec) -> ProgressBar {
        let pb = self.progress.add(ProgressBar::new_spinner());
        if let Ok(style) = ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {wide_msg}")
        {
            pb.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
        }
        pb.set_message(format!("Starting search for '{}'", spec.build()));
        pb.enable_steady_tick(Duration::from_millis(80));
        pb
    }
}
