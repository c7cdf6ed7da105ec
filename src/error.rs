//! Error types shared by the searcher, the local stores and the CLI.

use thiserror::Error;

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// The token was rejected by GitHub. Never retried.
    #[error("GitHub rejected the token (401 Unauthorized)")]
    Auth,

    /// Any other non-success status that is not a rate limit.
    #[error("GitHub API error {status}: {message}")]
    Api { status: u16, message: String },

    /// Every attempt ended in a rate-limit response.
    #[error("Retry limit exceeded while calling GitHub API")]
    RetryLimitExceeded,

    /// A successful response whose body was not valid JSON.
    #[error("Malformed response from GitHub: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error(
        "GitHub token not found. Set the GITHUB_TOKEN environment variable \
         or run `bugzero token set` to persist it."
    )]
    TokenNotFound,

    /// Bad local state or user input: unreadable config, empty query, empty token.
    #[error("{0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Prompt failed: {0}")]
    Prompt(String),
}

impl Error {
    /// True for failures reported by (or while talking to) the GitHub API.
    pub fn is_github(&self) -> bool {
        matches!(
            self,
            Error::Auth
                | Error::Api { .. }
                | Error::RetryLimitExceeded
                | Error::Decode(_)
                | Error::Network(_)
        )
    }
}
