use chrono::Utc;
use indicatif::ProgressBar;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::query::QuerySpec;
use crate::rate_limit::{is_rate_limited, retry_wait, Sleeper, TokioSleeper};
use crate::results::{parse_items, SearchResult};

pub const DEFAULT_BASE_URL: &str = "https://api.github.com";
pub const SEARCH_ENDPOINT: &str = "/search/code";
pub const TEXT_MATCH_MEDIA_TYPE: &str = "application/vnd.github.v3.text-match+json";
pub const PLAIN_MEDIA_TYPE: &str = "application/vnd.github.v3+json";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
const MAX_ATTEMPTS: u32 = 3;

/// Paging and media options for one `search_code` call.
#[derive(Debug, Clone, Copy)]
pub struct SearchOptions {
    pub per_page: u32,
    pub pages: u32,
    pub text_matches: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            per_page: 30,
            pages: 1,
            text_matches: true,
        }
    }
}

/// Client for the GitHub code search endpoint.
///
/// Owns one HTTP client (and its connection pool) for its whole lifetime;
/// the token and user agent are fixed at construction.
pub struct GitHubSearcher {
    client: Client,
    base_url: String,
    sleeper: Arc<dyn Sleeper>,
}

impl GitHubSearcher {
    /// Create a searcher against the public GitHub API.
    pub fn new(token: &str) -> Result<Self> {
        Self::with_base_url(token, DEFAULT_BASE_URL)
    }

    /// Create a searcher against another API root, e.g. GitHub Enterprise.
    pub fn with_base_url(token: &str, base_url: &str) -> Result<Self> {
        let token = token.trim();
        if token.is_empty() {
            return Err(Error::TokenNotFound);
        }

        let mut headers = HeaderMap::new();
        let auth = HeaderValue::from_str(&format!("token {}", token))
            .map_err(|_| Error::Config("GitHub token contains invalid characters".to_string()))?;
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static(TEXT_MATCH_MEDIA_TYPE));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("bugzero/", env!("CARGO_PKG_VERSION"))),
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(GitHubSearcher {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            sleeper: Arc::new(TokioSleeper),
        })
    }

    /// Replace the backoff sleeper.
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Run `spec` across up to `options.pages` pages and return every hit in
    /// page order.
    ///
    /// Stops early once a page comes back with fewer than `per_page` items.
    /// Any failure aborts the whole call; results of earlier pages are dropped.
    pub async fn search_code(&self, spec: &QuerySpec, options: SearchOptions) -> Result<Vec<SearchResult>> {
        self.search_code_with_progress(spec, options, &ProgressBar::hidden())
            .await
    }

    /// Same as [`search_code`](Self::search_code), reporting page progress
    /// and rate-limit waits on `pb`.
    pub async fn search_code_with_progress(
        &self,
        spec: &QuerySpec,
        options: SearchOptions,
        pb: &ProgressBar,
    ) -> Result<Vec<SearchResult>> {
        let query = spec.build();
        let accept = if options.text_matches {
            TEXT_MATCH_MEDIA_TYPE
        } else {
            PLAIN_MEDIA_TYPE
        };

        let mut results = Vec::new();
        for page in 1..=options.pages {
            pb.set_message(format!("Searching '{}' - page {}", query, page));

            let params = [
                ("q", query.clone()),
                ("per_page", options.per_page.to_string()),
                ("page", page.to_string()),
            ];
            let body = self.request_with_retry(&params, accept, pb).await?;
            let items = parse_items(&body);
            let count = items.len();
            results.extend(items);

            info!("Fetched {} results for '{}' page {}", count, query, page);

            if count < options.per_page as usize {
                debug!("No more results for '{}'", query);
                break;
            }
        }

        Ok(results)
    }

    /// Issue one GET, retrying only on rate-limit responses.
    async fn request_with_retry(&self, params: &[(&str, String)], accept: &str, pb: &ProgressBar) -> Result<Value> {
        let url = format!("{}{}", self.base_url, SEARCH_ENDPOINT);

        for attempt in 1..=MAX_ATTEMPTS {
            debug!("Requesting {} (attempt {}) with {:?}", url, attempt, params);
            let response = self
                .client
                .get(&url)
                .query(params)
                .header(ACCEPT, accept)
                .send()
                .await?;

            let status = response.status();
            if status == StatusCode::OK {
                let body = response.text().await?;
                return Ok(serde_json::from_str(&body)?);
            }

            let headers = response.headers().clone();
            let body = response.text().await?;

            if status == StatusCode::FORBIDDEN && is_rate_limited(&headers, &body) {
                if attempt == MAX_ATTEMPTS {
                    break;
                }
                let wait = retry_wait(&headers, attempt, Utc::now().timestamp());
                warn!("Rate limit reached. Waiting {} seconds...", wait.as_secs());

                let original_msg = pb.message();
                pb.set_message(format!("Rate limited - waiting {}s", wait.as_secs()));
                self.sleeper.sleep(wait).await;
                pb.set_message(original_msg);
                continue;
            }

            if status == StatusCode::UNAUTHORIZED {
                return Err(Error::Auth);
            }

            return Err(Error::Api {
                status: status.as_u16(),
                message: extract_error_message(&body),
            });
        }

        Err(Error::RetryLimitExceeded)
    }
}

/// Prefer the JSON `message` field of an error body, else the raw text.
fn extract_error_message(body: &str) -> String {
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(map)) => match map.get("message") {
            Some(Value::String(message)) => message.clone(),
            Some(other) => other.to_string(),
            None => body.to_string(),
        },
        _ => body.to_string(),
    }
}
