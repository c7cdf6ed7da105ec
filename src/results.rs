use serde::Serialize;
use serde_json::Value;

/// Repository name used when an item carries no `repository.full_name`.
pub const UNKNOWN_REPOSITORY: &str = "unknown/repo";

/// Normalized representation of one code search hit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    pub repository: String,
    pub path: String,
    pub url: String,
    pub score: f64,
    pub snippet: Option<String>,
}

impl SearchResult {
    /// Build a result from a raw `items[]` entry.
    ///
    /// Missing fields fall back to defaults instead of failing, since the
    /// search payload varies between GitHub versions.
    pub fn from_item(item: &Value) -> Self {
        let repository = item
            .get("repository")
            .and_then(|repo| repo.get("full_name"))
            .and_then(|v| v.as_str())
            .unwrap_or(UNKNOWN_REPOSITORY);
        let path = item.get("path").and_then(|v| v.as_str()).unwrap_or("");
        let url = item.get("html_url").and_then(|v| v.as_str()).unwrap_or("");
        let score = item.get("score").and_then(|v| v.as_f64()).unwrap_or(0.0);

        let snippet = item
            .get("text_matches")
            .and_then(|v| v.as_array())
            .and_then(|matches| matches.first())
            .and_then(|first| first.get("fragment"))
            .and_then(|v| v.as_str())
            .map(str::to_string);

        SearchResult {
            repository: repository.to_string(),
            path: path.to_string(),
            url: url.to_string(),
            score,
            snippet,
        }
    }
}

/// Parse the `items` array of a search response body. A missing or
/// non-array `items` yields no results.
pub fn parse_items(body: &Value) -> Vec<SearchResult> {
    body.get("items")
        .and_then(|v| v.as_array())
        .map(|items| items.iter().map(SearchResult::from_item).collect())
        .unwrap_or_default()
}
