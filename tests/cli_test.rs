use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{json, Value};
use std::fs;
use tempfile::{tempdir, TempDir};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// A `bugzero` invocation isolated from the user's config and environment.
fn bugzero(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("bugzero").unwrap();
    cmd.current_dir(dir.path())
        .env("BUGZERO_CONFIG", dir.path().join("config.json"))
        .env_remove("GITHUB_TOKEN")
        .env_remove("GITHUB_API_URL");
    cmd
}

fn hits(paths: &[&str]) -> Value {
    let items: Vec<Value> = paths
        .iter()
        .map(|p| {
            json!({
                "path": p,
                "html_url": format!("https://github.com/o/r/blob/main/{}", p),
                "score": 2.5,
                "repository": { "full_name": "o/r" },
                "text_matches": [{ "fragment": "leak()" }]
            })
        })
        .collect();
    json!({ "total_count": items.len(), "items": items })
}

#[test]
fn test_queries_add_list_remove() {
    let dir = tempdir().unwrap();

    bugzero(&dir)
        .args(["queries", "list"])
        .assert()
        .success()
        .stdout("No saved queries.\n");

    bugzero(&dir)
        .args(["queries", "add", "leaks", "-q", "memory leak", "-Q", "language=go"])
        .assert()
        .success()
        .stdout("Saved query 'leaks'\n");
    bugzero(&dir)
        .args(["queries", "add", "unsafe", "-q", "transmute"])
        .assert()
        .success();

    bugzero(&dir)
        .args(["queries", "list"])
        .assert()
        .success()
        .stdout("leaks\nunsafe\n");

    let stored: Value =
        serde_json::from_str(&fs::read_to_string(dir.path().join("queries.json")).unwrap()).unwrap();
    assert_eq!(stored["queries"][0]["qualifiers"]["language"], "go");

    bugzero(&dir)
        .args(["queries", "remove", "leaks", "missing"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed query 'leaks'"))
        .stderr(predicate::str::contains("Query 'missing' not found"));

    bugzero(&dir)
        .args(["queries", "remove", "missing"])
        .assert()
        .code(1);
}

#[test]
fn test_queries_add_rejects_blank_text() {
    let dir = tempdir().unwrap();
    bugzero(&dir)
        .args(["queries", "add", "empty", "-q", "   "])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Error: Query text is empty"));
}

#[test]
fn test_token_lifecycle() {
    let dir = tempdir().unwrap();

    bugzero(&dir)
        .args(["token", "info"])
        .assert()
        .success()
        .stdout("No token sources found.\n");

    bugzero(&dir)
        .args(["token", "set", "--token", "abc123"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Token stored at"));

    bugzero(&dir)
        .args(["token", "info"])
        .env("GITHUB_TOKEN", "from-env")
        .assert()
        .success()
        .stdout(predicate::str::contains("GITHUB_TOKEN environment variable"))
        .stdout(predicate::str::contains("config.json"));

    bugzero(&dir).args(["token", "clear"]).assert().success();
    assert!(!dir.path().join("config.json").exists());
}

#[test]
fn test_search_without_token_fails() {
    let dir = tempdir().unwrap();
    bugzero(&dir)
        .args(["search", "-q", "panic"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Error: GitHub token not found"));
}

#[test]
fn test_sweep_without_saved_queries_fails() {
    let dir = tempdir().unwrap();
    bugzero(&dir)
        .args(["sweep"])
        .env("GITHUB_TOKEN", "t")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("No saved queries found"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_search_json_output() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search/code"))
        .and(query_param("q", "memory leak language:go"))
        .and(header("authorization", "token test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(hits(&["a.go", "b.go"])))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    let mut cmd = bugzero(&dir);
    cmd.args(["search", "-q", "memory   leak", "-Q", "language=go", "--output", "json"])
        .env("GITHUB_TOKEN", "test-token")
        .env("GITHUB_API_URL", server.uri());

    let output = tokio::task::spawn_blocking(move || cmd.output().unwrap())
        .await
        .unwrap();
    assert!(output.status.success());

    let payload: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(payload[0]["query"], "memory leak language:go");
    assert_eq!(payload[0]["results"][1]["path"], "b.go");
    assert_eq!(payload[0]["results"][0]["snippet"], "leak()");
    assert!(payload[0].get("name").is_none());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_search_split_lines_table() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("q", "first"))
        .respond_with(ResponseTemplate::new(200).set_body_json(hits(&["one.rs"])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(query_param("q", "second"))
        .respond_with(ResponseTemplate::new(200).set_body_json(hits(&[])))
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    fs::write(dir.path().join("queries.txt"), "first\n\nsecond\n").unwrap();
    let mut cmd = bugzero(&dir);
    cmd.args(["search", "--query-file", "queries.txt", "--split-lines"])
        .env("GITHUB_TOKEN", "test-token")
        .env("GITHUB_API_URL", server.uri());

    let output = tokio::task::spawn_blocking(move || cmd.output().unwrap())
        .await
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    let first = stdout.find("=== Query 1: first").unwrap();
    let second = stdout.find("=== Query 2: second").unwrap();
    assert!(first < second);
    assert!(stdout.contains("o/r :: one.rs (score 2.50)"));
    assert!(stdout.contains("  Snippet:\n  leak()"));
    assert!(stdout.ends_with("No matches found.\n"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_sweep_reports_rejected_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "message": "Bad credentials" })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    bugzero(&dir)
        .args(["queries", "add", "a", "-q", "one"])
        .assert()
        .success();
    bugzero(&dir)
        .args(["queries", "add", "b", "-q", "two"])
        .assert()
        .success();

    let mut cmd = bugzero(&dir);
    cmd.args(["sweep", "-Q", "org=acme"])
        .env("GITHUB_TOKEN", "bad-token")
        .env("GITHUB_API_URL", server.uri());

    let output = tokio::task::spawn_blocking(move || cmd.output().unwrap())
        .await
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("GitHub API error: GitHub rejected the token (401 Unauthorized)"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_sweep_json_appends_extra_qualifiers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("q", "panic language:rust org:acme"))
        .respond_with(ResponseTemplate::new(200).set_body_json(hits(&["lib.rs"])))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    bugzero(&dir)
        .args(["queries", "add", "panics", "-q", "panic", "-Q", "language=rust"])
        .assert()
        .success();

    let mut cmd = bugzero(&dir);
    cmd.args(["sweep", "panics", "-Q", "org=acme", "--output", "json"])
        .env("GITHUB_TOKEN", "test-token")
        .env("GITHUB_API_URL", server.uri());

    let output = tokio::task::spawn_blocking(move || cmd.output().unwrap())
        .await
        .unwrap();
    assert!(output.status.success());

    let payload: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(payload[0]["name"], "panics");
    assert_eq!(payload[0]["query"], "panic language:rust org:acme");
    assert_eq!(payload[0]["results"][0]["repository"], "o/r");
}
