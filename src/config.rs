//! Token resolution and the on-disk config file.
//!
//! The config file is a JSON object, by default at
//! `~/.config/bugzero/config.json`; `BUGZERO_CONFIG` points it elsewhere.
//! Only the `github_token` key is managed here and any other keys are kept
//! as-is when the file is rewritten.

use serde_json::{Map, Value};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{Error, Result};

pub const CONFIG_ENV_VAR: &str = "BUGZERO_CONFIG";
pub const TOKEN_ENV_VAR: &str = "GITHUB_TOKEN";
const TOKEN_KEY: &str = "github_token";

/// Where a token could currently be sourced from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenStatus {
    pub env: bool,
    pub config_path: Option<PathBuf>,
}

/// Path of the config file, honoring `BUGZERO_CONFIG`.
pub fn default_config_path() -> PathBuf {
    if let Ok(custom) = env::var(CONFIG_ENV_VAR) {
        if !custom.trim().is_empty() {
            return expand_home(custom.trim());
        }
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("bugzero")
        .join("config.json")
}

fn expand_home(raw: &str) -> PathBuf {
    match raw.strip_prefix("~/") {
        Some(rest) => match dirs::home_dir() {
            Some(home) => home.join(rest),
            None => PathBuf::from(raw),
        },
        None => PathBuf::from(raw),
    }
}

fn read_config(path: &Path) -> Result<Map<String, Value>> {
    if !path.exists() {
        return Ok(Map::new());
    }
    let contents = fs::read_to_string(path)?;
    match serde_json::from_str::<Value>(&contents) {
        Ok(Value::Object(map)) => Ok(map),
        _ => Err(Error::Config(format!(
            "Config file at {} is not valid JSON",
            path.display()
        ))),
    }
}

fn write_config(path: &Path, data: &Map<String, Value>) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let contents = serde_json::to_string_pretty(data).map_err(|e| Error::Config(e.to_string()))?;
    fs::write(path, contents)?;
    Ok(())
}

fn env_token() -> Option<String> {
    env::var(TOKEN_ENV_VAR)
        .ok()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

fn stored_token(data: &Map<String, Value>) -> Option<String> {
    data.get(TOKEN_KEY)
        .and_then(|v| v.as_str())
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

/// Pick a token: explicit value, then `GITHUB_TOKEN`, then the config file.
pub fn resolve_token(explicit: Option<&str>, config_path: Option<&Path>) -> Result<String> {
    if let Some(token) = explicit.map(str::trim).filter(|t| !t.is_empty()) {
        debug!("Using explicitly provided token");
        return Ok(token.to_string());
    }

    if let Some(token) = env_token() {
        debug!("Using token from {}", TOKEN_ENV_VAR);
        return Ok(token);
    }

    let path = config_path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if let Some(token) = stored_token(&read_config(&path)?) {
        debug!("Using token stored at {}", path.display());
        return Ok(token);
    }

    Err(Error::TokenNotFound)
}

/// Persist a token and return the file it was written to.
pub fn store_token(token: &str, config_path: Option<&Path>) -> Result<PathBuf> {
    let token = token.trim();
    if token.is_empty() {
        return Err(Error::Config("Cannot store empty token".to_string()));
    }
    let path = config_path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    let mut data = read_config(&path)?;
    data.insert(TOKEN_KEY.to_string(), Value::String(token.to_string()));
    write_config(&path, &data)?;
    Ok(path)
}

/// Remove the stored token. The file goes away once nothing else is in it.
pub fn delete_token(config_path: Option<&Path>) -> Result<()> {
    let path = config_path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(());
    }
    let mut data = read_config(&path)?;
    data.remove(TOKEN_KEY);
    if data.is_empty() {
        fs::remove_file(&path)?;
    } else {
        write_config(&path, &data)?;
    }
    Ok(())
}

pub fn token_status(config_path: Option<&Path>) -> Result<TokenStatus> {
    let path = config_path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    let stored = read_config(&path)?
        .get(TOKEN_KEY)
        .and_then(|v| v.as_str())
        .is_some_and(|t| !t.is_empty());
    Ok(TokenStatus {
        env: env_token().is_some(),
        config_path: stored.then_some(path),
    })
}
