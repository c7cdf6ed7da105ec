//! Named query presets kept in `queries.json` next to the config file.
//!
//! ```json
//! { "queries": [ { "name": "leaks", "query": "memory leak", "qualifiers": { "language": "go" } } ] }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::default_config_path;
use crate::error::{Error, Result};
use crate::query::{Qualifier, QuerySpec};

pub const QUERIES_FILENAME: &str = "queries.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedQuery {
    pub name: String,
    pub query: String,
    pub qualifiers: Map<String, Value>,
}

impl SavedQuery {
    pub fn to_spec(&self) -> QuerySpec {
        let qualifiers: Vec<Qualifier> = self
            .qualifiers
            .iter()
            .map(|(key, value)| {
                let value = match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                (key.clone(), value)
            })
            .collect();
        QuerySpec::new(self.query.clone(), qualifiers)
    }
}

#[derive(Serialize)]
struct QueryFile<'a> {
    queries: &'a [SavedQuery],
}

/// File-backed store of saved queries. Every operation re-reads the file.
#[derive(Debug, Clone)]
pub struct QueryStore {
    path: PathBuf,
}

impl QueryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store living beside the default config file.
    pub fn open_default() -> Self {
        Self::new(default_config_path().with_file_name(QUERIES_FILENAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<Vec<SavedQuery>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let contents = fs::read_to_string(&self.path)?;
        let payload: Value = serde_json::from_str(&contents).map_err(|_| {
            Error::Config(format!(
                "Query file at {} is not valid JSON",
                self.path.display()
            ))
        })?;

        let Some(entries) = payload.get("queries").and_then(|v| v.as_array()) else {
            return Ok(Vec::new());
        };

        let mut saved: Vec<SavedQuery> = Vec::with_capacity(entries.len());
        for entry in entries.iter().filter_map(|e| e.as_object()) {
            let name = entry.get("name").map(value_to_string).unwrap_or_default();
            let name = name.trim();
            if name.is_empty() {
                continue;
            }
            let query = entry.get("query").map(value_to_string).unwrap_or_default();
            let qualifiers = entry
                .get("qualifiers")
                .and_then(|v| v.as_object())
                .cloned()
                .unwrap_or_default();

            let record = SavedQuery {
                name: name.to_string(),
                query,
                qualifiers,
            };
            match saved.iter_mut().find(|q| q.name == record.name) {
                Some(existing) => *existing = record,
                None => saved.push(record),
            }
        }
        Ok(saved)
    }

    fn write(&self, queries: &[SavedQuery]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(&QueryFile { queries })
            .map_err(|e| Error::Config(e.to_string()))?;
        fs::write(&self.path, contents)?;
        Ok(())
    }

    /// Saved query names in file order.
    pub fn list(&self) -> Result<Vec<String>> {
        Ok(self.read()?.into_iter().map(|q| q.name).collect())
    }

    /// Specs for `names` in the order given, or every saved query when `None`.
    /// Unknown names are skipped.
    pub fn specs(&self, names: Option<&[String]>) -> Result<Vec<(String, QuerySpec)>> {
        let saved = self.read()?;
        let selected: Vec<&SavedQuery> = match names {
            None => saved.iter().collect(),
            Some(names) => names
                .iter()
                .map(|n| n.trim())
                .filter(|n| !n.is_empty())
                .filter_map(|n| saved.iter().find(|q| q.name == n))
                .collect(),
        };
        Ok(selected
            .into_iter()
            .map(|q| (q.name.clone(), q.to_spec()))
            .collect())
    }

    /// Insert or replace a query. Replacing keeps the original position.
    pub fn save(&self, name: &str, query: &str, qualifiers: &[Qualifier]) -> Result<()> {
        let mut saved = self.read()?;
        let mut map = Map::new();
        for (key, value) in qualifiers {
            map.insert(key.clone(), Value::String(value.clone()));
        }
        let record = SavedQuery {
            name: name.to_string(),
            query: query.to_string(),
            qualifiers: map,
        };
        match saved.iter_mut().find(|q| q.name == name) {
            Some(existing) => *existing = record,
            None => saved.push(record),
        }
        self.write(&saved)
    }

    /// Returns `false` when no query had that name.
    pub fn delete(&self, name: &str) -> Result<bool> {
        let mut saved = self.read()?;
        let before = saved.len();
        saved.retain(|q| q.name != name);
        if saved.len() == before {
            return Ok(false);
        }
        self.write(&saved)?;
        Ok(true)
    }
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
