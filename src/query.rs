//! Search query model: free text plus ordered `key:value` qualifiers.

/// A single search qualifier, e.g. `("language", "go")`.
pub type Qualifier = (String, String);

/// One GitHub code search query.
///
/// Qualifier order is preserved exactly as supplied and is reflected in the
/// built query string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuerySpec {
    pub query: String,
    pub qualifiers: Vec<Qualifier>,
}

impl QuerySpec {
    pub fn new(query: impl Into<String>, qualifiers: Vec<Qualifier>) -> Self {
        Self {
            query: query.into(),
            qualifiers,
        }
    }

    /// Render the `q` parameter sent to the search endpoint.
    ///
    /// Whitespace in the free text collapses to single spaces. Qualifiers with
    /// a blank key are dropped; a blank value renders as the bare key.
    pub fn build(&self) -> String {
        let mut parts: Vec<String> = Vec::with_capacity(self.qualifiers.len() + 1);

        let text = self.query.split_whitespace().collect::<Vec<_>>().join(" ");
        if !text.is_empty() {
            parts.push(text);
        }

        for (key, value) in &self.qualifiers {
            let key = key.trim();
            let value = value.trim();
            if key.is_empty() {
                continue;
            }
            if value.is_empty() {
                parts.push(key.to_string());
            } else {
                parts.push(format!("{}:{}", key, value));
            }
        }

        parts.join(" ")
    }

    /// Copy of this spec with `extra` qualifiers appended after its own.
    pub fn with_extra(&self, extra: &[Qualifier]) -> Self {
        Self {
            query: self.query.clone(),
            qualifiers: merge_qualifiers([self.qualifiers.as_slice(), extra]),
        }
    }
}

/// Parse a CLI `key=value` argument. A missing `=` yields a bare key.
/// Returns `None` when the key is blank.
pub fn parse_qualifier(raw: &str) -> Option<Qualifier> {
    let (key, value) = raw.split_once('=').unwrap_or((raw, ""));
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    Some((key.to_string(), value.trim().to_string()))
}

pub fn parse_qualifiers<S: AsRef<str>>(raw: &[S]) -> Vec<Qualifier> {
    raw.iter().filter_map(|entry| parse_qualifier(entry.as_ref())).collect()
}

/// Flatten several qualifier groups into one list, keeping order.
pub fn merge_qualifiers<'a, I>(groups: I) -> Vec<Qualifier>
where
    I: IntoIterator<Item = &'a [Qualifier]>,
{
    groups
        .into_iter()
        .flat_map(|group| group.iter().cloned())
        .collect()
}

/// Turn raw query texts into specs.
///
/// With `split_lines` every non-blank line becomes its own query; otherwise
/// the texts are joined into a single query.
pub fn build_specs(texts: &[String], qualifiers: &[Qualifier], split_lines: bool) -> Vec<QuerySpec> {
    if split_lines {
        return texts
            .iter()
            .flat_map(|text| text.lines())
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| QuerySpec::new(line, qualifiers.to_vec()))
            .collect();
    }

    let merged = texts.join("\n");
    let merged = merged.trim();
    if merged.is_empty() {
        Vec::new()
    } else {
        vec![QuerySpec::new(merged, qualifiers.to_vec())]
    }
}
