//! Corpus loading.
//!
//! The corpus is a JSON file holding an array of patient-record objects.
//! Every record becomes one [`Document`]: the record object is kept verbatim
//! as metadata and flattened into `key path + value` lines for the text that
//! gets chunked and embedded.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::document::Document;
use crate::error::{RagError, Result};

/// On-disk layout of the corpus file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CorpusFormat {
    /// A JSON array of objects, or a single object.
    #[default]
    Json,
    /// One JSON object per non-empty line.
    JsonLines,
}

/// Loads corpus files into documents, caching the result per path.
#[derive(Debug, Default)]
pub struct CorpusLoader {
    format: CorpusFormat,
    cache: RwLock<HashMap<PathBuf, Arc<Vec<Document>>>>,
}

impl CorpusLoader {
    /// Create a loader for plain JSON corpora.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the expected file format.
    pub fn with_format(mut self, format: CorpusFormat) -> Self {
        self.format = format;
        self
    }

    /// Load the corpus at `path`.
    ///
    /// A second call with the same path returns the cached documents.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::LoadError`] if the file cannot be read, is not
    /// valid JSON, or contains a record that is not an object.
    pub fn load(&self, path: impl AsRef<Path>) -> Result<Arc<Vec<Document>>> {
        let path = path.as_ref();
        let key = path.canonicalize().map_err(|e| load_error(path, e.to_string()))?;

        if let Some(documents) = self.cache.read().ok().and_then(|c| c.get(&key).cloned()) {
            debug!(path = %path.display(), "corpus cache hit");
            return Ok(documents);
        }

        let raw = std::fs::read_to_string(&key).map_err(|e| load_error(path, e.to_string()))?;
        let records = match self.format {
            CorpusFormat::Json => parse_json(&raw).map_err(|m| load_error(path, m))?,
            CorpusFormat::JsonLines => parse_json_lines(&raw).map_err(|m| load_error(path, m))?,
        };

        let source_uri = path.display().to_string();
        let documents: Vec<Document> = records
            .into_iter()
            .enumerate()
            .map(|(index, record)| Document {
                id: format!("record_{index}"),
                text: flatten_record(&record),
                metadata: record,
                source_uri: Some(source_uri.clone()),
            })
            .collect();

        info!(path = %path.display(), document_count = documents.len(), "loaded corpus");

        let documents = Arc::new(documents);
        if let Ok(mut cache) = self.cache.write() {
            cache.insert(key, Arc::clone(&documents));
        }
        Ok(documents)
    }
}

fn load_error(path: &Path, message: String) -> RagError {
    RagError::LoadError { path: path.display().to_string(), message }
}

fn parse_json(raw: &str) -> std::result::Result<Vec<Map<String, Value>>, String> {
    let value: Value = serde_json::from_str(raw).map_err(|e| format!("invalid JSON: {e}"))?;
    match value {
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(i, item)| into_record(i, item))
            .collect(),
        Value::Object(record) => Ok(vec![record]),
        other => Err(format!("expected an array of records, found {}", kind(&other))),
    }
}

fn parse_json_lines(raw: &str) -> std::result::Result<Vec<Map<String, Value>>, String> {
    raw.lines()
        .filter(|line| !line.trim().is_empty())
        .enumerate()
        .map(|(i, line)| {
            let value: Value = serde_json::from_str(line)
                .map_err(|e| format!("invalid JSON on record {i}: {e}"))?;
            into_record(i, value)
        })
        .collect()
}

fn into_record(index: usize, value: Value) -> std::result::Result<Map<String, Value>, String> {
    match value {
        Value::Object(record) => Ok(record),
        other => Err(format!("record {index} is {}, expected an object", kind(&other))),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Render a record as one line per leaf: the key path joined by spaces, then the value.
///
/// Strings are written unquoted and nulls are skipped. Array elements reuse
/// the key path of the array.
pub fn flatten_record(record: &Map<String, Value>) -> String {
    let mut lines = Vec::new();
    let mut path = Vec::new();
    for (key, value) in record {
        path.push(key.as_str());
        flatten_value(value, &mut path, &mut lines);
        path.pop();
    }
    lines.join("\n")
}

fn flatten_value<'a>(value: &'a Value, path: &mut Vec<&'a str>, lines: &mut Vec<String>) {
    match value {
        Value::Null => {}
        Value::Object(map) => {
            for (key, nested) in map {
                path.push(key.as_str());
                flatten_value(nested, path, lines);
                path.pop();
            }
        }
        Value::Array(items) => {
            for item in items {
                flatten_value(item, path, lines);
            }
        }
        Value::String(s) => lines.push(leaf_line(path, s)),
        Value::Bool(b) => lines.push(leaf_line(path, &b.to_string())),
        Value::Number(n) => lines.push(leaf_line(path, &n.to_string())),
    }
}

fn leaf_line(path: &[&str], value: &str) -> String {
    if path.is_empty() { value.to_string() } else { format!("{} {value}", path.join(" ")) }
}
