//! File parser - turns one source file into structured data plus JSON text
//!
//! Supported formats are selected by extension:
//! - `.toml`: front-matter table, re-encoded as canonical JSON
//! - `.json`: validated, kept verbatim

use crate::path::name_for;
use crate::{Error, Result};
use serde_json::Value;
use std::path::Path;

/// Source formats understood by the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileFormat {
    /// TOML front-matter; stored content is a fresh JSON encoding
    Toml,
    /// JSON; stored content is the raw source text
    Json,
}

impl FileFormat {
    /// Select a format from the file extension (exact, case-sensitive).
    ///
    /// Returns `None` for anything else; callers decide what to do with it.
    pub fn detect(path: &Path) -> Option<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Some(FileFormat::Toml),
            Some("json") => Some(FileFormat::Json),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FileFormat::Toml => "toml",
            FileFormat::Json => "json",
        }
    }
}

/// Result of parsing a single file
#[derive(Debug, Clone)]
pub struct ParsedFile {
    /// File base name without extension
    pub name: String,
    pub format: FileFormat,
    /// Structured data, used to lift page metadata
    pub data: Value,
    /// Canonical JSON text stored as record content
    pub content: String,
}

/// Read and parse `path` as `format`.
pub fn parse_file(path: &Path, format: FileFormat) -> Result<ParsedFile> {
    let raw = std::fs::read_to_string(path)?;
    let name = name_for(path)?;
    let (data, content) = parse_str(path, format, raw)?;

    Ok(ParsedFile {
        name,
        format,
        data,
        content,
    })
}

/// Parse already-loaded source text. `path` is only used in error messages.
pub fn parse_str(path: &Path, format: FileFormat, raw: String) -> Result<(Value, String)> {
    match format {
        FileFormat::Toml => {
            let table: toml::Table =
                toml::from_str(&raw).map_err(|e| Error::parse(path, e.to_string()))?;
            let data = table_to_json(table).map_err(|msg| Error::parse(path, msg))?;
            let content =
                serde_json::to_string(&data).map_err(|e| Error::parse(path, e.to_string()))?;
            Ok((data, content))
        }
        FileFormat::Json => {
            let data: Value =
                serde_json::from_str(&raw).map_err(|e| Error::parse(path, e.to_string()))?;
            Ok((data, raw))
        }
    }
}

fn table_to_json(table: toml::Table) -> std::result::Result<Value, String> {
    let mut map = serde_json::Map::new();
    for (key, value) in table {
        map.insert(key, toml_to_json(value)?);
    }
    Ok(Value::Object(map))
}

fn toml_to_json(value: toml::Value) -> std::result::Result<Value, String> {
    let converted = match value {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::from(i),
        toml::Value::Float(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .ok_or_else(|| format!("float {} has no JSON representation", f))?,
        toml::Value::Boolean(b) => Value::Bool(b),
        // RFC 3339 text, or the bare date/time for local values
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(toml_to_json)
                .collect::<std::result::Result<Vec<_>, _>>()?,
        ),
        toml::Value::Table(table) => table_to_json(table)?,
    };
    Ok(converted)
}
