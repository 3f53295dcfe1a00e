//! Record types - the rows held by the content store
//!
//! Two record kinds share the `(directory, name)` addressing scheme:
//! - `Page`: renderable content with title, date and draft status
//! - `Document`: an opaque JSON blob

use crate::path::IndexKey;
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The two record kinds kept by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Page,
    Document,
}

impl RecordKind {
    /// Get the string representation, which is also the table name
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Page => "page",
            RecordKind::Document => "document",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Ordering of a directory listing by page date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

impl FromStr for SortOrder {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            _ => Err(Error::InvalidOrder(s.to_string())),
        }
    }
}

/// A content page, built from a front-matter file under the pages root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub title: String,
    /// `/`-prefixed directory relative to the pages root
    pub directory: String,
    /// File base name without extension
    pub name: String,
    pub date: DateTime<Utc>,
    pub draft: bool,
    /// JSON text of the parsed file
    pub content: String,
}

impl Page {
    /// Create a page with default metadata: empty title, draft, dated `date`.
    pub fn new(key: IndexKey, date: DateTime<Utc>, content: impl Into<String>) -> Self {
        Self {
            title: String::new(),
            directory: key.directory,
            name: key.name,
            date,
            draft: true,
            content: content.into(),
        }
    }

    /// Virtual path of this page, e.g. `/news/item1`
    pub fn path(&self) -> String {
        IndexKey::join(&self.directory, &self.name)
    }

    /// Parse the stored content
    pub fn json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::from_str(&self.content)
    }

    /// Metadata plus parsed content, as served to clients
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::json!({
            "path": self.path(),
            "title": self.title,
            "directory": self.directory,
            "name": self.name,
            "date": self.date,
            "draft": self.draft,
            "content": self.json().unwrap_or_default(),
        })
    }

    /// Listing view of this page without its content
    pub fn meta(&self) -> PageMeta {
        PageMeta {
            title: self.title.clone(),
            directory: self.directory.clone(),
            name: self.name.clone(),
            date: self.date,
            draft: self.draft,
        }
    }
}

/// Page metadata as returned by directory listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageMeta {
    pub title: String,
    pub directory: String,
    pub name: String,
    pub date: DateTime<Utc>,
    pub draft: bool,
}

/// A JSON document, built from a file under the data root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub directory: String,
    pub name: String,
    /// Raw source text, byte-identical to the file
    pub content: String,
}

impl Document {
    pub fn new(key: IndexKey, content: impl Into<String>) -> Self {
        Self {
            directory: key.directory,
            name: key.name,
            content: content.into(),
        }
    }

    pub fn path(&self) -> String {
        IndexKey::join(&self.directory, &self.name)
    }

    pub fn json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::from_str(&self.content)
    }

    pub fn to_value(&self) -> serde_json::Value {
        serde_json::json!({
            "path": self.path(),
            "directory": self.directory,
            "name": self.name,
            "content": self.json().unwrap_or_default(),
        })
    }
}
