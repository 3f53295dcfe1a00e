//! # PicoCMS - lightweight content backend
//!
//! Synchronizes two directory trees into a SQLite store so a web application
//! can look content up by path:
//! - a pages root of TOML front-matter files, stored as [`Page`] records
//! - a data root of JSON files, stored as [`Document`] records
//!
//! Every file is addressed by a `/`-prefixed virtual path built from its
//! directory relative to the scan root and its base name without extension,
//! so `pages/news/item1.toml` is served as `/news/item1`.
//!
//! Synchronization is always a full rebuild executed in a single transaction.

pub mod cms;
pub mod config;
pub mod parser;
pub mod path;
pub mod record;
pub mod server;
pub mod storage;
pub mod sync;
pub mod ui;
pub mod watcher;

// Re-exports for convenient access
pub use cms::Cms;
pub use config::CmsConfig;
pub use path::IndexKey;
pub use record::{Document, Page, PageMeta, RecordKind, SortOrder};
pub use storage::ContentStore;
pub use sync::{SyncEngine, SyncStats};

use std::path::PathBuf;

/// Result type alias for PicoCMS operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for PicoCMS operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Parse error in {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("Duplicate {kind} path: {path}")]
    DuplicateKey { kind: RecordKind, path: String },

    #[error("Invalid {kind} path: {path}")]
    NotFound { kind: RecordKind, path: String },

    #[error("Invalid sort order: {0} (expected \"asc\" or \"desc\")")]
    InvalidOrder(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Walk error: {0}")]
    Walk(#[from] ignore::Error),
}

impl Error {
    /// Lookup misses are expected control flow for callers probing optional content.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }

    pub(crate) fn parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Error::Parse {
            path: path.into(),
            message: message.into(),
        }
    }
}
