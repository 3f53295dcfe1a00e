//! Storage Layer - SQLite-backed persistence
//!
//! System of record is SQLite with tables:
//! - page(title, directory, name, date, draft, content)
//! - document(directory, name, content)
//!
//! Both are keyed by a unique `(directory, name)` index.

pub mod schema;
pub mod sqlite;

pub use sqlite::{ContentStore, DbStats, StoreTransaction};
