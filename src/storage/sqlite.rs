//! SQLite storage implementation

use super::schema;
use crate::path::IndexKey;
use crate::record::{Document, Page, PageMeta, RecordKind, SortOrder};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use std::path::Path;

/// Fixed-width UTC timestamps, so text ordering in SQL is chronological.
const DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";

/// SQLite-backed storage for pages and documents
pub struct ContentStore {
    conn: Connection,
}

impl ContentStore {
    /// Open a database file (creates if doesn't exist)
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Create any missing tables; existing rows are kept
    fn initialize_schema(&self) -> Result<()> {
        create_schema(&self.conn)
    }

    /// Start a write transaction. Dropping it without `commit` rolls back.
    pub fn transaction(&mut self) -> Result<StoreTransaction<'_>> {
        Ok(StoreTransaction {
            tx: self.conn.transaction()?,
        })
    }

    /// Drop and recreate both tables
    pub fn clear(&mut self) -> Result<()> {
        let tx = self.transaction()?;
        tx.clear()?;
        tx.commit()
    }

    /// Close the connection, reporting any failure
    pub fn close(self) -> Result<()> {
        self.conn.close().map_err(|(_, e)| Error::Storage(e))
    }

    // ========== Page Operations ==========

    /// Append a page; its `(directory, name)` must not exist yet
    pub fn insert_page(&self, page: &Page) -> Result<()> {
        insert_page(&self.conn, page)
    }

    /// Get a page by its key
    pub fn get_page(&self, directory: &str, name: &str) -> Result<Option<Page>> {
        self.conn
            .query_row(
                "SELECT title, directory, name, date, draft, content FROM page WHERE directory = ?1 AND name = ?2",
                params![directory, name],
                row_to_page,
            )
            .optional()
            .map_err(Into::into)
    }

    /// Get a page by virtual path, e.g. `/news/item1`
    pub fn get_page_by_path(&self, path: &str) -> Result<Page> {
        let key = IndexKey::split(path);
        self.get_page(&key.directory, &key.name)?
            .ok_or_else(|| Error::NotFound {
                kind: RecordKind::Page,
                path: path.to_string(),
            })
    }

    /// List page metadata in one directory (exact match), ordered by date
    pub fn list_pages(&self, directory: &str, order: SortOrder) -> Result<Vec<PageMeta>> {
        let sql = format!(
            "SELECT title, directory, name, date, draft FROM page WHERE directory = ?1 ORDER BY date {}, name ASC",
            order.as_sql()
        );
        let mut stmt = self.conn.prepare(&sql)?;

        let pages = stmt
            .query_map([directory], row_to_page_meta)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(pages)
    }

    // ========== Document Operations ==========

    /// Append a document; its `(directory, name)` must not exist yet
    pub fn insert_document(&self, document: &Document) -> Result<()> {
        insert_document(&self.conn, document)
    }

    /// Get a document by its key
    pub fn get_document(&self, directory: &str, name: &str) -> Result<Option<Document>> {
        self.conn
            .query_row(
                "SELECT directory, name, content FROM document WHERE directory = ?1 AND name = ?2",
                params![directory, name],
                |row| {
                    Ok(Document {
                        directory: row.get(0)?,
                        name: row.get(1)?,
                        content: row.get(2)?,
                    })
                },
            )
            .optional()
            .map_err(Into::into)
    }

    /// Get a document by virtual path, e.g. `/site`
    pub fn get_document_by_path(&self, path: &str) -> Result<Document> {
        let key = IndexKey::split(path);
        self.get_document(&key.directory, &key.name)?
            .ok_or_else(|| Error::NotFound {
                kind: RecordKind::Document,
                path: path.to_string(),
            })
    }

    // ========== Counts ==========

    /// Count all rows of one kind
    pub fn count(&self, kind: RecordKind) -> Result<usize> {
        let sql = format!("SELECT COUNT(*) FROM {}", kind.as_str());
        let count: i64 = self.conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Get database statistics
    pub fn stats(&self) -> Result<DbStats> {
        Ok(DbStats {
            pages: self.count(RecordKind::Page)?,
            documents: self.count(RecordKind::Document)?,
        })
    }
}

/// Write access inside one SQLite transaction.
///
/// Used by the sync engine so a rebuild is committed whole or not at all.
pub struct StoreTransaction<'a> {
    tx: Transaction<'a>,
}

impl StoreTransaction<'_> {
    /// Drop and recreate both tables
    pub fn clear(&self) -> Result<()> {
        for stmt in schema::DROP_TABLES {
            self.tx.execute(stmt, [])?;
        }
        create_schema(&self.tx)
    }

    pub fn insert_page(&self, page: &Page) -> Result<()> {
        insert_page(&self.tx, page)
    }

    pub fn insert_document(&self, document: &Document) -> Result<()> {
        insert_document(&self.tx, document)
    }

    pub fn commit(self) -> Result<()> {
        self.tx.commit()?;
        Ok(())
    }
}

fn create_schema(conn: &Connection) -> Result<()> {
    for stmt in schema::all_schema_statements() {
        conn.execute(stmt, [])?;
    }
    Ok(())
}

fn insert_page(conn: &Connection, page: &Page) -> Result<()> {
    conn.execute(
        r#"
        INSERT INTO page (title, directory, name, date, draft, content)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
        params![
            page.title,
            page.directory,
            page.name,
            encode_date(&page.date),
            page.draft,
            page.content,
        ],
    )
    .map_err(|e| insert_error(e, RecordKind::Page, page.path()))?;
    tracing::debug!("Inserted page {}", page.path());
    Ok(())
}

fn insert_document(conn: &Connection, document: &Document) -> Result<()> {
    conn.execute(
        "INSERT INTO document (directory, name, content) VALUES (?1, ?2, ?3)",
        params![document.directory, document.name, document.content],
    )
    .map_err(|e| insert_error(e, RecordKind::Document, document.path()))?;
    tracing::debug!("Inserted document {}", document.path());
    Ok(())
}

/// The unique `(directory, name)` index is the only constraint an insert can violate
fn insert_error(err: rusqlite::Error, kind: RecordKind, path: String) -> Error {
    match err {
        rusqlite::Error::SqliteFailure(ref failure, _)
            if failure.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            Error::DuplicateKey { kind, path }
        }
        other => Error::Storage(other),
    }
}

fn encode_date(date: &DateTime<Utc>) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn decode_date(idx: usize, text: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}

/// Helper to convert a row to a Page
fn row_to_page(row: &rusqlite::Row) -> rusqlite::Result<Page> {
    let date: String = row.get(3)?;
    Ok(Page {
        title: row.get(0)?,
        directory: row.get(1)?,
        name: row.get(2)?,
        date: decode_date(3, &date)?,
        draft: row.get(4)?,
        content: row.get(5)?,
    })
}

fn row_to_page_meta(row: &rusqlite::Row) -> rusqlite::Result<PageMeta> {
    let date: String = row.get(3)?;
    Ok(PageMeta {
        title: row.get(0)?,
        directory: row.get(1)?,
        name: row.get(2)?,
        date: decode_date(3, &date)?,
        draft: row.get(4)?,
    })
}

/// Database statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct DbStats {
    pub pages: usize,
    pub documents: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_page(directory: &str, name: &str, day: u32) -> Page {
        let key = IndexKey {
            directory: directory.to_string(),
            name: name.to_string(),
        };
        let date = Utc.with_ymd_and_hms(2017, 1, day, 12, 0, 0).unwrap();
        let mut page = Page::new(key, date, r#"{"k":"v"}"#);
        page.title = format!("{} title", name);
        page
    }

    fn sample_document(directory: &str, name: &str) -> Document {
        let key = IndexKey {
            directory: directory.to_string(),
            name: name.to_string(),
        };
        Document::new(key, "{\"name\": \"PicoCMS\"}")
    }

    #[test]
    fn test_page_crud() {
        let store = ContentStore::open_in_memory().unwrap();
        let page = sample_page("/news", "item1", 3);
        store.insert_page(&page).unwrap();

        let retrieved = store.get_page_by_path("/news/item1").unwrap();
        assert_eq!(retrieved, page);
        assert_eq!(store.count(RecordKind::Page).unwrap(), 1);
    }

    #[test]
    fn test_document_crud() {
        let store = ContentStore::open_in_memory().unwrap();
        store.insert_document(&sample_document("/", "site")).unwrap();

        let doc = store.get_document_by_path("/site").unwrap();
        assert_eq!(doc.name, "site");
        assert_eq!(doc.content, "{\"name\": \"PicoCMS\"}");
        assert_eq!(store.count(RecordKind::Document).unwrap(), 1);
    }

    #[test]
    fn test_missing_path_is_not_found() {
        let store = ContentStore::open_in_memory().unwrap();
        store.insert_page(&sample_page("/", "index", 1)).unwrap();

        let err = store.get_page_by_path("/missing").unwrap_err();
        assert!(err.is_not_found());
        assert!(store.get_page_by_path("index").unwrap_err().is_not_found());
        assert!(store.get_document_by_path("/index").unwrap_err().is_not_found());
    }

    #[test]
    fn test_duplicate_key_rejected() {
        let store = ContentStore::open_in_memory().unwrap();
        store.insert_page(&sample_page("/news", "item1", 1)).unwrap();

        let err = store.insert_page(&sample_page("/news", "item1", 2)).unwrap_err();
        assert!(matches!(
            err,
            Error::DuplicateKey { kind: RecordKind::Page, ref path } if path == "/news/item1"
        ));

        // Same key in a different kind is fine
        store.insert_document(&sample_document("/news", "item1")).unwrap();
    }

    #[test]
    fn test_sync_timestamp_survives_storage() {
        let store = ContentStore::open_in_memory().unwrap();
        let key = IndexKey {
            directory: "/".to_string(),
            name: "undated".to_string(),
        };
        let page = Page::new(key, crate::sync::sync_timestamp(), "{}");
        store.insert_page(&page).unwrap();

        assert_eq!(store.get_page_by_path("/undated").unwrap(), page);
    }

    #[test]
    fn test_list_pages_ordering() {
        let store = ContentStore::open_in_memory().unwrap();
        store.insert_page(&sample_page("/news", "b", 20)).unwrap();
        store.insert_page(&sample_page("/news", "a", 5)).unwrap();
        store.insert_page(&sample_page("/news", "c", 11)).unwrap();
        store.insert_page(&sample_page("/", "index", 1)).unwrap();

        let asc = store.list_pages("/news", SortOrder::Asc).unwrap();
        let names: Vec<_> = asc.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["a", "c", "b"]);
        assert!(asc.windows(2).all(|w| w[0].date <= w[1].date));

        let desc = store.list_pages("/news", SortOrder::Desc).unwrap();
        let names: Vec<_> = desc.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["b", "c", "a"]);

        assert!(store.list_pages("/nothing", SortOrder::Asc).unwrap().is_empty());
    }

    #[test]
    fn test_clear_is_repeatable() {
        let mut store = ContentStore::open_in_memory().unwrap();
        store.insert_page(&sample_page("/", "index", 1)).unwrap();
        store.insert_document(&sample_document("/", "site")).unwrap();

        store.clear().unwrap();
        store.clear().unwrap();
        assert_eq!(store.stats().unwrap(), DbStats { pages: 0, documents: 0 });
    }

    #[test]
    fn test_uncommitted_transaction_rolls_back() {
        let mut store = ContentStore::open_in_memory().unwrap();
        store.insert_page(&sample_page("/", "index", 1)).unwrap();

        {
            let tx = store.transaction().unwrap();
            tx.clear().unwrap();
            tx.insert_page(&sample_page("/", "other", 2)).unwrap();
        }

        assert_eq!(store.count(RecordKind::Page).unwrap(), 1);
        assert!(store.get_page_by_path("/index").is_ok());
    }

    #[test]
    fn test_dates_round_trip_with_subseconds() {
        let store = ContentStore::open_in_memory().unwrap();
        let mut page = sample_page("/", "index", 1);
        page.date = Utc.timestamp_opt(1_500_000_000, 123_456_000).unwrap();
        store.insert_page(&page).unwrap();

        assert_eq!(store.get_page_by_path("/index").unwrap().date, page.date);
    }
}
