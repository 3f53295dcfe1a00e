//! Sync engine - full rebuild of the store from the two source trees
//!
//! A rebuild:
//! 1. drops and recreates both tables
//! 2. walks the pages root, one `Page` per `.toml`/`.json` file
//! 3. walks the data root, one `Document` per `.toml`/`.json` file
//!
//! All three steps run in a single transaction: any parse failure or
//! duplicate key rolls the store back to its previous contents.

use crate::parser::{parse_file, FileFormat};
use crate::path::IndexKey;
use crate::record::{Document, Page};
use crate::storage::{ContentStore, StoreTransaction};
use crate::{Error, Result};
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, SubsecRound, Utc};
use ignore::WalkBuilder;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Walks the source roots and writes records into a store
#[derive(Debug, Clone)]
pub struct SyncEngine {
    pages_root: PathBuf,
    data_root: PathBuf,
}

/// Outcome of one synchronization pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncStats {
    pub pages: usize,
    pub documents: usize,
    /// Files seen by the walk but not synchronized
    pub skipped: usize,
    pub elapsed: Duration,
}

impl SyncEngine {
    pub fn new(pages_root: impl Into<PathBuf>, data_root: impl Into<PathBuf>) -> Self {
        Self {
            pages_root: pages_root.into(),
            data_root: data_root.into(),
        }
    }

    /// Clear the store and repopulate it from both roots, atomically
    pub fn rebuild(&self, store: &mut ContentStore) -> Result<SyncStats> {
        let started = Instant::now();
        let tx = store.transaction()?;
        tx.clear()?;
        let mut stats = self.parse_into(&tx)?;
        tx.commit()?;

        stats.elapsed = started.elapsed();
        tracing::info!(
            "Rebuilt content store: {} pages, {} documents, {} skipped in {:.2?}",
            stats.pages,
            stats.documents,
            stats.skipped,
            stats.elapsed
        );
        Ok(stats)
    }

    /// Add records from both roots without clearing first.
    ///
    /// Fails with `DuplicateKey` if the store already holds any of them.
    pub fn parse(&self, store: &mut ContentStore) -> Result<SyncStats> {
        let started = Instant::now();
        let tx = store.transaction()?;
        let mut stats = self.parse_into(&tx)?;
        tx.commit()?;

        stats.elapsed = started.elapsed();
        Ok(stats)
    }

    fn parse_into(&self, tx: &StoreTransaction<'_>) -> Result<SyncStats> {
        // Undated pages all share the time of this pass
        let synced_at = sync_timestamp();
        let mut stats = SyncStats::default();

        for (path, format) in source_files(&self.pages_root, &mut stats.skipped)? {
            let key = IndexKey::from_path(&self.pages_root, &path)?;
            tracing::debug!("Processing page {} ({})", key, format.as_str());

            let parsed = parse_file(&path, format)?;
            let mut page = Page::new(key, synced_at, parsed.content);
            apply_page_overrides(&mut page, &parsed.data, &path)?;

            tx.insert_page(&page)?;
            stats.pages += 1;
        }

        for (path, format) in source_files(&self.data_root, &mut stats.skipped)? {
            let key = IndexKey::from_path(&self.data_root, &path)?;
            tracing::debug!("Processing document {} ({})", key, format.as_str());

            let parsed = parse_file(&path, format)?;
            tx.insert_document(&Document::new(key, parsed.content))?;
            stats.documents += 1;
        }

        Ok(stats)
    }
}

/// Regular files under `root` with a supported format, in file name order.
fn source_files(root: &Path, skipped: &mut usize) -> Result<Vec<(PathBuf, FileFormat)>> {
    if !root.exists() {
        tracing::warn!("Source root {} does not exist, treating it as empty", root.display());
        return Ok(Vec::new());
    }

    let walker = WalkBuilder::new(root)
        .standard_filters(false) // every file counts, hidden or ignored
        .follow_links(false)
        .sort_by_file_name(|a, b| a.cmp(b))
        .build();

    let mut files = Vec::new();
    for entry in walker {
        let entry = entry?;
        let Some(file_type) = entry.file_type() else {
            continue;
        };

        if file_type.is_dir() {
            continue;
        }

        if !file_type.is_file() {
            tracing::debug!("Skipping non-regular file {}", entry.path().display());
            *skipped += 1;
            continue;
        }

        match FileFormat::detect(entry.path()) {
            Some(format) => files.push((entry.into_path(), format)),
            None => {
                tracing::warn!("Skipping {}: unsupported file extension", entry.path().display());
                *skipped += 1;
            }
        }
    }

    Ok(files)
}

/// Lift `title`, `draft` and `date` out of the parsed data into page fields.
fn apply_page_overrides(page: &mut Page, data: &Value, path: &Path) -> Result<()> {
    let Some(fields) = data.as_object() else {
        return Ok(());
    };

    if let Some(title) = fields.get("title") {
        page.title = title
            .as_str()
            .ok_or_else(|| Error::parse(path, "`title` must be a string"))?
            .to_string();
    }

    if let Some(draft) = fields.get("draft") {
        page.draft = draft
            .as_bool()
            .ok_or_else(|| Error::parse(path, "`draft` must be a boolean"))?;
    }

    if let Some(date) = fields.get("date") {
        let text = date
            .as_str()
            .ok_or_else(|| Error::parse(path, "`date` must be a date or string"))?;
        let date = parse_date(text)
            .ok_or_else(|| Error::parse(path, format!("unrecognized date `{}`", text)))?;
        // Stored dates are four-digit years in UTC
        if !(0..=9999).contains(&date.year()) {
            return Err(Error::parse(
                path,
                format!("date `{}` falls outside years 0000-9999 in UTC", text),
            ));
        }
        page.date = date;
    }

    Ok(())
}

/// Current time at the microsecond precision the store keeps
pub(crate) fn sync_timestamp() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Accepts RFC 3339, offset-less `YYYY-MM-DD[T| ]HH:MM:SS[.f]` (taken as UTC)
/// and bare `YYYY-MM-DD` (midnight UTC).
pub fn parse_date(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(date) = DateTime::parse_from_rfc3339(text) {
        return Some(date.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|day| day.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{RecordKind, SortOrder};
    use chrono::TimeZone;
    use tempfile::TempDir;

    struct Fixture {
        _dir: TempDir,
        pages: PathBuf,
        data: PathBuf,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            let pages = dir.path().join("pages");
            let data = dir.path().join("data");
            std::fs::create_dir_all(&pages).unwrap();
            std::fs::create_dir_all(&data).unwrap();
            Self { _dir: dir, pages, data }
        }

        fn page(&self, rel: &str, contents: &str) -> &Self {
            write(&self.pages.join(rel), contents);
            self
        }

        fn data(&self, rel: &str, contents: &str) -> &Self {
            write(&self.data.join(rel), contents);
            self
        }

        fn engine(&self) -> SyncEngine {
            SyncEngine::new(self.pages.clone(), self.data.clone())
        }
    }

    fn write(path: &Path, contents: &str) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, contents).unwrap();
    }

    #[test]
    fn test_rebuild_counts_and_keys() {
        let fx = Fixture::new();
        fx.page("index.toml", "title = \"Home\"\n")
            .page("news/a.toml", "title = \"A\"\n")
            .page("news/deep/b.json", "{\"title\": \"B\"}")
            .data("site.json", "{\"name\": \"PicoCMS\"}");

        let mut store = ContentStore::open_in_memory().unwrap();
        let stats = fx.engine().rebuild(&mut store).unwrap();

        assert_eq!((stats.pages, stats.documents, stats.skipped), (3, 1, 0));
        assert_eq!(store.get_page_by_path("/news/deep/b").unwrap().title, "B");
        assert_eq!(store.get_page_by_path("/index").unwrap().directory, "/");
        assert_eq!(store.get_document_by_path("/site").unwrap().directory, "/");
    }

    #[test]
    fn test_page_overrides() {
        let fx = Fixture::new();
        fx.page(
            "post.toml",
            "title = \"Post\"\ndraft = false\ndate = 2017-03-04T05:06:07Z\nauthor = \"jk\"\n",
        )
        .page("plain.toml", "body = \"text\"\n");

        let mut store = ContentStore::open_in_memory().unwrap();
        let stats = fx.engine().rebuild(&mut store).unwrap();

        let post = store.get_page_by_path("/post").unwrap();
        assert_eq!(post.title, "Post");
        assert!(!post.draft);
        assert_eq!(post.date, Utc.with_ymd_and_hms(2017, 3, 4, 5, 6, 7).unwrap());
        // Unrecognized keys only live in content
        assert_eq!(post.json().unwrap()["author"], "jk");

        let plain = store.get_page_by_path("/plain").unwrap();
        assert_eq!(plain.title, "");
        assert!(plain.draft);
        assert!(plain.date <= Utc::now());
        assert_eq!(stats.pages, 2);
    }

    #[test]
    fn test_wrong_override_type_is_parse_error() {
        let fx = Fixture::new();
        fx.page("bad.toml", "draft = \"no\"\n");

        let mut store = ContentStore::open_in_memory().unwrap();
        let err = fx.engine().rebuild(&mut store).unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
    }

    #[test]
    fn test_unsupported_files_skipped() {
        let fx = Fixture::new();
        fx.page("index.toml", "title = \"Home\"\n")
            .page("README.md", "# notes")
            .page(".DS_Store", "")
            .data("logo.svg", "<svg/>");

        let mut store = ContentStore::open_in_memory().unwrap();
        let stats = fx.engine().rebuild(&mut store).unwrap();

        assert_eq!(stats.pages, 1);
        assert_eq!(stats.skipped, 3);
        assert_eq!(store.count(RecordKind::Document).unwrap(), 0);
    }

    #[test]
    fn test_duplicate_key_fails_rebuild() {
        let fx = Fixture::new();
        fx.page("about.toml", "title = \"TOML\"\n")
            .page("about.json", "{\"title\": \"JSON\"}");

        let mut store = ContentStore::open_in_memory().unwrap();
        let err = fx.engine().rebuild(&mut store).unwrap_err();
        assert!(matches!(
            err,
            Error::DuplicateKey { kind: RecordKind::Page, ref path } if path == "/about"
        ));
    }

    #[test]
    fn test_failed_rebuild_keeps_previous_state() {
        let fx = Fixture::new();
        fx.page("index.toml", "title = \"Home\"\n")
            .data("site.json", "{\"name\": \"PicoCMS\"}");

        let mut store = ContentStore::open_in_memory().unwrap();
        let engine = fx.engine();
        engine.rebuild(&mut store).unwrap();

        fx.page("zzz.toml", "title = ");
        assert!(matches!(engine.rebuild(&mut store).unwrap_err(), Error::Parse { .. }));

        assert_eq!(store.count(RecordKind::Page).unwrap(), 1);
        assert_eq!(store.count(RecordKind::Document).unwrap(), 1);
        assert_eq!(store.get_page_by_path("/index").unwrap().title, "Home");
    }

    #[test]
    fn test_rebuild_is_idempotent() {
        let fx = Fixture::new();
        fx.page("news/a.toml", "title = \"A\"\ndate = 2017-01-01\n")
            .page("news/b.toml", "title = \"B\"\ndate = 2017-02-01\n")
            .data("site.json", "{\"name\": \"PicoCMS\"}");

        let mut store = ContentStore::open_in_memory().unwrap();
        let engine = fx.engine();

        engine.rebuild(&mut store).unwrap();
        let first = store.list_pages("/news", SortOrder::Asc).unwrap();
        let first_doc = store.get_document_by_path("/site").unwrap();

        engine.rebuild(&mut store).unwrap();
        assert_eq!(store.list_pages("/news", SortOrder::Asc).unwrap(), first);
        assert_eq!(store.get_document_by_path("/site").unwrap(), first_doc);
        assert_eq!(store.stats().unwrap().pages, 2);
    }

    #[test]
    fn test_parse_without_clear_collides() {
        let fx = Fixture::new();
        fx.page("index.toml", "title = \"Home\"\n");

        let mut store = ContentStore::open_in_memory().unwrap();
        let engine = fx.engine();
        engine.parse(&mut store).unwrap();

        assert!(matches!(
            engine.parse(&mut store).unwrap_err(),
            Error::DuplicateKey { .. }
        ));
        assert_eq!(store.count(RecordKind::Page).unwrap(), 1);
    }

    #[test]
    fn test_missing_root_is_empty() {
        let fx = Fixture::new();
        fx.page("index.toml", "title = \"Home\"\n");
        let engine = SyncEngine::new(fx.pages.clone(), fx.data.join("does-not-exist"));

        let mut store = ContentStore::open_in_memory().unwrap();
        let stats = engine.rebuild(&mut store).unwrap();
        assert_eq!((stats.pages, stats.documents), (1, 0));
    }

    #[test]
    fn test_out_of_range_year_is_parse_error() {
        let fx = Fixture::new();
        fx.page("news/b.toml", "title = \"B\"\ndate = 2017-01-01\n");

        let mut store = ContentStore::open_in_memory().unwrap();
        let engine = fx.engine();
        engine.rebuild(&mut store).unwrap();

        // Valid TOML, but year -1 once shifted to UTC
        fx.page("news/a.toml", "title = \"A\"\ndate = 0000-01-01T00:30:00+01:00\n");
        let err = engine.rebuild(&mut store).unwrap_err();
        assert!(matches!(err, Error::Parse { ref path, .. } if path.ends_with("a.toml")));

        // Year 10000 in UTC
        fx.page("news/a.toml", "title = \"A\"\ndate = 9999-12-31T23:00:00-02:00\n");
        assert!(matches!(engine.rebuild(&mut store).unwrap_err(), Error::Parse { .. }));

        assert_eq!(store.list_pages("/news", SortOrder::Asc).unwrap().len(), 1);

        fx.page("news/a.toml", "title = \"A\"\ndate = 0000-01-01T00:30:00Z\n");
        engine.rebuild(&mut store).unwrap();
        let listed = store.list_pages("/news", SortOrder::Asc).unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].title, "A");
        assert_eq!(store.get_page_by_path("/news/a").unwrap().date.year(), 0);
    }

    #[test]
    fn test_hidden_and_gitignored_files_are_synced() {
        let fx = Fixture::new();
        fx.page(".hidden.toml", "title = \"H\"\n")
            .page("visible.toml", "title = \"V\"\n")
            .page(".gitignore", "*.toml\n");

        let mut store = ContentStore::open_in_memory().unwrap();
        let stats = fx.engine().rebuild(&mut store).unwrap();

        // .gitignore itself has no supported extension
        assert_eq!((stats.pages, stats.skipped), (2, 1));
        assert_eq!(store.get_page_by_path("/.hidden").unwrap().title, "H");
        assert_eq!(store.get_page_by_path("/visible").unwrap().title, "V");
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinks_are_skipped() {
        use std::os::unix::fs::symlink;

        let fx = Fixture::new();
        fx.page("visible.toml", "title = \"V\"\n");

        let outside = tempfile::tempdir().unwrap();
        write(&outside.path().join("linked.toml"), "title = \"L\"\n");
        symlink(fx.pages.join("visible.toml"), fx.pages.join("alias.toml")).unwrap();
        symlink(outside.path(), fx.pages.join("shared")).unwrap();

        let mut store = ContentStore::open_in_memory().unwrap();
        let stats = fx.engine().rebuild(&mut store).unwrap();

        assert_eq!((stats.pages, stats.skipped), (1, 2));
        assert!(store.get_page_by_path("/alias").unwrap_err().is_not_found());
        assert!(store.get_page_by_path("/shared/linked").unwrap_err().is_not_found());
    }

    #[test]
    fn test_parse_date_formats() {
        let noon = Utc.with_ymd_and_hms(2017, 1, 2, 12, 0, 0).unwrap();
        assert_eq!(parse_date("2017-01-02T12:00:00Z"), Some(noon));
        assert_eq!(parse_date("2017-01-02T14:00:00+02:00"), Some(noon));
        assert_eq!(parse_date("2017-01-02T12:00:00"), Some(noon));
        assert_eq!(parse_date("2017-01-02 12:00:00"), Some(noon));
        assert_eq!(
            parse_date("2017-01-02"),
            Some(Utc.with_ymd_and_hms(2017, 1, 2, 0, 0, 0).unwrap())
        );
        assert_eq!(parse_date("07:32:00"), None);
        assert_eq!(parse_date("next tuesday"), None);
    }
}
