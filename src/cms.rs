//! CMS facade - the surface a host application calls into
//!
//! Owns the store handle and the configured source roots. The host decides
//! when to `rebuild()` and when to `teardown()`; everything else is a read.

use crate::config::{ensure_db_dir, CmsConfig};
use crate::record::{Document, Page, PageMeta, RecordKind, SortOrder};
use crate::storage::{ContentStore, DbStats};
use crate::sync::{SyncEngine, SyncStats};
use crate::Result;

pub struct Cms {
    config: CmsConfig,
    store: ContentStore,
    engine: SyncEngine,
}

impl Cms {
    /// Open (or create) the store named by `config.database`.
    ///
    /// Existing rows are kept until the next `rebuild()` or `clear()`.
    pub fn initialize(config: CmsConfig) -> Result<Self> {
        ensure_db_dir(&config.database)?;
        let store = ContentStore::open(&config.database)?;
        tracing::info!("Opened content store at {}", config.database.display());
        Ok(Self::with_store(config, store))
    }

    /// Use an already opened store; `config.database` is informational only.
    pub fn with_store(config: CmsConfig, store: ContentStore) -> Self {
        let engine = SyncEngine::new(config.pages.clone(), config.data.clone());
        Self {
            config,
            store,
            engine,
        }
    }

    pub fn config(&self) -> &CmsConfig {
        &self.config
    }

    /// Release the store connection. Close failures are logged, never returned.
    pub fn teardown(self) {
        match self.store.close() {
            Ok(()) => tracing::debug!("Closed content store"),
            Err(e) => tracing::warn!("Ignoring error while closing content store: {}", e),
        }
    }

    /// Full resync: `clear()` followed by `parse()`, committed as one unit
    pub fn rebuild(&mut self) -> Result<SyncStats> {
        self.engine.rebuild(&mut self.store)
    }

    pub fn clear(&mut self) -> Result<()> {
        self.store.clear()
    }

    pub fn parse(&mut self) -> Result<SyncStats> {
        self.engine.parse(&mut self.store)
    }

    /// Page at `path`, e.g. `/news/item1`
    pub fn get_content(&self, path: &str) -> Result<Page> {
        self.store.get_page_by_path(path)
    }

    /// Document at `path`, e.g. `/site`
    pub fn get_data(&self, path: &str) -> Result<Document> {
        self.store.get_document_by_path(path)
    }

    pub fn list_content(&self, directory: &str, order: SortOrder) -> Result<Vec<PageMeta>> {
        self.store.list_pages(directory, order)
    }

    pub fn content_count(&self) -> Result<usize> {
        self.store.count(RecordKind::Page)
    }

    pub fn data_count(&self) -> Result<usize> {
        self.store.count(RecordKind::Document)
    }

    pub fn stats(&self) -> Result<DbStats> {
        self.store.stats()
    }
}
