use std::path::PathBuf;
use std::sync::Arc;

use super::error::DataSourceError;
use super::loader::load_sources;
use super::model::UnifiedTable;

// ---------------------------------------------------------------------------
// Session-scoped dataset cache
// ---------------------------------------------------------------------------

/// Holds the unified table for one session.
///
/// The table is loaded on first use and shared read-only afterwards. It is
/// only re-read after an explicit [`invalidate`](Self::invalidate),
/// [`reload`](Self::reload) or [`set_sources`](Self::set_sources).
#[derive(Debug)]
pub struct DatasetCache {
    sources: Vec<PathBuf>,
    table: Option<Arc<UnifiedTable>>,
    loads: usize,
}

impl DatasetCache {
    pub fn new(sources: Vec<PathBuf>) -> Self {
        Self {
            sources,
            table: None,
            loads: 0,
        }
    }

    pub fn sources(&self) -> &[PathBuf] {
        &self.sources
    }

    /// The cached table, if one is loaded.
    pub fn cached(&self) -> Option<Arc<UnifiedTable>> {
        self.table.clone()
    }

    /// Number of successful reads from disk so far.
    pub fn load_count(&self) -> usize {
        self.loads
    }

    /// Return the cached table, reading the sources if nothing is cached.
    /// A failed read leaves the cache empty.
    pub fn get_or_load(&mut self) -> Result<Arc<UnifiedTable>, DataSourceError> {
        if let Some(table) = &self.table {
            return Ok(Arc::clone(table));
        }
        let table = Arc::new(load_sources(&self.sources)?);
        self.loads += 1;
        self.table = Some(Arc::clone(&table));
        Ok(table)
    }

    /// Drop the cached table; the next access re-reads the sources.
    pub fn invalidate(&mut self) {
        if self.table.take().is_some() {
            log::info!("Dataset cache invalidated");
        }
    }

    /// Invalidate and read the sources again.
    pub fn reload(&mut self) -> Result<Arc<UnifiedTable>, DataSourceError> {
        self.invalidate();
        self.get_or_load()
    }

    /// Point the cache at different source files.
    pub fn set_sources(&mut self, sources: Vec<PathBuf>) {
        self.sources = sources;
        self.invalidate();
    }
}
