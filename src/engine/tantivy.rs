//! Tantivy binding for the engine capability interface.
//!
//! Wraps `tantivy::Index` open/create, and pairs each handle with a
//! manually reloaded `IndexReader` so that commit visibility is
//! deterministic: the reader is reloaded inside `commit`, therefore
//! any searcher acquired after `commit` returns sees the committed
//! documents, while searchers already in flight keep their snapshot.

use super::SearchEngine;
use crate::error::{PoolError, Result};
use std::path::Path;
use tantivy::directory::MmapDirectory;
use tantivy::schema::Schema;
use tantivy::{Index, IndexReader, IndexWriter, ReloadPolicy, Searcher};

/// Tantivy-backed search engine
#[derive(Debug, Clone)]
pub struct TantivyEngine {
    /// Heap budget handed to each index writer, in bytes
    writer_heap_bytes: usize,
}

/// An opened Tantivy index plus its long-lived reader
pub struct TantivyHandle {
    index: Index,
    reader: IndexReader,
}

impl TantivyHandle {
    fn new(index: Index) -> Result<Self> {
        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()
            .map_err(|e| PoolError::Engine(format!("Failed to create reader: {e}")))?;

        Ok(Self { index, reader })
    }

    /// The underlying Tantivy index
    pub fn index(&self) -> &Index {
        &self.index
    }

    /// Schema the index was created with
    pub fn schema(&self) -> Schema {
        self.index.schema()
    }
}

impl std::fmt::Debug for TantivyHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TantivyHandle").finish_non_exhaustive()
    }
}

impl TantivyEngine {
    /// Create an engine with the given per-writer heap budget
    pub fn new(writer_heap_bytes: usize) -> Self {
        Self { writer_heap_bytes }
    }
}

impl Default for TantivyEngine {
    fn default() -> Self {
        // Matches the default [writer] heap_mb
        Self::new(50_000_000)
    }
}

impl SearchEngine for TantivyEngine {
    type Schema = Schema;
    type Handle = TantivyHandle;
    type Searcher = Searcher;
    type Writer = IndexWriter;

    fn exists_at(&self, path: &Path) -> Result<bool> {
        if !path.is_dir() {
            return Ok(false);
        }

        let dir = MmapDirectory::open(path)
            .map_err(|e| PoolError::IndexOpen(format!("Failed to open {}: {e}", path.display())))?;

        Index::exists(&dir)
            .map_err(|e| PoolError::IndexOpen(format!("Failed to probe {}: {e}", path.display())))
    }

    fn open(&self, path: &Path) -> Result<TantivyHandle> {
        let index = Index::open_in_dir(path)
            .map_err(|e| PoolError::IndexOpen(format!("Failed to open index: {e}")))?;

        TantivyHandle::new(index)
    }

    fn create(&self, path: &Path, schema: Schema) -> Result<TantivyHandle> {
        let index = Index::create_in_dir(path, schema)
            .map_err(|e| PoolError::Engine(format!("Failed to create index: {e}")))?;

        TantivyHandle::new(index)
    }

    fn searcher(&self, handle: &TantivyHandle) -> Result<Searcher> {
        Ok(handle.reader.searcher())
    }

    fn writer(&self, handle: &TantivyHandle) -> Result<IndexWriter> {
        handle
            .index
            .writer(self.writer_heap_bytes)
            .map_err(|e| PoolError::Engine(format!("Failed to create writer: {e}")))
    }

    fn commit(&self, handle: &TantivyHandle, writer: &mut IndexWriter) -> Result<()> {
        writer
            .commit()
            .map_err(|e| PoolError::Engine(format!("Failed to commit: {e}")))?;

        handle
            .reader
            .reload()
            .map_err(|e| PoolError::Engine(format!("Failed to reload reader: {e}")))?;

        Ok(())
    }

    fn rollback(&self, writer: &mut IndexWriter) -> Result<()> {
        writer
            .rollback()
            .map_err(|e| PoolError::Engine(format!("Failed to rollback: {e}")))?;

        Ok(())
    }
}
