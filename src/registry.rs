//! Index registry: one live handle per index name, for the life of
//! the process.
//!
//! The registry maps logical index names to opened engine handles,
//! creating each index on first access and reusing the handle
//! thereafter. The check-create-store sequence is atomic per name
//! (concurrent callers for the same name converge on one handle, and
//! the underlying create happens exactly once); lookups and creations
//! for different names do not serialize behind a global lock.
//!
//! # On-disk layout
//!
//! ```text
//! {index_root}/
//! ├── {name}/
//! │   ├── meta.json           # Index metadata sidecar
//! │   └── tantivy/            # Engine-owned index files
//! ```

use crate::engine::{SearchEngine, TantivyEngine};
use crate::error::{PoolError, Result};
use crate::provision;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

/// Current metadata sidecar version
pub const SCHEMA_VERSION: u32 = 1;

/// Per-index metadata sidecar
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexMetadata {
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub schema_version: u32,
}

impl IndexMetadata {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            created_at: Utc::now(),
            schema_version: SCHEMA_VERSION,
        }
    }
}

/// A registered index: the shared handle plus its writer gate.
///
/// Entries live until process shutdown. Dropping a `SearchSession`
/// or finishing a write never closes the handle.
pub struct IndexEntry<E: SearchEngine> {
    pub(crate) name: String,
    pub(crate) engine: Arc<E>,
    // Declared before `handle` so the writer (which may hold an
    // engine-level lock file) is released first on drop.
    pub(crate) writer: Mutex<E::Writer>,
    pub(crate) handle: E::Handle,
    meta: IndexMetadata,
}

impl<E: SearchEngine> IndexEntry<E> {
    /// Logical name of this index
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Metadata recorded when the index was created
    pub fn metadata(&self) -> &IndexMetadata {
        &self.meta
    }

    /// The engine handle backing this entry
    pub fn handle(&self) -> &E::Handle {
        &self.handle
    }
}

impl<E: SearchEngine> std::fmt::Debug for IndexEntry<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexEntry")
            .field("name", &self.name)
            .field("created_at", &self.meta.created_at)
            .finish_non_exhaustive()
    }
}

/// Name-keyed registry of opened indexes
pub struct IndexRegistry<E: SearchEngine = TantivyEngine> {
    engine: Arc<E>,
    index_root: PathBuf,
    entries: DashMap<String, Arc<IndexEntry<E>>>,
}

impl<E: SearchEngine> IndexRegistry<E> {
    /// Create a registry rooted at `index_root`
    pub fn new(engine: E, index_root: PathBuf) -> Self {
        Self {
            engine: Arc::new(engine),
            index_root,
            entries: DashMap::new(),
        }
    }

    /// Directory holding everything for one index
    fn index_dir(&self, name: &str) -> PathBuf {
        self.index_root.join(name)
    }

    /// Engine-owned subdirectory
    fn engine_dir(&self, name: &str) -> PathBuf {
        self.index_dir(name).join("tantivy")
    }

    /// Metadata sidecar path
    fn metadata_path(&self, name: &str) -> PathBuf {
        self.index_dir(name).join("meta.json")
    }

    /// Return the live handle for `name`, opening or creating the
    /// index on first access.
    ///
    /// `schema_fn` is invoked only when the index does not yet exist
    /// on disk; an existing index is opened with its stored schema
    /// and the supplied one is ignored.
    pub fn get_or_create<F>(&self, name: &str, schema_fn: F) -> Result<Arc<IndexEntry<E>>>
    where
        F: FnOnce() -> E::Schema,
    {
        validate_name(name)?;

        // Fast path: no I/O, no shard write lock
        if let Some(entry) = self.entries.get(name) {
            return Ok(Arc::clone(&entry));
        }

        // Double-checked under the shard lock: losers of the race
        // above land on Occupied and reuse the winner's handle.
        match self.entries.entry(name.to_string()) {
            Entry::Occupied(occupied) => Ok(Arc::clone(occupied.get())),
            Entry::Vacant(vacant) => {
                let entry = Arc::new(self.open_or_create(name, schema_fn)?);
                vacant.insert(Arc::clone(&entry));
                Ok(entry)
            }
        }
    }

    /// Return the handle for `name` if it is already open
    pub fn get(&self, name: &str) -> Option<Arc<IndexEntry<E>>> {
        self.entries.get(name).map(|e| Arc::clone(&e))
    }

    /// Whether a live handle for `name` exists in this registry
    pub fn is_open(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Whether the index exists, either open in this registry or on disk
    pub fn exists(&self, name: &str) -> Result<bool> {
        if self.is_open(name) {
            return Ok(true);
        }
        self.engine.exists_at(&self.engine_dir(name))
    }

    /// Read metadata for `name`, from the live entry or from disk
    pub fn metadata(&self, name: &str) -> Result<IndexMetadata> {
        if let Some(entry) = self.entries.get(name) {
            return Ok(entry.meta.clone());
        }
        self.read_metadata(name)
    }

    /// List metadata for every index under the root, open or not
    pub fn list(&self) -> Result<Vec<IndexMetadata>> {
        if !self.index_root.exists() {
            return Ok(Vec::new());
        }

        let mut indexes = Vec::new();

        for dir_entry in fs::read_dir(&self.index_root)? {
            let dir_entry = dir_entry?;
            if dir_entry.file_type()?.is_dir() {
                if let Some(name) = dir_entry.file_name().to_str() {
                    if let Ok(meta) = self.read_metadata(name) {
                        indexes.push(meta);
                    }
                }
            }
        }

        Ok(indexes)
    }

    /// Delete and re-create an index from scratch.
    ///
    /// Refused while a live handle exists: handles are shared for
    /// the process's lifetime and are never swapped underneath their
    /// searchers and writers.
    ///
    /// The check, the delete and the re-creation all run under the
    /// name's shard lock, so a concurrent `get_or_create` either
    /// opens the index before this (and the recreate is refused) or
    /// lands on the freshly created entry afterwards. It can never
    /// hold a handle over a directory this call is deleting.
    pub fn recreate<F>(&self, name: &str, schema_fn: F) -> Result<Arc<IndexEntry<E>>>
    where
        F: FnOnce() -> E::Schema,
    {
        validate_name(name)?;

        match self.entries.entry(name.to_string()) {
            Entry::Occupied(_) => Err(PoolError::IndexInUse(name.to_string())),
            Entry::Vacant(vacant) => {
                let index_dir = self.index_dir(name);
                if index_dir.exists() {
                    tracing::info!(index = name, "Clearing existing index for re-creation");
                    fs::remove_dir_all(&index_dir)?;
                }

                let entry = Arc::new(self.open_or_create(name, schema_fn)?);
                vacant.insert(Arc::clone(&entry));
                Ok(entry)
            }
        }
    }

    fn open_or_create<F>(&self, name: &str, schema_fn: F) -> Result<IndexEntry<E>>
    where
        F: FnOnce() -> E::Schema,
    {
        let index_dir = self.index_dir(name);
        provision::ensure(&index_dir)?;

        let engine_dir = self.engine_dir(name);

        let (handle, meta) = if self.engine.exists_at(&engine_dir)? {
            tracing::debug!(index = name, "Opening existing index, stored schema wins");
            let handle = self.engine.open(&engine_dir)?;
            let meta = match self.read_metadata(name) {
                Ok(meta) => meta,
                // Index created out-of-band; backfill the sidecar
                Err(_) => {
                    let meta = IndexMetadata::new(name);
                    self.write_metadata(&meta)?;
                    meta
                }
            };
            (handle, meta)
        } else {
            if provision::is_nonempty_dir(&engine_dir)? {
                return Err(PoolError::DirectoryNotEmpty(
                    engine_dir.display().to_string(),
                ));
            }
            provision::ensure(&engine_dir)?;

            tracing::info!(index = name, "Creating index");
            let handle = self.engine.create(&engine_dir, schema_fn())?;
            let meta = IndexMetadata::new(name);
            self.write_metadata(&meta)?;
            (handle, meta)
        };

        let writer = self.engine.writer(&handle)?;

        Ok(IndexEntry {
            name: name.to_string(),
            engine: Arc::clone(&self.engine),
            writer: Mutex::new(writer),
            handle,
            meta,
        })
    }

    fn read_metadata(&self, name: &str) -> Result<IndexMetadata> {
        let meta_path = self.metadata_path(name);

        if !meta_path.exists() {
            return Err(PoolError::UnknownIndex(name.to_string()));
        }

        let contents = fs::read_to_string(&meta_path)?;
        let meta: IndexMetadata = serde_json::from_str(&contents)?;

        Ok(meta)
    }

    fn write_metadata(&self, meta: &IndexMetadata) -> Result<()> {
        let json = serde_json::to_string_pretty(meta)?;
        fs::write(self.metadata_path(&meta.name), json)?;

        Ok(())
    }
}

impl<E: SearchEngine> std::fmt::Debug for IndexRegistry<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexRegistry")
            .field("index_root", &self.index_root)
            .field("open", &self.entries.len())
            .finish()
    }
}

/// Reject names that would escape the index root or collide with
/// path syntax.
fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(PoolError::InvalidName("name must not be empty".to_string()));
    }

    if name == "." || name == ".." || name.contains('/') || name.contains('\\') {
        return Err(PoolError::InvalidName(name.to_string()));
    }

    Ok(())
}
