//! Search-engine capability interface.
//!
//! The pool never talks to a search engine directly; it depends on
//! the operations defined here. Any compliant binding can sit behind
//! the registry and coordinator; [`TantivyEngine`] is the one this
//! crate ships.
//!
//! The contract the pool relies on:
//!
//! - a `Handle` represents an opened on-disk index and is shared by
//!   all searchers and writers for the process's lifetime;
//! - `searcher` is cheap, non-blocking and read-only;
//! - at most one live `Writer` exists per handle (the coordinator
//!   enforces this; the engine may additionally hold its own lock);
//! - `commit` makes buffered changes visible to searchers acquired
//!   *after* it returns; `rollback` discards them.

mod tantivy;

pub use self::tantivy::{TantivyEngine, TantivyHandle};

use crate::error::Result;
use std::path::Path;

/// Operations the pool requires from an underlying search engine.
pub trait SearchEngine: Send + Sync + 'static {
    /// Field definitions an index is created with
    type Schema: Send + 'static;
    /// Opened on-disk index, shared process-wide
    type Handle: Send + Sync + 'static;
    /// Read-only point-in-time view
    type Searcher: Send + 'static;
    /// Buffered mutating view, exclusive per handle
    type Writer: Send + 'static;

    /// Whether an index already exists at `path`
    fn exists_at(&self, path: &Path) -> Result<bool>;

    /// Open an existing index. The stored schema wins; callers must
    /// not assume any supplied schema was applied.
    fn open(&self, path: &Path) -> Result<Self::Handle>;

    /// Create a fresh index at `path` with the given schema
    fn create(&self, path: &Path, schema: Self::Schema) -> Result<Self::Handle>;

    /// Acquire a searcher over the last reloaded committed state
    fn searcher(&self, handle: &Self::Handle) -> Result<Self::Searcher>;

    /// Construct the handle's writer
    fn writer(&self, handle: &Self::Handle) -> Result<Self::Writer>;

    /// Commit buffered changes and refresh the handle's reader so
    /// subsequently acquired searchers observe them
    fn commit(&self, handle: &Self::Handle, writer: &mut Self::Writer) -> Result<()>;

    /// Discard all buffered, uncommitted changes
    fn rollback(&self, writer: &mut Self::Writer) -> Result<()>;
}
