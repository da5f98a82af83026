//! Pool facade: the surface the application lifecycle binds to.
//!
//! A [`SearchPool`] is built once at application startup, with the
//! schema constructor for each index name registered up front, and
//! then shared (it is cheap to clone, all fields are `Arc`) with
//! whatever per-request mechanism the surrounding framework uses.
//! Request handlers only ever call [`SearchPool::get_searcher`] and
//! [`SearchPool::with_writer`].

use crate::config::Config;
use crate::engine::{SearchEngine, TantivyEngine};
use crate::error::{PoolError, Result};
use crate::provision;
use crate::registry::{IndexEntry, IndexMetadata, IndexRegistry};
use crate::searcher::SearchSession;
use crate::writer::{WriteError, WriteOutcome, WriteSession};
use std::collections::HashMap;
use std::sync::Arc;

type SchemaProvider<E> = Box<dyn Fn() -> <E as SearchEngine>::Schema + Send + Sync>;

/// Shared facade over the registry, searcher pool and writer
/// coordinator
pub struct SearchPool<E: SearchEngine = TantivyEngine> {
    config: Arc<Config>,
    registry: Arc<IndexRegistry<E>>,
    schemas: Arc<HashMap<String, SchemaProvider<E>>>,
}

impl<E: SearchEngine> Clone for SearchPool<E> {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
            registry: Arc::clone(&self.registry),
            schemas: Arc::clone(&self.schemas),
        }
    }
}

impl<E: SearchEngine> std::fmt::Debug for SearchPool<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchPool")
            .field("registry", &self.registry)
            .field("registered", &self.schemas.len())
            .finish()
    }
}

/// Builder collecting configuration and per-index schema
/// constructors before the pool goes live
pub struct SearchPoolBuilder<E: SearchEngine = TantivyEngine> {
    config: Config,
    engine: E,
    schemas: HashMap<String, SchemaProvider<E>>,
}

impl SearchPoolBuilder<TantivyEngine> {
    /// Start a builder backed by the Tantivy engine
    pub fn new(config: Config) -> Self {
        let engine = TantivyEngine::new(config.writer_heap_bytes());
        Self::with_engine(config, engine)
    }
}

impl<E: SearchEngine> SearchPoolBuilder<E> {
    /// Start a builder with a custom engine binding
    pub fn with_engine(config: Config, engine: E) -> Self {
        Self {
            config,
            engine,
            schemas: HashMap::new(),
        }
    }

    /// Register the schema constructor for an index name.
    ///
    /// The constructor runs only if the index does not yet exist on
    /// disk at first access; an existing index keeps its stored
    /// schema.
    pub fn register<F>(mut self, name: impl Into<String>, schema_fn: F) -> Self
    where
        F: Fn() -> E::Schema + Send + Sync + 'static,
    {
        self.schemas.insert(name.into(), Box::new(schema_fn));
        self
    }

    /// Validate configuration, provision the index root and build
    /// the pool
    pub fn build(self) -> Result<SearchPool<E>> {
        self.config.validate()?;
        provision::ensure(&self.config.storage.index_root)?;

        let registry = IndexRegistry::new(self.engine, self.config.storage.index_root.clone());

        tracing::info!(
            registered = self.schemas.len(),
            root = ?self.config.storage.index_root,
            "Search pool ready"
        );

        Ok(SearchPool {
            config: Arc::new(self.config),
            registry: Arc::new(registry),
            schemas: Arc::new(self.schemas),
        })
    }
}

impl SearchPool<TantivyEngine> {
    /// Start building a Tantivy-backed pool
    pub fn builder(config: Config) -> SearchPoolBuilder<TantivyEngine> {
        SearchPoolBuilder::new(config)
    }
}

impl<E: SearchEngine> SearchPool<E> {
    /// Acquire a read-only search session for `name`.
    ///
    /// Opens or creates the index on first access; never blocks on
    /// an active writer.
    pub fn get_searcher(&self, name: &str) -> Result<SearchSession<E>> {
        self.entry(name)?.acquire_searcher()
    }

    /// Run `f` with exclusive write access to `name`, committing or
    /// rolling back per the returned intent. See
    /// [`IndexEntry::with_writer`] for the full contract.
    pub fn with_writer<F>(&self, name: &str, f: F) -> Result<WriteOutcome>
    where
        F: FnOnce(&mut WriteSession<'_, E>) -> std::result::Result<WriteOutcome, WriteError>,
    {
        self.entry(name)?.with_writer(&self.config.writer, f)
    }

    /// The live entry for `name`, opening or creating it on first
    /// access
    pub fn entry(&self, name: &str) -> Result<Arc<IndexEntry<E>>> {
        let provider = self.provider(name)?;
        self.registry.get_or_create(name, || provider())
    }

    /// Whether the index exists, open in this process or on disk
    pub fn index_exists(&self, name: &str) -> Result<bool> {
        self.registry.exists(name)
    }

    /// Metadata for one index
    pub fn metadata(&self, name: &str) -> Result<IndexMetadata> {
        self.registry.metadata(name)
    }

    /// Metadata for every index under the configured root
    pub fn list_indexes(&self) -> Result<Vec<IndexMetadata>> {
        self.registry.list()
    }

    /// Delete and re-create an index from scratch. Refused with
    /// `IndexInUse` once a live handle exists.
    pub fn recreate_index(&self, name: &str) -> Result<Arc<IndexEntry<E>>> {
        let provider = self.provider(name)?;
        self.registry.recreate(name, || provider())
    }

    /// Names registered at build time
    pub fn registered_indexes(&self) -> Vec<&str> {
        self.schemas.keys().map(String::as_str).collect()
    }

    /// The pool's configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    fn provider(&self, name: &str) -> Result<&SchemaProvider<E>> {
        self.schemas
            .get(name)
            .ok_or_else(|| PoolError::UnknownIndex(name.to_string()))
    }
}
