//! searchpool - Index-handle pooling and single-writer coordination
//! for Tantivy-backed web services.
//!
//! This crate manages the lifecycle of full-text-search index
//! handles inside a single web application process: one live handle
//! per index name for the life of the process, unlimited concurrent
//! read sessions, and exactly one write session per index at a time
//! with guaranteed commit-or-rollback on every exit path.
//!
//! # Architecture
//!
//! - **config**: TOML + environment configuration
//! - **error**: `PoolError` taxonomy and `Result` alias
//! - **provision**: idempotent, race-free index directory creation
//! - **engine**: the search-engine capability interface and the
//!   shipped Tantivy binding
//! - **registry**: name-to-handle map with atomic first-access
//!   creation and per-index metadata sidecars
//! - **searcher**: read-only `SearchSession` acquisition
//! - **writer**: exclusive `WriteSession` coordination with
//!   queue/reject backpressure
//! - **pool**: the `SearchPool` facade applications bind to
//!
//! # Usage
//!
//! Build the pool once at startup, registering a schema constructor
//! per index name, then share the (cheaply clonable) pool with your
//! request handlers:
//!
//! ```no_run
//! use searchpool::{Config, SearchPoolBuilder, WriteOutcome};
//! use tantivy::doc;
//! use tantivy::schema::{Schema, STORED, TEXT};
//!
//! # fn main() -> searchpool::Result<()> {
//! let pool = SearchPoolBuilder::new(Config::load()?)
//!     .register("docs", || {
//!         let mut builder = Schema::builder();
//!         builder.add_text_field("title", TEXT | STORED);
//!         builder.build()
//!     })
//!     .build()?;
//!
//! // In a request handler: exclusive, rollback-safe write
//! let entry = pool.entry("docs")?;
//! let title = entry.handle().schema().get_field("title").unwrap();
//! pool.with_writer("docs", |session| {
//!     session.add_document(doc!(title => "hello"))?;
//!     Ok(WriteOutcome::Commit)
//! })?;
//!
//! // In another handler, concurrently: non-blocking read session
//! let searcher = pool.get_searcher("docs")?;
//! # Ok(())
//! # }
//! ```
//!
//! Writers for the same index serialize (or reject, per the
//! configured backpressure policy); searchers never wait on writers
//! and keep their snapshot until dropped.

pub mod config;
pub mod engine;
pub mod error;
pub mod pool;
pub mod provision;
pub mod registry;
pub mod searcher;
pub mod writer;

// Re-export commonly used types for convenience
pub use config::{BackpressurePolicy, Config};
pub use engine::{SearchEngine, TantivyEngine, TantivyHandle};
pub use error::{PoolError, Result};
pub use pool::{SearchPool, SearchPoolBuilder};
pub use registry::{IndexEntry, IndexMetadata, IndexRegistry};
pub use searcher::SearchSession;
pub use writer::{WriteError, WriteOutcome, WriteSession};
