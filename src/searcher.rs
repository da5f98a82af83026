//! Read-only search sessions.
//!
//! A [`SearchSession`] is a short-lived, point-in-time view over an
//! index, typically held for the duration of one web request.
//! Acquisition never blocks and never interacts with the writer
//! gate: any number of sessions may be live at once, including while
//! a write is in flight. A session does not observe commits that
//! happen after it was acquired.
//!
//! Sessions expose only the engine's searcher, so write attempts are
//! rejected at compile time. Dropping a session releases nothing
//! shared; the underlying handle stays open.

use crate::engine::SearchEngine;
use crate::error::Result;
use crate::registry::IndexEntry;
use std::ops::Deref;

/// A read-only view over an index's committed state
pub struct SearchSession<E: SearchEngine> {
    index: String,
    searcher: E::Searcher,
}

impl<E: SearchEngine> SearchSession<E> {
    /// Name of the index this session reads from
    pub fn index(&self) -> &str {
        &self.index
    }

    /// The engine searcher backing this session
    pub fn searcher(&self) -> &E::Searcher {
        &self.searcher
    }
}

impl<E: SearchEngine> Deref for SearchSession<E> {
    type Target = E::Searcher;

    fn deref(&self) -> &E::Searcher {
        &self.searcher
    }
}

impl<E: SearchEngine> std::fmt::Debug for SearchSession<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchSession")
            .field("index", &self.index)
            .finish_non_exhaustive()
    }
}

impl<E: SearchEngine> IndexEntry<E> {
    /// Acquire a search session over the current committed state
    pub fn acquire_searcher(&self) -> Result<SearchSession<E>> {
        let searcher = self.engine.searcher(&self.handle)?;

        Ok(SearchSession {
            index: self.name.clone(),
            searcher,
        })
    }
}
