//! Writer coordination: exclusive, rollback-safe write sessions.
//!
//! Each index entry carries one engine writer behind a mutex. A call
//! to [`IndexEntry::with_writer`] acquires that mutex (queueing or
//! rejecting per the configured backpressure policy), runs the
//! caller's closure against a [`WriteSession`], then commits or rolls
//! back based on the returned intent. Every exit path (commit,
//! cancel, a caller error, even a panic inside the closure) releases
//! exclusivity and leaves no buffered operations behind for the next
//! session to accidentally commit.
//!
//! Readers are never touched by any of this: search sessions are
//! acquired from the handle's reader and do not block on the writer
//! gate.

use crate::config::{BackpressurePolicy, WriterConfig};
use crate::engine::SearchEngine;
use crate::error::{PoolError, Result};
use crate::registry::IndexEntry;
use std::ops::{Deref, DerefMut};
use std::time::Duration;

/// Caller-side error type for write closures
pub type WriteError = Box<dyn std::error::Error + Send + Sync>;

/// Intent returned by a write closure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// Commit buffered changes; visible to searchers acquired afterwards
    Commit,
    /// Discard buffered changes
    Cancel,
}

/// Write session lifecycle. `Closed` is terminal; a new request
/// starts a fresh session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionState {
    Active,
    Committing,
    Cancelling,
    Closed,
}

/// An exclusive, mutating view over an index.
///
/// Derefs to the engine writer, so callers mutate through it
/// directly. The session rolls itself back on drop unless it was
/// driven to `Closed` by a commit or cancel.
pub struct WriteSession<'a, E: SearchEngine> {
    index: &'a str,
    engine: &'a E,
    handle: &'a E::Handle,
    writer: &'a mut E::Writer,
    state: SessionState,
}

impl<'a, E: SearchEngine> WriteSession<'a, E> {
    /// Name of the index this session mutates
    pub fn index(&self) -> &str {
        self.index
    }

    fn commit(&mut self) -> Result<()> {
        self.state = SessionState::Committing;
        self.engine.commit(self.handle, self.writer)?;
        self.state = SessionState::Closed;

        tracing::debug!(index = self.index, "Write session committed");
        Ok(())
    }

    fn cancel(&mut self) -> Result<()> {
        self.state = SessionState::Cancelling;
        self.engine.rollback(self.writer)?;
        self.state = SessionState::Closed;

        tracing::debug!(index = self.index, "Write session cancelled");
        Ok(())
    }
}

impl<'a, E: SearchEngine> Deref for WriteSession<'a, E> {
    type Target = E::Writer;

    fn deref(&self) -> &E::Writer {
        self.writer
    }
}

impl<'a, E: SearchEngine> DerefMut for WriteSession<'a, E> {
    fn deref_mut(&mut self) -> &mut E::Writer {
        self.writer
    }
}

impl<'a, E: SearchEngine> Drop for WriteSession<'a, E> {
    fn drop(&mut self) {
        if self.state != SessionState::Closed {
            // Reached on panic inside the closure, or on a failed
            // commit/cancel. The buffered operations must not leak
            // into the next session holding this writer.
            if let Err(e) = self.engine.rollback(self.writer) {
                tracing::warn!(
                    index = self.index,
                    error = %e,
                    "Rollback on session drop failed"
                );
            } else {
                tracing::warn!(index = self.index, "Write session dropped, rolled back");
            }
        }
    }
}

impl<E: SearchEngine> IndexEntry<E> {
    /// Run `f` with exclusive write access to this index.
    ///
    /// Acquisition follows the configured backpressure policy: under
    /// `queue` (the default) the call blocks until the active writer
    /// finishes, optionally bounded by `acquire_timeout_ms`; under
    /// `reject` a busy writer fails immediately with `WriterBusy`.
    ///
    /// On `Ok(WriteOutcome::Commit)` the changes are committed and
    /// become visible to search sessions acquired after this returns.
    /// On `Ok(WriteOutcome::Cancel)` or `Err(_)` the pending changes
    /// are rolled back; a caller error is re-surfaced as
    /// `WriteFailed` carrying the original cause.
    pub fn with_writer<F>(&self, config: &WriterConfig, f: F) -> Result<WriteOutcome>
    where
        F: FnOnce(&mut WriteSession<'_, E>) -> std::result::Result<WriteOutcome, WriteError>,
    {
        let mut guard = match config.backpressure {
            BackpressurePolicy::Reject => self
                .writer
                .try_lock()
                .ok_or_else(|| PoolError::WriterBusy(self.name.clone()))?,
            BackpressurePolicy::Queue if config.acquire_timeout_ms > 0 => self
                .writer
                .try_lock_for(Duration::from_millis(config.acquire_timeout_ms))
                .ok_or_else(|| PoolError::WriterBusy(self.name.clone()))?,
            BackpressurePolicy::Queue => self.writer.lock(),
        };

        tracing::debug!(index = self.name.as_str(), "Write exclusivity acquired");

        let mut session = WriteSession {
            index: &self.name,
            engine: self.engine.as_ref(),
            handle: &self.handle,
            writer: &mut guard,
            state: SessionState::Active,
        };

        match f(&mut session) {
            Ok(WriteOutcome::Commit) => {
                session.commit()?;
                Ok(WriteOutcome::Commit)
            }
            Ok(WriteOutcome::Cancel) => {
                session.cancel()?;
                Ok(WriteOutcome::Cancel)
            }
            Err(cause) => {
                if let Err(rollback_err) = session.cancel() {
                    tracing::warn!(
                        index = self.name.as_str(),
                        error = %rollback_err,
                        "Rollback after failed write callback also failed"
                    );
                }
                Err(PoolError::WriteFailed(cause))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::TantivyEngine;
    use crate::registry::{IndexEntry, IndexRegistry};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{Arc, Barrier};
    use std::thread;
    use tantivy::doc;
    use tantivy::schema::{Schema, STORED, TEXT};
    use tempfile::tempdir;

    fn title_schema() -> Schema {
        let mut builder = Schema::builder();
        builder.add_text_field("title", TEXT | STORED);
        builder.build()
    }

    fn test_entry(root: &std::path::Path) -> Arc<IndexEntry<TantivyEngine>> {
        let registry = IndexRegistry::new(TantivyEngine::default(), root.to_path_buf());
        registry.get_or_create("docs", title_schema).unwrap()
    }

    fn add_title(
        entry: &IndexEntry<TantivyEngine>,
        config: &WriterConfig,
        title_text: &str,
    ) -> Result<WriteOutcome> {
        let title = entry.handle().schema().get_field("title").unwrap();
        entry.with_writer(config, |session| {
            session.add_document(doc!(title => title_text))?;
            Ok(WriteOutcome::Commit)
        })
    }

    #[test]
    fn test_commit_outcome_makes_write_visible() {
        let temp_dir = tempdir().unwrap();
        let entry = test_entry(temp_dir.path());
        let config = WriterConfig::default();

        let outcome = add_title(&entry, &config, "hello").unwrap();
        assert_eq!(outcome, WriteOutcome::Commit);

        let session = entry.acquire_searcher().unwrap();
        assert_eq!(session.num_docs(), 1);
    }

    #[test]
    fn test_cancel_outcome_discards_write() {
        let temp_dir = tempdir().unwrap();
        let entry = test_entry(temp_dir.path());
        let config = WriterConfig::default();
        let title = entry.handle().schema().get_field("title").unwrap();

        let outcome = entry
            .with_writer(&config, |session| {
                session.add_document(doc!(title => "discarded"))?;
                Ok(WriteOutcome::Cancel)
            })
            .unwrap();
        assert_eq!(outcome, WriteOutcome::Cancel);

        assert_eq!(entry.acquire_searcher().unwrap().num_docs(), 0);
    }

    #[test]
    fn test_callback_error_rolls_back_and_releases() {
        let temp_dir = tempdir().unwrap();
        let entry = test_entry(temp_dir.path());
        let config = WriterConfig::default();
        let title = entry.handle().schema().get_field("title").unwrap();

        let result = entry.with_writer(&config, |session| {
            session.add_document(doc!(title => "partial"))?;
            Err("mutation logic failed".into())
        });

        let err = result.unwrap_err();
        assert!(err.is_write_failure());
        assert!(err.to_string().contains("mutation logic failed"));

        // Nothing from the failed attempt is visible
        assert_eq!(entry.acquire_searcher().unwrap().num_docs(), 0);

        // Exclusivity was released: a following write succeeds
        add_title(&entry, &config, "recovered").unwrap();
        assert_eq!(entry.acquire_searcher().unwrap().num_docs(), 1);
    }

    #[test]
    fn test_panic_in_callback_rolls_back_and_releases() {
        let temp_dir = tempdir().unwrap();
        let entry = test_entry(temp_dir.path());
        let config = WriterConfig::default();

        let panicking = {
            let entry = Arc::clone(&entry);
            thread::spawn(move || {
                let title = entry.handle().schema().get_field("title").unwrap();
                let config = WriterConfig::default();
                let _ = entry.with_writer(&config, |session| {
                    session.add_document(doc!(title => "leaked?")).unwrap();
                    panic!("boom");
                });
            })
        };
        assert!(panicking.join().is_err());

        // The buffered document was rolled back on drop and the
        // lock is free for the next writer
        add_title(&entry, &config, "survivor").unwrap();

        let session = entry.acquire_searcher().unwrap();
        assert_eq!(session.num_docs(), 1);
    }

    #[test]
    fn test_write_exclusivity_no_overlapping_active_sessions() {
        let temp_dir = tempdir().unwrap();
        let entry = test_entry(temp_dir.path());
        let active = Arc::new(AtomicUsize::new(0));
        let overlapped = Arc::new(AtomicBool::new(false));
        let commits = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let entry = Arc::clone(&entry);
                let active = Arc::clone(&active);
                let overlapped = Arc::clone(&overlapped);
                let commits = Arc::clone(&commits);
                thread::spawn(move || {
                    let title = entry.handle().schema().get_field("title").unwrap();
                    let config = WriterConfig::default();
                    entry
                        .with_writer(&config, |session| {
                            if active.fetch_add(1, Ordering::SeqCst) != 0 {
                                overlapped.store(true, Ordering::SeqCst);
                            }
                            session.add_document(doc!(title => "one"))?;
                            thread::sleep(Duration::from_millis(20));
                            active.fetch_sub(1, Ordering::SeqCst);
                            Ok(WriteOutcome::Commit)
                        })
                        .unwrap();
                    commits.fetch_add(1, Ordering::SeqCst);
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert!(!overlapped.load(Ordering::SeqCst), "active writers overlapped");
        assert_eq!(commits.load(Ordering::SeqCst), 4);
        assert_eq!(entry.acquire_searcher().unwrap().num_docs(), 4);
    }

    #[test]
    fn test_reject_policy_fails_fast_when_busy() {
        let temp_dir = tempdir().unwrap();
        let entry = test_entry(temp_dir.path());

        let reject_config = WriterConfig {
            backpressure: BackpressurePolicy::Reject,
            ..WriterConfig::default()
        };

        let gate = Arc::new(Barrier::new(2));
        let holder = {
            let entry = Arc::clone(&entry);
            let gate = Arc::clone(&gate);
            thread::spawn(move || {
                let config = WriterConfig::default();
                entry
                    .with_writer(&config, |_session| {
                        gate.wait(); // writer is now provably active
                        thread::sleep(Duration::from_millis(100));
                        Ok(WriteOutcome::Cancel)
                    })
                    .unwrap();
            })
        };

        gate.wait();
        let result = entry.with_writer(&reject_config, |_session| Ok(WriteOutcome::Cancel));
        assert!(matches!(result, Err(PoolError::WriterBusy(_))));

        holder.join().unwrap();

        // Once released, the reject policy succeeds
        entry
            .with_writer(&reject_config, |_session| Ok(WriteOutcome::Cancel))
            .unwrap();
    }

    #[test]
    fn test_queue_policy_timeout_surfaces_writer_busy() {
        let temp_dir = tempdir().unwrap();
        let entry = test_entry(temp_dir.path());

        let bounded_config = WriterConfig {
            acquire_timeout_ms: 30,
            ..WriterConfig::default()
        };

        let gate = Arc::new(Barrier::new(2));
        let holder = {
            let entry = Arc::clone(&entry);
            let gate = Arc::clone(&gate);
            thread::spawn(move || {
                let config = WriterConfig::default();
                entry
                    .with_writer(&config, |_session| {
                        gate.wait();
                        thread::sleep(Duration::from_millis(300));
                        Ok(WriteOutcome::Cancel)
                    })
                    .unwrap();
            })
        };

        gate.wait();
        let result = entry.with_writer(&bounded_config, |_session| Ok(WriteOutcome::Cancel));
        assert!(matches!(result, Err(PoolError::WriterBusy(_))));

        holder.join().unwrap();
    }

    #[test]
    fn test_readers_not_blocked_by_active_writer() {
        let temp_dir = tempdir().unwrap();
        let entry = test_entry(temp_dir.path());

        let gate = Arc::new(Barrier::new(2));
        let holder = {
            let entry = Arc::clone(&entry);
            let gate = Arc::clone(&gate);
            thread::spawn(move || {
                let title = entry.handle().schema().get_field("title").unwrap();
                let config = WriterConfig::default();
                entry
                    .with_writer(&config, |session| {
                        session.add_document(doc!(title => "pending"))?;
                        gate.wait();
                        thread::sleep(Duration::from_millis(50));
                        Ok(WriteOutcome::Commit)
                    })
                    .unwrap();
            })
        };

        gate.wait();
        // Writer is mid-flight: acquiring a searcher must not block
        // and must not see the uncommitted document
        let session = entry.acquire_searcher().unwrap();
        assert_eq!(session.num_docs(), 0);

        holder.join().unwrap();

        assert_eq!(entry.acquire_searcher().unwrap().num_docs(), 1);
    }
}
