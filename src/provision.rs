//! Directory provisioning for index storage.
//!
//! Guarantees that an index path exists as a directory before the
//! engine opens or creates anything there. Safe to call concurrently
//! from any number of threads with the same path: at most one of
//! them creates the directory, the rest observe success.

use crate::error::{PoolError, Result};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

/// Ensure `path` exists as a directory, creating missing parents.
///
/// Idempotent: an already-existing directory is success. Fails with
/// `ProvisionFailed` if the path (or one of its components) exists
/// but is not a directory, or if creation fails for any other reason
/// (permissions, disk full).
pub fn ensure(path: &Path) -> Result<()> {
    if path.exists() {
        if path.is_dir() {
            return Ok(());
        }
        return Err(PoolError::ProvisionFailed(format!(
            "{} exists but is not a directory",
            path.display()
        )));
    }

    match fs::create_dir_all(path) {
        Ok(()) => Ok(()),
        // Lost the creation race to another thread or process.
        Err(e) if e.kind() == ErrorKind::AlreadyExists && path.is_dir() => Ok(()),
        Err(e) => Err(PoolError::ProvisionFailed(format!(
            "Failed to create {}: {e}",
            path.display()
        ))),
    }
}

/// Check whether `path` is a directory containing any entries.
///
/// Non-existent paths are empty. Used by the registry to refuse
/// creating an index on top of foreign files.
pub fn is_nonempty_dir(path: &Path) -> Result<bool> {
    if !path.is_dir() {
        return Ok(false);
    }
    let mut entries = fs::read_dir(path)?;
    Ok(entries.next().is_some())
}
