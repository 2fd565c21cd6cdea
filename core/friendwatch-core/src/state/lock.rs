//! Exclusive lock around state file writes.
//!
//! Overlapping scheduled runs can both reach the commit step. `flock` on a
//! sibling `state.lock` file serialises them; the lock is released when the
//! guard drops (or the process exits).

use std::fs::{File, OpenOptions};
use std::path::Path;

use fs2::FileExt;

use crate::error::{Error, Result};

pub(crate) struct StoreLock {
    file: File,
}

impl StoreLock {
    /// Blocks until the lock is held.
    pub(crate) fn acquire(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(path)
            .map_err(|e| Error::io(format!("Failed to open lock file {}", path.display()), e))?;
        file.lock_exclusive()
            .map_err(|e| Error::io("Failed to lock state file", e))?;
        Ok(StoreLock { file })
    }
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}
