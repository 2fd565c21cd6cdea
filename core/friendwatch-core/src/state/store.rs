//! File-backed snapshot persistence.
//!
//! The previous snapshot and the last-check watermark live in a single JSON
//! document so they can never be observed out of step with each other.
//!
//! # File Format
//!
//! ```json
//! {
//!   "version": 1,
//!   "last_check": "2025-01-01T12:00:00Z",
//!   "friends": [ { ... FriendPresence fields ... } ]
//! }
//! ```
//!
//! # Degraded Loads
//!
//! A run should never fail because of what a previous run left behind:
//! - Empty files, corrupt JSON and unknown versions load as an empty snapshot
//!   with [`LastCheck::BEGINNING`] (logged as a warning)
//! - A missing file is a first run; a marker is written immediately so that
//!   repeated failing first runs do not keep backfilling from the beginning
//!
//! # Atomic Writes
//!
//! Commits write a temp file in the same directory and rename it over the
//! state file while holding an exclusive lock on `state.lock`.
//!
//! # Overlapping Runs
//!
//! Under the lock, a commit re-reads the saved watermark. If another run has
//! already committed a newer one, that state is kept as is: its snapshot was
//! fetched later, and the watermark never moves backwards.

use std::io::{ErrorKind, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use fs_err as fs;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::error::{Error, Result};
use crate::storage::StorageConfig;
use crate::types::{LastCheck, Snapshot};

use super::lock::StoreLock;

const STORE_VERSION: u32 = 1;

#[derive(Debug, Deserialize)]
struct StoreFile {
    version: u32,
    #[serde(default)]
    last_check: LastCheck,
    #[serde(default)]
    friends: Snapshot,
}

#[derive(Serialize)]
struct StoreFileRef<'a> {
    version: u32,
    last_check: LastCheck,
    friends: &'a Snapshot,
}

enum ReadOutcome {
    Missing,
    Degraded,
    Loaded(Snapshot, LastCheck),
}

/// Owns the persisted snapshot and watermark.
pub struct SnapshotStore {
    storage: StorageConfig,
}

impl SnapshotStore {
    pub fn new(storage: &StorageConfig) -> Self {
        SnapshotStore {
            storage: storage.clone(),
        }
    }

    /// Loads the previous snapshot and watermark for a run.
    ///
    /// Only I/O failures other than "not found" are errors.
    pub fn load(&self) -> Result<(Snapshot, LastCheck)> {
        self.load_as_of(Utc::now())
    }

    /// Like [`load`](Self::load), but a first-run marker is stamped with the
    /// run's own start time rather than the wall clock.
    pub fn load_as_of(&self, now: DateTime<Utc>) -> Result<(Snapshot, LastCheck)> {
        match self.read()? {
            ReadOutcome::Loaded(snapshot, last_check) => {
                tracing::debug!(
                    friends = snapshot.len(),
                    last_check = ?last_check.instant(),
                    "Loaded friends cache"
                );
                Ok((snapshot, last_check))
            }
            ReadOutcome::Degraded => Ok((Snapshot::default(), LastCheck::BEGINNING)),
            ReadOutcome::Missing => {
                tracing::info!("No saved state found, every presence update counts as new");
                let marker = LastCheck::at(now);
                if let Err(e) = self.commit(&Snapshot::default(), marker) {
                    tracing::warn!(error = %e, "Failed to write first-run marker");
                }
                Ok((Snapshot::default(), LastCheck::BEGINNING))
            }
        }
    }

    /// Reads the saved state without writing anything. `None` when there is no
    /// usable state on disk.
    pub fn peek(&self) -> Result<Option<(Snapshot, LastCheck)>> {
        match self.read()? {
            ReadOutcome::Loaded(snapshot, last_check) => Ok(Some((snapshot, last_check))),
            ReadOutcome::Missing | ReadOutcome::Degraded => Ok(None),
        }
    }

    /// Replaces the snapshot and watermark in one atomic write.
    ///
    /// A no-op when the saved watermark is already newer than `last_check`.
    pub fn commit(&self, snapshot: &Snapshot, last_check: LastCheck) -> Result<()> {
        self.storage
            .ensure_dirs()
            .map_err(|e| Error::io("Failed to create state directory", e))?;

        let _lock = StoreLock::acquire(&self.storage.lock_file())?;

        if let ReadOutcome::Loaded(_, persisted) = self.read()? {
            if persisted > last_check {
                tracing::warn!(
                    persisted = ?persisted.instant(),
                    attempted = ?last_check.instant(),
                    "A newer run already saved its state, keeping it"
                );
                return Ok(());
            }
        }

        let content = serde_json::to_string_pretty(&StoreFileRef {
            version: STORE_VERSION,
            last_check,
            friends: snapshot,
        })
        .map_err(|e| Error::Json {
            context: "Failed to serialize state".to_string(),
            source: e,
        })?;

        write_atomic(&self.storage.state_file(), content.as_bytes())?;

        tracing::debug!(
            friends = snapshot.len(),
            last_check = ?last_check.instant(),
            "Committed friends cache"
        );
        Ok(())
    }

    fn read(&self) -> Result<ReadOutcome> {
        let path = self.storage.state_file();
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(ReadOutcome::Missing),
            Err(e) => return Err(Error::io("Failed to read state file", e)),
        };

        if content.trim().is_empty() {
            tracing::warn!(path = %path.display(), "Empty state file, continuing with empty friends cache");
            return Ok(ReadOutcome::Degraded);
        }

        match serde_json::from_str::<StoreFile>(&content) {
            Ok(file) if file.version == STORE_VERSION => {
                Ok(ReadOutcome::Loaded(file.friends, file.last_check))
            }
            Ok(file) => {
                tracing::warn!(
                    version = file.version,
                    expected = STORE_VERSION,
                    "Unsupported state file version, continuing with empty friends cache"
                );
                Ok(ReadOutcome::Degraded)
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    "The friends cache didn't load properly, continuing with empty friends cache"
                );
                Ok(ReadOutcome::Degraded)
            }
        }
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let parent_dir = path.parent().ok_or_else(|| {
        Error::io(
            "State file path has no parent directory",
            std::io::Error::from(ErrorKind::InvalidInput),
        )
    })?;
    let mut temp_file =
        NamedTempFile::new_in(parent_dir).map_err(|e| Error::io("Temp file error", e))?;
    temp_file
        .write_all(bytes)
        .map_err(|e| Error::io("Failed to write temp state file", e))?;
    temp_file
        .flush()
        .map_err(|e| Error::io("Failed to flush temp state file", e))?;
    temp_file
        .as_file()
        .sync_all()
        .map_err(|e| Error::io("Failed to sync temp state file", e))?;
    temp_file
        .persist(path)
        .map_err(|e| Error::io("Failed to replace state file", e.error))?;
    Ok(())
}
