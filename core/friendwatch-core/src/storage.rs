//! Storage configuration and path management for friendwatch.
//!
//! Production code uses [`StorageConfig::from_env`], which points to
//! `$FRIENDWATCH_HOME` or `~/.friendwatch/`. Tests use
//! [`StorageConfig::with_root`] with a temp directory.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Overrides the application directory when set.
pub const HOME_ENV: &str = "FRIENDWATCH_HOME";

const DEFAULT_DIR_NAME: &str = ".friendwatch";

/// Central configuration for all friendwatch file paths.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    root: PathBuf,
}

impl StorageConfig {
    /// Resolves the application directory from the environment.
    pub fn from_env() -> Result<Self> {
        if let Some(root) = std::env::var_os(HOME_ENV).filter(|v| !v.is_empty()) {
            return Ok(Self::with_root(PathBuf::from(root)));
        }
        let home = dirs::home_dir().ok_or(Error::HomeDirNotFound)?;
        Ok(Self::with_root(home.join(DEFAULT_DIR_NAME)))
    }

    /// Creates a StorageConfig with a custom root directory.
    pub fn with_root(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Default location of the YAML configuration.
    pub fn config_file(&self) -> PathBuf {
        self.root.join("config.yaml")
    }

    /// Snapshot and watermark, written together.
    pub fn state_file(&self) -> PathBuf {
        self.root.join("state.json")
    }

    /// Exclusive lock guarding writes to the state file.
    pub fn lock_file(&self) -> PathBuf {
        self.root.join("state.lock")
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.root.join("logs")
    }

    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        fs_err::create_dir_all(&self.root)
    }
}
