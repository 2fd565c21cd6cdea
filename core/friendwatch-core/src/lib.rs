//! # friendwatch-core
//!
//! Decision engine behind `friendwatch`: it compares the current Nintendo
//! Switch Online friend presence with what the previous run saw and decides
//! who deserves a notification.
//!
//! ## Design Principles
//!
//! - **Synchronous**: one run is one short batch job; no async runtime.
//! - **Stateless between runs**: only the last snapshot and the last-check
//!   watermark are persisted, always together.
//! - **Graceful degradation**: a missing or corrupt cache is an empty cache,
//!   not an error. Only configuration and fetch failures abort a run.
//! - **No global state**: [`Config`] is built once and passed by reference.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use friendwatch_core::{notify, run_once, Config, NxapiSource, SnapshotStore, StorageConfig};
//!
//! let storage = StorageConfig::from_env()?;
//! let config = Config::load(&storage.config_file())?;
//! let notifier = notify::from_config(&config.transport)?;
//! let report = run_once(
//!     &config,
//!     &NxapiSource::new(config.windows_mode),
//!     &SnapshotStore::new(&storage),
//!     notifier.as_deref(),
//!     chrono::Utc::now(),
//! )?;
//! ```

pub mod config;
pub mod differ;
pub mod error;
pub mod format;
pub mod notify;
pub mod run;
pub mod source;
pub mod state;
pub mod storage;
pub mod types;

pub use config::{Config, EmailSettings, NtfySettings, SendTest, TransportConfig};
pub use differ::diff;
pub use error::{Error, Result};
pub use format::{format_decision, format_decision_in};
pub use notify::Notifier;
pub use run::{run_once, send_test, RunReport};
pub use source::{parse_friends, NxapiSource, PresenceSource};
pub use state::SnapshotStore;
pub use storage::StorageConfig;
pub use types::*;
