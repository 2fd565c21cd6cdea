//! Persisted state between runs.
//!
//! The only things that survive a run are the last fetched snapshot and the
//! last-check watermark. Both live in `state.json` under the application
//! directory and are always replaced together.
//!
//! # Module Structure
//!
//! - [`store`]: load/commit of the snapshot + watermark document
//! - [`lock`]: exclusive file lock held while committing

mod lock;
mod store;

pub use store::SnapshotStore;
