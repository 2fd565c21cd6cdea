//! Error types for friendwatch-core operations.

use std::path::PathBuf;

/// All errors that can occur in friendwatch-core operations.
///
/// Configuration and source errors are fatal for a run. Delivery errors are
/// produced per message and the orchestrator logs them and keeps going.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    // ─────────────────────────────────────────────────────────────────────
    // Configuration Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("No configuration file at {0}. Create one following the documented format.")]
    ConfigNotFound(PathBuf),

    #[error("Configuration file malformed: {path}: {details}")]
    ConfigMalformed { path: PathBuf, details: String },

    #[error("Invalid configuration: {0}")]
    ConfigInvalid(String),

    #[error("Cannot determine home directory")]
    HomeDirNotFound,

    // ─────────────────────────────────────────────────────────────────────
    // Presence Source Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("Presence source not available: {command}: {hint}")]
    SourceUnavailable { command: String, hint: String },

    #[error("Presence source failed: {command}: {details}")]
    SourceFailed { command: String, details: String },

    #[error("Presence source output could not be parsed: {details}")]
    SourceParse { details: String },

    #[error("Presence source returned no friends")]
    SourceEmpty,

    // ─────────────────────────────────────────────────────────────────────
    // Delivery Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("Notification delivery via {transport} failed: {details}")]
    Delivery {
        transport: &'static str,
        details: String,
    },

    // ─────────────────────────────────────────────────────────────────────
    // I/O Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("I/O error: {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {context}: {source}")]
    Json {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

impl Error {
    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Error::Io {
            context: context.into(),
            source,
        }
    }

    /// True for the classes that must abort a run before any state mutation.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Error::Delivery { .. })
    }
}

/// Convenience type alias for Results using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
