//! Error types for monitor-core operations.

use std::path::PathBuf;

/// All errors that can occur in monitor-core operations.
///
/// Transient conditions (missing markers, empty listings, files that vanish
/// mid-cleanup) never surface here; they are handled where they occur.
#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    // ─────────────────────────────────────────────────────────────────────
    // Configuration Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("Configuration file unreadable: {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration file malformed: {path}: {details}")]
    ConfigMalformed { path: PathBuf, details: String },

    #[error("Invalid configuration: {0}")]
    ConfigInvalid(String),

    #[error("Invalid file pattern {pattern:?}: {details}")]
    InvalidPattern { pattern: String, details: String },

    // ─────────────────────────────────────────────────────────────────────
    // Device Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("Display unavailable: {0}")]
    Display(String),

    #[error("Button input unavailable: {0}")]
    Buttons(String),

    // ─────────────────────────────────────────────────────────────────────
    // Power Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("Power-off command failed: {command}: {details}")]
    PowerOff { command: String, details: String },

    #[error("Insufficient privilege for power-off: {0}")]
    PowerPrivilege(String),
}

/// Convenience type alias for Results using MonitorError.
pub type Result<T> = std::result::Result<T, MonitorError>;
