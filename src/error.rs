//! Error types for spectralog
//!
//! Provides a unified error type for all storage operations.

use thiserror::Error;

/// Result type alias using StorageError
pub type Result<T> = std::result::Result<T, StorageError>;

/// Unified error type for log store operations
#[derive(Debug, Error)]
pub enum StorageError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Device Errors
    // -------------------------------------------------------------------------
    #[error("Mount failed on chip select {cs_pin}: {reason}")]
    MountFailure { cs_pin: u8, reason: String },

    #[error("Failed to open {path} after {attempts} attempts")]
    OpenFailure { path: String, attempts: u32 },

    #[error("Read unavailable: {0}")]
    ReadUnavailable(String),

    // -------------------------------------------------------------------------
    // Lifecycle Errors
    // -------------------------------------------------------------------------
    #[error("Storage not initialized")]
    NotInitialized,

    #[error("Storage is errored; no further writes accepted this run")]
    Errored,

    // -------------------------------------------------------------------------
    // Log Errors
    // -------------------------------------------------------------------------
    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    #[error("Invalid line number: {0} (lines start at 1)")]
    InvalidLineNumber(u32),

    #[error("Delete incomplete (log removed: {log_removed}, metadata removed: {metadata_removed})")]
    DeleteFailed {
        log_removed: bool,
        metadata_removed: bool,
    },

    // -------------------------------------------------------------------------
    // Metadata Errors
    // -------------------------------------------------------------------------
    #[error("Counter {value} does not fit in a {slot_width}-byte slot")]
    CounterOverflow { value: u64, slot_width: usize },

    /// The record reached the log; only the counter update failed
    #[error("Record written but count {count} not persisted: {source}")]
    CounterNotPersisted {
        count: u32,
        #[source]
        source: Box<StorageError>,
    },

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}
