//! # spectralog
//!
//! Append-only CSV log store for a spectral sensor logger writing to a
//! removable card:
//! - Self-describing header written once, when the log is created
//! - One flushed append per record, no handle held between calls
//! - Record counter in a sidecar file, resumed across power cycles
//! - Bounded retry on flaky opens, latched error flag when the card is gone
//! - Line-addressed and streaming reads for export
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                Capture loop / host CLI                      │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                       Storage                               │
//! │          (state machine, counter bookkeeping)               │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌───────────────┐
//!   │  LogStore   │          │ MetadataStore │
//!   │  (CSV log)  │          │  (counter)    │
//!   └──────┬──────┘          └───────┬───────┘
//!          │                         │
//!          └────────────┬────────────┘
//!                       ▼
//!               ┌───────────────┐
//!               │  BlockStore   │
//!               │ (card driver) │
//!               └───────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod block;
pub mod log;
pub mod metadata;
pub mod storage;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{Result, StorageError};
pub use config::Config;
pub use storage::{Storage, StorageState};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of spectralog
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
