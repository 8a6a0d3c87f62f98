//! Storage Module
//!
//! The single entry point used by the capture loop: the log plus its record
//! counter behind one small API.
//!
//! ## Responsibilities
//! - Mount the card and resume the record counter
//! - Append a record, then persist the new count
//! - Reads for export and verification
//! - Delete log and counter together
//!
//! ## State Machine
//! ```text
//!   Uninitialized ──init ok──▶ Ready
//!         │                      │
//!    mount fails          mount/open fails
//!         ▼                      ▼
//!      Errored ◀─────────────────┘   (terminal for the run)
//! ```
//!
//! ## Crash Window
//! The counter is persisted strictly after the record reaches the card. Power
//! lost between the two leaves the counter one behind the log. [`Storage::recount`]
//! repairs that on request; it is never done implicitly.

use crate::block::BlockStore;
use crate::config::Config;
use crate::error::{Result, StorageError};
use crate::log::{LineCursor, LogStore};
use crate::metadata::MetadataStore;

/// Lifecycle of a [`Storage`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageState {
    /// `init` has not run yet
    Uninitialized,

    /// Card mounted (or no-save mode) and counter loaded
    Ready,

    /// A mount or open failed; writes and reads are refused
    Errored,
}

/// Log store + record counter
pub struct Storage<B: BlockStore> {
    /// The CSV log (owns the block store and the error flag)
    log: LogStore<B>,

    /// Counter sidecar
    metadata: MetadataStore,

    /// Records appended since the log was created (loaded + this run)
    counter: u32,

    /// Set by `init`; `Errored` is derived from the log's error flag
    state: StorageState,
}

impl<B: BlockStore> Storage<B> {
    /// Create storage over `store`; call `init` before use
    pub fn new(store: B, config: Config) -> Result<Self> {
        let metadata = MetadataStore::new(
            config.metadata_path(),
            config.counter_slot_width,
            config.retry,
        );
        let log = LogStore::new(store, config)?;

        Ok(Self {
            log,
            metadata,
            counter: 0,
            state: StorageState::Uninitialized,
        })
    }

    /// Mount the card and load the resume counter
    ///
    /// Calling `init` on already-initialized storage is a no-op.
    pub fn init(&mut self) -> Result<()> {
        match self.state() {
            StorageState::Ready => return Ok(()),
            StorageState::Errored => return Err(StorageError::Errored),
            StorageState::Uninitialized => {}
        }

        let cs_pin = self.log.config().cs_pin;
        self.log.init(cs_pin)?;

        if !self.log.config().no_save {
            match self.metadata.load(self.log.block_store_mut()) {
                Ok(counter) => self.counter = counter,
                Err(e) => {
                    // Never go Ready on an unknown count: the first persist
                    // would clobber the slot
                    self.log.raise_error();
                    tracing::error!("Record count unavailable; storage errored");
                    return Err(e);
                }
            }
        }

        self.state = StorageState::Ready;
        tracing::info!("Storage ready; {} records on card", self.counter);
        Ok(())
    }

    /// Append a record and persist the new count
    ///
    /// If the append fails the counter is left untouched. If the append
    /// succeeds but the count cannot be persisted, the record is on the card
    /// and `CounterNotPersisted` is returned; the caller must not write the
    /// record again. The in-memory count still advances to track the log.
    pub fn write_line(&mut self, line: &str) -> Result<()> {
        if self.log.config().no_save {
            return Ok(());
        }
        self.ensure_ready()?;

        self.log.write_line(line)?;

        let Some(next) = self.counter.checked_add(1) else {
            return Err(StorageError::CounterNotPersisted {
                count: self.counter,
                source: Box::new(StorageError::CounterOverflow {
                    value: u64::from(u32::MAX) + 1,
                    slot_width: self.metadata.slot_width(),
                }),
            });
        };
        self.counter = next;

        tracing::debug!("Record {} written", self.counter);
        self.persist_counter()
            .map_err(|e| StorageError::CounterNotPersisted {
                count: self.counter,
                source: Box::new(e),
            })
    }

    /// Read line `line_number` of the log (1-based; line 1 is the header)
    pub fn read_line(&mut self, line_number: u32) -> Result<Option<String>> {
        self.ensure_ready()?;
        self.log.read_line_at(line_number)
    }

    /// Stream the log from the top
    pub fn lines(&mut self) -> Result<LineCursor<B::Handle>> {
        self.ensure_ready()?;
        self.log.lines()
    }

    /// Remove both the log and the counter file
    ///
    /// Both removals are attempted even if the first fails; success only if
    /// both files are gone. Allowed in the errored state so a card can be
    /// cleared.
    pub fn delete_file(&mut self) -> Result<()> {
        if self.log.config().no_save {
            return Ok(());
        }
        if self.state == StorageState::Uninitialized {
            return Err(StorageError::NotInitialized);
        }

        let log_removed = self.log.delete_file().is_ok();
        let metadata_removed = self.metadata.delete(self.log.block_store_mut()).is_ok();

        if log_removed && metadata_removed {
            self.counter = 0;
            tracing::info!("Log and metadata deleted");
            return Ok(());
        }

        tracing::warn!(
            "Partial delete: log removed {}, metadata removed {}",
            log_removed,
            metadata_removed
        );
        Err(StorageError::DeleteFailed {
            log_removed,
            metadata_removed,
        })
    }

    /// Rescan the log and adopt its record count if it differs
    ///
    /// Returns the count in effect afterwards.
    pub fn recount(&mut self) -> Result<u32> {
        if self.log.config().no_save {
            return Ok(self.counter);
        }
        self.ensure_ready()?;

        let scanned = self.log.count_records()?;
        if scanned != self.counter {
            tracing::warn!(
                "Record count drift: metadata {} vs log {}; adopting log",
                self.counter,
                scanned
            );
            self.counter = scanned;
            self.persist_counter()?;
        }
        Ok(self.counter)
    }

    /// Records appended so far (resumed count plus this run's writes)
    pub fn data_count(&self) -> u32 {
        self.counter
    }

    /// Whether a mount or open has failed this run
    pub fn is_errored(&self) -> bool {
        self.log.is_errored()
    }

    pub fn state(&self) -> StorageState {
        if self.log.is_errored() {
            StorageState::Errored
        } else {
            self.state
        }
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    pub fn config(&self) -> &Config {
        self.log.config()
    }

    pub fn log(&self) -> &LogStore<B> {
        &self.log
    }

    pub fn metadata(&self) -> &MetadataStore {
        &self.metadata
    }

    pub fn block_store(&self) -> &B {
        self.log.block_store()
    }

    // =========================================================================
    // Internal
    // =========================================================================

    fn ensure_ready(&self) -> Result<()> {
        match self.state() {
            StorageState::Ready => Ok(()),
            StorageState::Uninitialized => Err(StorageError::NotInitialized),
            StorageState::Errored => Err(StorageError::Errored),
        }
    }

    fn persist_counter(&mut self) -> Result<()> {
        let result = self.metadata.persist(self.log.block_store_mut(), self.counter);

        if let Err(e) = &result {
            if matches!(e, StorageError::OpenFailure { .. }) {
                self.log.raise_error();
            }
            tracing::error!("Failed to persist record count {}: {}", self.counter, e);
        }
        result
    }
}
