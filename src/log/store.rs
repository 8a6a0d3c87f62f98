//! Log Store
//!
//! Appends records to the CSV log, one short-lived handle per call.

use crate::block::{BlockStore, FileHandle, OpenMode};
use crate::config::Config;
use crate::error::{Result, StorageError};

use super::cursor::{self, LineCursor};
use super::{header_line, open_with_retry, ErrorFlag};

/// The append-only log file on a block store
///
/// ## Handle Lifetime
/// Every write and absolute read opens the file, does its work and closes it
/// before returning. Only a [`LineCursor`] keeps a handle across calls.
pub struct LogStore<B: BlockStore> {
    /// Card driver
    store: B,

    /// Store configuration (validated)
    config: Config,

    /// `{log_filename}{file_ext}`
    log_path: String,

    /// Whether `init` mounted the card
    mounted: bool,

    /// Raised on mount or open failure, never lowered
    error: ErrorFlag,
}

impl<B: BlockStore> LogStore<B> {
    /// Create a log store over `store`; nothing touches the card until `init`
    pub fn new(store: B, config: Config) -> Result<Self> {
        config.validate()?;
        let log_path = config.log_path();

        Ok(Self {
            store,
            config,
            log_path,
            mounted: false,
            error: ErrorFlag::new(),
        })
    }

    /// Mount the card behind `cs_pin`
    ///
    /// In no-save mode the card is never touched. A mount failure raises the
    /// error flag; it is not retried.
    pub fn init(&mut self, cs_pin: u8) -> Result<()> {
        if self.config.no_save {
            tracing::info!("No-save mode: skipping card mount");
            return Ok(());
        }

        match self.store.mount(cs_pin) {
            Ok(()) => {
                tracing::info!("Card mounted on chip select {}", cs_pin);
                self.mounted = true;
                Ok(())
            }
            Err(e) => {
                tracing::error!("Card mount failed on chip select {}: {}", cs_pin, e);
                self.error.raise();
                Err(StorageError::MountFailure {
                    cs_pin,
                    reason: e.to_string(),
                })
            }
        }
    }

    /// Open (creating if needed) the log, write the header if it is new, close
    pub fn open_file(&mut self) -> Result<()> {
        if self.config.no_save {
            return Ok(());
        }
        let handle = self.open_for_append()?;
        handle.close()?;
        Ok(())
    }

    /// Append one record and flush it to the card
    ///
    /// `line` must not contain a line terminator.
    pub fn write_line(&mut self, line: &str) -> Result<()> {
        if self.config.no_save {
            tracing::trace!("No-save mode: dropping record");
            return Ok(());
        }

        if line.contains(&['\n', '\r'][..]) {
            return Err(StorageError::InvalidRecord(
                "record contains a line terminator".to_string(),
            ));
        }

        let mut handle = self.open_for_append()?;
        handle.write_line(line)?;
        handle.close()?;

        tracing::trace!("Appended {} bytes to {}", line.len() + 1, self.log_path);
        Ok(())
    }

    /// Read line `line_number` (1-based; line 1 is the header)
    ///
    /// At most `read_cap` bytes are returned. `None` if the file has fewer
    /// lines.
    pub fn read_line_at(&mut self, line_number: u32) -> Result<Option<String>> {
        if line_number == 0 {
            return Err(StorageError::InvalidLineNumber(0));
        }

        let mut handle = self.open_for_read()?;
        handle.seek(0)?;

        let line = if cursor::skip_lines(&mut handle, line_number - 1)? {
            cursor::read_line(&mut handle, self.config.read_cap)?
        } else {
            None
        };

        handle.close()?;
        Ok(line)
    }

    /// Start a sequential read session at the top of the file
    pub fn lines(&mut self) -> Result<LineCursor<B::Handle>> {
        let handle = self.open_for_read()?;
        LineCursor::start(handle, self.config.read_cap)
    }

    /// Remove the log file
    ///
    /// A log that is already absent counts as removed.
    pub fn delete_file(&mut self) -> Result<()> {
        if self.config.no_save {
            return Ok(());
        }
        if !self.mounted {
            return Err(StorageError::NotInitialized);
        }

        if !self.store.exists(&self.log_path) {
            tracing::debug!("{} already absent", self.log_path);
            return Ok(());
        }

        self.store.remove(&self.log_path).map_err(|e| {
            tracing::warn!("Failed to remove {}: {}", self.log_path, e);
            StorageError::Io(e)
        })?;

        tracing::info!("Removed {}", self.log_path);
        Ok(())
    }

    /// Count terminated record lines after the header
    ///
    /// Every terminated line counts, blank ones included, since `write_line`
    /// accepts an empty record. A trailing line without a terminator (torn
    /// write) is not counted.
    pub fn count_records(&mut self) -> Result<u32> {
        if self.config.no_save {
            return Ok(0);
        }
        if !self.mounted {
            return Err(StorageError::NotInitialized);
        }
        if !self.store.exists(&self.log_path) {
            return Ok(0);
        }

        let mut handle = self.open_for_read()?;
        handle.seek(0)?;

        let mut terminators: u64 = 0;
        while let Some(byte) = handle.read_byte()? {
            if byte == b'\n' {
                terminators += 1;
            }
        }
        handle.close()?;

        // First terminated line is the header
        let records = terminators.saturating_sub(1);
        Ok(u32::try_from(records).unwrap_or(u32::MAX))
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Whether a mount or open has failed this run
    pub fn is_errored(&self) -> bool {
        self.error.is_raised()
    }

    pub fn error_flag(&self) -> ErrorFlag {
        self.error
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// Name of the log file on the card
    pub fn log_path(&self) -> &str {
        &self.log_path
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn block_store(&self) -> &B {
        &self.store
    }

    pub fn block_store_mut(&mut self) -> &mut B {
        &mut self.store
    }

    /// Raise the error flag (used when a sibling file fails to open)
    pub(crate) fn raise_error(&mut self) {
        self.error.raise();
    }

    // =========================================================================
    // Internal
    // =========================================================================

    /// Open for appending; writes the header first if the file is empty
    fn open_for_append(&mut self) -> Result<B::Handle> {
        if !self.mounted {
            return Err(StorageError::NotInitialized);
        }

        let mut handle = self.open_retrying(OpenMode::Append)?;

        if handle.size()? == 0 {
            let header = header_line(&self.config.wavelengths);
            handle.write_line(&header)?;
            tracing::info!(
                "Created {} with header ({} columns)",
                self.log_path,
                header.matches(',').count()
            );
        }

        Ok(handle)
    }

    fn open_for_read(&mut self) -> Result<B::Handle> {
        if self.config.no_save {
            return Err(StorageError::ReadUnavailable(
                "no-save mode keeps no log".to_string(),
            ));
        }
        if !self.mounted {
            return Err(StorageError::ReadUnavailable(
                "card not mounted".to_string(),
            ));
        }
        self.open_retrying(OpenMode::Read)
    }

    fn open_retrying(&mut self, mode: OpenMode) -> Result<B::Handle> {
        let result = open_with_retry(&mut self.store, &self.log_path, mode, &self.config.retry);

        if let Err(StorageError::OpenFailure { attempts, .. }) = &result {
            tracing::error!(
                "Giving up on {} after {} attempts; storage errored",
                self.log_path,
                attempts
            );
            self.error.raise();
        }
        result
    }
}
