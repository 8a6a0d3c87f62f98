//! Metadata Module
//!
//! Persists the record counter in a small sidecar file so a reboot resumes
//! counting where it left off.
//!
//! ## File Format
//! ```text
//! ┌──────────────────────────────┐
//! │ "7         "                 │  decimal, right-padded with spaces
//! └──────────────────────────────┘     to `slot_width` bytes, no newline
//! ```
//!
//! The slot is always rewritten in place from offset 0 at full width, so a
//! shorter value never leaves stale digits behind and no truncate is needed.
//! A value wider than the slot is rejected, never written.

use crate::block::{BlockStore, FileHandle, OpenMode};
use crate::config::RetryPolicy;
use crate::error::{Result, StorageError};
use crate::log::open_with_retry;

/// Upper bound on bytes read while loading, whatever the slot width
const MAX_LOAD_BYTES: usize = 64;

/// Counter sidecar file
#[derive(Debug, Clone)]
pub struct MetadataStore {
    path: String,
    slot_width: usize,
    retry: RetryPolicy,
}

impl MetadataStore {
    pub fn new(path: impl Into<String>, slot_width: usize, retry: RetryPolicy) -> Self {
        Self {
            path: path.into(),
            slot_width,
            retry,
        }
    }

    /// Read the resume counter
    ///
    /// A missing file or an unparsable slot yields 0. A file that exists but
    /// cannot be opened or read is an error: resuming at 0 would let the next
    /// persist overwrite the real count.
    pub fn load<B: BlockStore>(&self, store: &mut B) -> Result<u32> {
        if !store.exists(&self.path) {
            tracing::debug!("No metadata at {}; starting count at 0", self.path);
            return Ok(0);
        }

        let text = match self.read_slot(store) {
            Ok(text) => text,
            // Removed between the existence check and the open
            Err(StorageError::ReadUnavailable(_)) => return Ok(0),
            Err(e) => {
                tracing::error!("Could not read {}: {}", self.path, e);
                return Err(e);
            }
        };

        match text.trim().parse::<u32>() {
            Ok(counter) => {
                tracing::debug!("Resuming record count at {}", counter);
                Ok(counter)
            }
            Err(e) => {
                tracing::warn!(
                    "Unparsable counter {:?} in {}: {}; using 0",
                    text,
                    self.path,
                    e
                );
                Ok(0)
            }
        }
    }

    /// Overwrite the counter slot with `counter`
    pub fn persist<B: BlockStore>(&self, store: &mut B, counter: u32) -> Result<()> {
        let slot = self.encode(counter)?;

        let mut handle = open_with_retry(store, &self.path, OpenMode::Write, &self.retry)?;
        handle.seek(0)?;
        handle.write_all(slot.as_bytes())?;
        handle.close()?;

        tracing::trace!("Persisted record count {}", counter);
        Ok(())
    }

    /// Remove the metadata file; an absent file counts as removed
    pub fn delete<B: BlockStore>(&self, store: &mut B) -> Result<()> {
        if !store.exists(&self.path) {
            return Ok(());
        }

        store.remove(&self.path).map_err(|e| {
            tracing::warn!("Failed to remove {}: {}", self.path, e);
            StorageError::Io(e)
        })?;

        tracing::info!("Removed {}", self.path);
        Ok(())
    }

    /// Render `counter` padded to the slot width
    pub fn encode(&self, counter: u32) -> Result<String> {
        let digits = counter.to_string();
        if digits.len() > self.slot_width {
            return Err(StorageError::CounterOverflow {
                value: u64::from(counter),
                slot_width: self.slot_width,
            });
        }
        Ok(format!("{:<width$}", digits, width = self.slot_width))
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn slot_width(&self) -> usize {
        self.slot_width
    }

    fn read_slot<B: BlockStore>(&self, store: &mut B) -> Result<String> {
        let mut handle = open_with_retry(store, &self.path, OpenMode::Read, &self.retry)?;
        handle.seek(0)?;

        let mut buf = Vec::new();
        while buf.len() < MAX_LOAD_BYTES {
            match handle.read_byte()? {
                Some(b'\n') | None => break,
                Some(byte) => buf.push(byte),
            }
        }
        handle.close()?;

        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}
