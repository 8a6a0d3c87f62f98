//! Block Store Module
//!
//! The filesystem-on-a-card contract the log store is written against.
//!
//! ## Responsibilities
//! - Mount the card behind a chip-select line
//! - Open, check for and remove named files
//! - Byte-level reads and line-level writes through a handle
//!
//! ## Implementations
//! - [`FsBlockStore`]: a host directory stands in for the card
//! - [`MemBlockStore`]: an in-memory card with fault injection, used to
//!   exercise power-cycle and flaky-device paths

mod fs;
mod memory;

use std::io;

pub use fs::{FsBlockStore, FsFile};
pub use memory::{MemBlockStore, MemFile};

/// How a file is opened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// Existing file only, cursor at offset 0
    Read,

    /// Create if absent, never truncate, cursor at offset 0
    Write,

    /// Create if absent, every write lands at the end of the file
    Append,
}

/// Filesystem primitives exposed by the card driver
pub trait BlockStore {
    type Handle: FileHandle;

    /// Bring up the card behind `cs_pin`
    fn mount(&mut self, cs_pin: u8) -> io::Result<()>;

    /// Open `path` in the given mode
    fn open(&mut self, path: &str, mode: OpenMode) -> io::Result<Self::Handle>;

    /// Whether `path` currently exists on the card
    fn exists(&self, path: &str) -> bool;

    /// Remove `path` from the card
    fn remove(&mut self, path: &str) -> io::Result<()>;
}

/// An open file on the card
///
/// Dropping a handle releases it; `close` additionally guarantees the
/// written bytes have reached the device.
pub trait FileHandle {
    /// Current length of the file in bytes
    fn size(&self) -> io::Result<u64>;

    /// Move the read cursor to an absolute offset
    fn seek(&mut self, offset: u64) -> io::Result<()>;

    /// Read one byte at the cursor; `None` at end of file
    fn read_byte(&mut self) -> io::Result<Option<u8>>;

    /// Write raw bytes at the cursor (or the end, in append mode)
    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()>;

    /// Write `text` followed by the `\n` line terminator
    fn write_line(&mut self, text: &str) -> io::Result<()> {
        let mut buf = Vec::with_capacity(text.len() + 1);
        buf.extend_from_slice(text.as_bytes());
        buf.push(b'\n');
        self.write_all(&buf)
    }

    /// Flush to the device and release the handle
    fn close(self) -> io::Result<()>;
}
