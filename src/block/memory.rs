//! In-memory block store
//!
//! Models a card held entirely in RAM. Clones share the same card, so a test
//! can drop a store (power loss), build a new one from a clone (reboot) and
//! see exactly what had reached the device.
//!
//! Faults are injected per store and consumed as operations hit them:
//! - mount failure (no card detected)
//! - the next N opens fail (slow card detection)
//! - removal of a specific path fails
//! - every write fails

use std::collections::{BTreeMap, HashSet};
use std::io;
use std::sync::Arc;

use parking_lot::Mutex;

use super::{BlockStore, FileHandle, OpenMode};

/// Shared state of the simulated card
#[derive(Debug, Default)]
struct Card {
    files: BTreeMap<String, Vec<u8>>,
    mounted: bool,

    // Fault plan
    mount_fails: bool,
    open_failures_pending: u32,
    remove_failures: HashSet<String>,
    writes_fail: bool,

    // Counters
    open_attempts: u64,
    mount_attempts: u64,
}

/// Block store backed by memory, with fault injection
#[derive(Debug, Clone, Default)]
pub struct MemBlockStore {
    card: Arc<Mutex<Card>>,
}

impl MemBlockStore {
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Fault Injection
    // =========================================================================

    /// Make every subsequent mount fail (or succeed again)
    pub fn set_mount_fails(&self, fails: bool) {
        self.card.lock().mount_fails = fails;
    }

    /// Fail the next `count` open calls, whatever the path
    pub fn fail_next_opens(&self, count: u32) {
        self.card.lock().open_failures_pending = count;
    }

    /// Make removal of `path` fail until cleared
    pub fn fail_removes_of(&self, path: impl Into<String>) {
        self.card.lock().remove_failures.insert(path.into());
    }

    pub fn clear_remove_failures(&self) {
        self.card.lock().remove_failures.clear();
    }

    /// Make every write through any handle fail (or succeed again)
    pub fn fail_writes(&self, fails: bool) {
        self.card.lock().writes_fail = fails;
    }

    // =========================================================================
    // Inspection
    // =========================================================================

    /// Raw contents of `path`, if present
    pub fn contents(&self, path: &str) -> Option<Vec<u8>> {
        self.card.lock().files.get(path).cloned()
    }

    /// Contents of `path` decoded as text, if present
    pub fn contents_string(&self, path: &str) -> Option<String> {
        self.contents(path)
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Place a file on the card directly, bypassing the mount check
    pub fn put_file(&self, path: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.card.lock().files.insert(path.into(), bytes.into());
    }

    /// Names of every file on the card, sorted
    pub fn file_names(&self) -> Vec<String> {
        self.card.lock().files.keys().cloned().collect()
    }

    /// Total open calls seen, successful or not
    pub fn open_attempts(&self) -> u64 {
        self.card.lock().open_attempts
    }

    pub fn mount_attempts(&self) -> u64 {
        self.card.lock().mount_attempts
    }

    /// Forget the mount, as after a power cycle
    pub fn unmount(&self) {
        self.card.lock().mounted = false;
    }
}

fn not_mounted() -> io::Error {
    io::Error::new(io::ErrorKind::NotConnected, "card not mounted")
}

impl BlockStore for MemBlockStore {
    type Handle = MemFile;

    fn mount(&mut self, _cs_pin: u8) -> io::Result<()> {
        let mut card = self.card.lock();
        card.mount_attempts += 1;

        if card.mount_fails {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                "card not detected",
            ));
        }

        card.mounted = true;
        Ok(())
    }

    fn open(&mut self, path: &str, mode: OpenMode) -> io::Result<MemFile> {
        let mut card = self.card.lock();
        card.open_attempts += 1;

        if !card.mounted {
            return Err(not_mounted());
        }

        if card.open_failures_pending > 0 {
            card.open_failures_pending -= 1;
            return Err(io::Error::new(
                io::ErrorKind::TimedOut,
                "card did not respond",
            ));
        }

        match mode {
            OpenMode::Read => {
                if !card.files.contains_key(path) {
                    return Err(io::Error::new(
                        io::ErrorKind::NotFound,
                        format!("{} not found", path),
                    ));
                }
            }
            OpenMode::Write | OpenMode::Append => {
                card.files.entry(path.to_string()).or_default();
            }
        }

        Ok(MemFile {
            card: Arc::clone(&self.card),
            path: path.to_string(),
            mode,
            cursor: 0,
        })
    }

    fn exists(&self, path: &str) -> bool {
        let card = self.card.lock();
        card.mounted && card.files.contains_key(path)
    }

    fn remove(&mut self, path: &str) -> io::Result<()> {
        let mut card = self.card.lock();

        if !card.mounted {
            return Err(not_mounted());
        }

        if card.remove_failures.contains(path) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("{} could not be removed", path),
            ));
        }

        match card.files.remove(path) {
            Some(_) => Ok(()),
            None => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} not found", path),
            )),
        }
    }
}

/// Open file on a [`MemBlockStore`]
///
/// Writes land on the card immediately; a removed file makes every further
/// operation on the handle fail with `NotFound`.
#[derive(Debug)]
pub struct MemFile {
    card: Arc<Mutex<Card>>,
    path: String,
    mode: OpenMode,
    cursor: u64,
}

impl MemFile {
    fn missing(&self) -> io::Error {
        io::Error::new(
            io::ErrorKind::NotFound,
            format!("{} was removed while open", self.path),
        )
    }
}

impl FileHandle for MemFile {
    fn size(&self) -> io::Result<u64> {
        let card = self.card.lock();
        card.files
            .get(&self.path)
            .map(|data| data.len() as u64)
            .ok_or_else(|| self.missing())
    }

    fn seek(&mut self, offset: u64) -> io::Result<()> {
        self.cursor = offset;
        Ok(())
    }

    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        let card = self.card.lock();
        let data = card.files.get(&self.path).ok_or_else(|| self.missing())?;

        let byte = usize::try_from(self.cursor)
            .ok()
            .and_then(|pos| data.get(pos).copied());
        drop(card);

        if byte.is_some() {
            self.cursor += 1;
        }
        Ok(byte)
    }

    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        if self.mode == OpenMode::Read {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "handle opened read-only",
            ));
        }

        let mut card = self.card.lock();
        if card.writes_fail {
            return Err(io::Error::new(io::ErrorKind::Other, "write fault"));
        }

        let append = self.mode == OpenMode::Append;
        let data = card
            .files
            .get_mut(&self.path)
            .ok_or_else(|| self.missing())?;

        if append {
            data.extend_from_slice(bytes);
            self.cursor = data.len() as u64;
            return Ok(());
        }

        let start = usize::try_from(self.cursor)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "offset too large"))?;
        if start > data.len() {
            data.resize(start, 0);
        }

        let overlap = (data.len() - start).min(bytes.len());
        data[start..start + overlap].copy_from_slice(&bytes[..overlap]);
        data.extend_from_slice(&bytes[overlap..]);
        self.cursor = (start + bytes.len()) as u64;
        Ok(())
    }

    fn close(self) -> io::Result<()> {
        Ok(())
    }
}
