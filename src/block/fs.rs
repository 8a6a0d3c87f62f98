//! Host filesystem block store
//!
//! A directory stands in for the card: mounting succeeds only when the
//! directory exists, so an absent directory behaves like an absent card.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use super::{BlockStore, FileHandle, OpenMode};

/// Block store rooted at a host directory
#[derive(Debug, Clone)]
pub struct FsBlockStore {
    /// Directory acting as the card's root
    root: PathBuf,
    /// Chip select the card was mounted on (None until mounted)
    mounted_on: Option<u8>,
}

impl FsBlockStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            mounted_on: None,
        }
    }

    /// Root directory of the store
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted_on.is_some()
    }

    fn resolve(&self, path: &str) -> io::Result<PathBuf> {
        if self.mounted_on.is_none() {
            return Err(io::Error::new(
                io::ErrorKind::NotConnected,
                "block store is not mounted",
            ));
        }
        Ok(self.root.join(path))
    }
}

impl BlockStore for FsBlockStore {
    type Handle = FsFile;

    fn mount(&mut self, cs_pin: u8) -> io::Result<()> {
        let meta = fs::metadata(&self.root).map_err(|e| {
            io::Error::new(
                e.kind(),
                format!("no card at {}: {}", self.root.display(), e),
            )
        })?;

        if !meta.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} is not a directory", self.root.display()),
            ));
        }

        self.mounted_on = Some(cs_pin);
        Ok(())
    }

    fn open(&mut self, path: &str, mode: OpenMode) -> io::Result<FsFile> {
        let full = self.resolve(path)?;

        let file = match mode {
            OpenMode::Read => File::open(&full)?,
            OpenMode::Write => OpenOptions::new()
                .read(true)
                .write(true)
                .create(true)
                .truncate(false)
                .open(&full)?,
            OpenMode::Append => OpenOptions::new()
                .read(true)
                .append(true)
                .create(true)
                .open(&full)?,
        };

        Ok(FsFile {
            reader: BufReader::new(file),
        })
    }

    fn exists(&self, path: &str) -> bool {
        self.resolve(path).map(|p| p.is_file()).unwrap_or(false)
    }

    fn remove(&mut self, path: &str) -> io::Result<()> {
        let full = self.resolve(path)?;
        fs::remove_file(full)
    }
}

/// Open file on an [`FsBlockStore`]
///
/// Reads go through a buffer; call `seek` after writing before reading again.
pub struct FsFile {
    reader: BufReader<File>,
}

impl FileHandle for FsFile {
    fn size(&self) -> io::Result<u64> {
        Ok(self.reader.get_ref().metadata()?.len())
    }

    fn seek(&mut self, offset: u64) -> io::Result<()> {
        // BufReader::seek discards the read buffer
        self.reader.seek(SeekFrom::Start(offset))?;
        Ok(())
    }

    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        let mut byte = [0u8; 1];
        match self.reader.read(&mut byte)? {
            0 => Ok(None),
            _ => Ok(Some(byte[0])),
        }
    }

    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.reader.get_mut().write_all(bytes)
    }

    fn close(self) -> io::Result<()> {
        let mut file = self.reader.into_inner();
        file.flush()?;
        file.sync_all()
    }
}
