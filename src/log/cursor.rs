//! Sequential line reader
//!
//! Streams the log line by line from a single open handle, continuing from
//! wherever the previous call stopped instead of rescanning from the top.

use crate::block::FileHandle;
use crate::error::Result;

/// Continuation bytes that can follow a UTF-8 lead byte
const MAX_UTF8_TAIL: usize = 3;

/// Cursor over the lines of the log file
///
/// Holds its own handle for the whole session; the handle is released on
/// `close` or drop.
pub struct LineCursor<H: FileHandle> {
    handle: Option<H>,
    /// Cap used by the `Iterator` implementation
    default_max: usize,
}

impl<H: FileHandle> LineCursor<H> {
    /// Start a session at the beginning of the file
    pub(crate) fn start(mut handle: H, default_max: usize) -> Result<Self> {
        handle.seek(0)?;
        Ok(Self {
            handle: Some(handle),
            default_max,
        })
    }

    /// Read the next line, at most `max_bytes` long
    ///
    /// If `max_bytes` is hit before a terminator, the rest of the line is
    /// returned by the following call. A cap that lands inside a multi-byte
    /// character is extended to the end of that character, so a returned
    /// piece may run up to 3 bytes over `max_bytes`. `None` once the file is
    /// exhausted.
    pub fn next_line(&mut self, max_bytes: usize) -> Result<Option<String>> {
        let line = match self.handle.as_mut() {
            Some(handle) => read_line(handle, max_bytes)?,
            None => None,
        };

        if line.is_none() {
            // Exhausted: release the handle early
            self.handle = None;
        }
        Ok(line)
    }

    /// End the session and release the handle
    pub fn close(mut self) -> Result<()> {
        if let Some(handle) = self.handle.take() {
            handle.close()?;
        }
        Ok(())
    }
}

impl<H: FileHandle> Iterator for LineCursor<H> {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        let max = self.default_max;
        self.next_line(max).transpose()
    }
}

// =============================================================================
// Line Scanning Helpers (shared with absolute reads)
// =============================================================================

/// Read bytes up to `\n`, `max_bytes` or EOF, whichever comes first
///
/// Returns `None` only if EOF is hit before any byte is read. The terminator
/// is consumed but not returned; a trailing `\r` is dropped. A cap that
/// splits a UTF-8 character reads on to the character boundary.
pub(crate) fn read_line<H: FileHandle>(handle: &mut H, max_bytes: usize) -> Result<Option<String>> {
    let mut buf = Vec::new();
    let mut hit_eof = false;

    while buf.len() < max_bytes {
        match handle.read_byte()? {
            Some(b'\n') => {
                if buf.last() == Some(&b'\r') {
                    buf.pop();
                }
                return Ok(Some(into_string(buf)));
            }
            Some(byte) => buf.push(byte),
            None => {
                hit_eof = true;
                break;
            }
        }
    }

    if hit_eof && buf.is_empty() {
        return Ok(None);
    }

    if !hit_eof {
        // Stopped at the cap: finish a split character
        let mut extra = 0;
        while extra < MAX_UTF8_TAIL && splits_char(&buf) {
            match handle.read_byte()? {
                Some(b'\n') => return Ok(Some(into_string(buf))),
                Some(byte) => buf.push(byte),
                None => {
                    hit_eof = true;
                    break;
                }
            }
            extra += 1;
        }
    }

    if hit_eof && buf.last() == Some(&b'\r') {
        buf.pop();
    }
    Ok(Some(into_string(buf)))
}

/// Advance past `count` terminated lines
///
/// Returns `false` if EOF arrives first.
pub(crate) fn skip_lines<H: FileHandle>(handle: &mut H, count: u32) -> Result<bool> {
    let mut skipped = 0;
    while skipped < count {
        match handle.read_byte()? {
            Some(b'\n') => skipped += 1,
            Some(_) => {}
            None => return Ok(false),
        }
    }
    Ok(true)
}

/// Whether `buf` ends partway through a UTF-8 sequence
fn splits_char(buf: &[u8]) -> bool {
    matches!(std::str::from_utf8(buf), Err(e) if e.error_len().is_none())
}

/// Invalid bytes on the card decode to U+FFFD rather than failing the read
fn into_string(buf: Vec<u8>) -> String {
    String::from_utf8(buf)
        .unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned())
}
