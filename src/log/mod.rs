//! Log Module
//!
//! Owns the append-only CSV log on the card.
//!
//! ## Responsibilities
//! - Create the log with a self-describing header on first use
//! - Append one record per call, flushed before the call returns
//! - Random-access (by line number) and sequential reads
//! - Latch an error flag when the card stops cooperating
//!
//! ## File Format
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │ DATE,TIME,MANUAL,INT_TIME,...,X,Y,Z,340,345,...,1010,\n     │  header (once)
//! ├──────────────────────────────────────────────────────────────┤
//! │ <record 1>\n                                                 │
//! │ <record 2>\n                                                 │
//! │ ...                                                          │
//! └──────────────────────────────────────────────────────────────┘
//! ```

mod cursor;
mod header;
mod retry;
mod store;

pub use cursor::LineCursor;
pub use header::{header_line, HEADER_COLUMNS};
pub use store::LogStore;

pub(crate) use retry::open_with_retry;

/// Latched failure indicator
///
/// Starts lowered; once raised it stays raised for the life of the value.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ErrorFlag {
    raised: bool,
}

impl ErrorFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raise(&mut self) {
        self.raised = true;
    }

    pub fn is_raised(&self) -> bool {
        self.raised
    }
}
