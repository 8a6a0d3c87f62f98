//! Bounded open retry
//!
//! Card opens fail transiently while the reader re-detects the card. The
//! loop polls up to `max_attempts` times, optionally pausing in between.

use std::thread;

use crate::block::{BlockStore, OpenMode};
use crate::config::RetryPolicy;
use crate::error::{Result, StorageError};

/// Open `path`, retrying per `policy`
///
/// Returns `OpenFailure` once every attempt has failed. `NotFound` on a
/// read-mode open is returned immediately: retrying cannot create the file.
pub(crate) fn open_with_retry<B: BlockStore>(
    store: &mut B,
    path: &str,
    mode: OpenMode,
    policy: &RetryPolicy,
) -> Result<B::Handle> {
    for attempt in 1..=policy.max_attempts {
        match store.open(path, mode) {
            Ok(handle) => {
                if attempt > 1 {
                    tracing::debug!("Opened {} on attempt {}", path, attempt);
                }
                return Ok(handle);
            }
            Err(e) if mode == OpenMode::Read && e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StorageError::ReadUnavailable(format!("{} does not exist", path)));
            }
            Err(e) => {
                tracing::warn!(
                    "Open of {} failed (attempt {}/{}): {}",
                    path,
                    attempt,
                    policy.max_attempts,
                    e
                );
                if attempt < policy.max_attempts && !policy.delay.is_zero() {
                    thread::sleep(policy.delay);
                }
            }
        }
    }

    Err(StorageError::OpenFailure {
        path: path.to_string(),
        attempts: policy.max_attempts,
    })
}
