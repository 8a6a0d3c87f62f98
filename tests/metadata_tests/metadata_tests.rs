//! Tests for MetadataStore
//!
//! These tests verify:
//! - Lenient loading (missing / corrupt => 0, unreadable => error)
//! - Fixed-width in-place persistence
//! - Overflow rejection
//! - Deletion

use spectralog::block::{BlockStore, MemBlockStore};
use spectralog::config::RetryPolicy;
use spectralog::metadata::MetadataStore;
use spectralog::StorageError;

const META: &str = "LOG1_META.CSV";

// =============================================================================
// Helper Functions
// =============================================================================

fn mounted_card() -> MemBlockStore {
    let mut card = MemBlockStore::new();
    card.mount(4).unwrap();
    card
}

fn metadata(width: usize) -> MetadataStore {
    MetadataStore::new(META, width, RetryPolicy::default())
}

// =============================================================================
// Load Tests
// =============================================================================

#[test]
fn test_load_missing_file_is_zero() {
    let mut card = mounted_card();
    assert_eq!(metadata(10).load(&mut card).unwrap(), 0);
}

#[test]
fn test_load_padded_value() {
    let mut card = mounted_card();
    card.put_file(META, "7         ");

    assert_eq!(metadata(10).load(&mut card).unwrap(), 7);
}

#[test]
fn test_load_tolerates_trailing_newline() {
    let mut card = mounted_card();
    card.put_file(META, "42\r\n");

    assert_eq!(metadata(10).load(&mut card).unwrap(), 42);
}

#[test]
fn test_load_corrupt_is_zero() {
    let mut card = mounted_card();

    card.put_file(META, "garbage   ");
    assert_eq!(metadata(10).load(&mut card).unwrap(), 0);

    card.put_file(META, "-3        ");
    assert_eq!(metadata(10).load(&mut card).unwrap(), 0);

    card.put_file(META, "");
    assert_eq!(metadata(10).load(&mut card).unwrap(), 0);
}

#[test]
fn test_load_unreadable_is_error() {
    let mut card = mounted_card();
    card.put_file(META, "9         ");
    card.fail_next_opens(5);

    let err = metadata(10).load(&mut card).unwrap_err();
    assert!(matches!(err, StorageError::OpenFailure { attempts: 5, .. }));
    assert_eq!(card.contents_string(META).unwrap(), "9         ");

    // Readable again once the card answers
    assert_eq!(metadata(10).load(&mut card).unwrap(), 9);
}

// =============================================================================
// Persist Tests
// =============================================================================

#[test]
fn test_persist_pads_to_slot_width() {
    let mut card = mounted_card();

    metadata(10).persist(&mut card, 7).unwrap();

    assert_eq!(card.contents_string(META).unwrap(), "7         ");
}

#[test]
fn test_persist_overwrites_longer_value() {
    let mut card = mounted_card();
    let meta = metadata(10);

    meta.persist(&mut card, 123456).unwrap();
    meta.persist(&mut card, 8).unwrap();

    assert_eq!(card.contents_string(META).unwrap(), "8         ");
    assert_eq!(meta.load(&mut card).unwrap(), 8);
}

#[test]
fn test_persist_then_load() {
    let mut card = mounted_card();
    let meta = metadata(10);

    for value in [0u32, 1, 99, 1000, u32::MAX] {
        meta.persist(&mut card, value).unwrap();
        assert_eq!(meta.load(&mut card).unwrap(), value);
    }
}

#[test]
fn test_persist_rejects_overflow() {
    let mut card = mounted_card();
    let meta = metadata(3);

    meta.persist(&mut card, 999).unwrap();
    let err = meta.persist(&mut card, 1000).unwrap_err();

    assert!(matches!(err, StorageError::CounterOverflow { value: 1000, slot_width: 3 }));
    assert_eq!(card.contents_string(META).unwrap(), "999");
}

#[test]
fn test_persist_open_failure() {
    let mut card = mounted_card();
    card.fail_next_opens(5);

    let err = metadata(10).persist(&mut card, 1).unwrap_err();

    assert!(matches!(err, StorageError::OpenFailure { attempts: 5, .. }));
    assert!(card.contents(META).is_none());
}

#[test]
fn test_encode() {
    let meta = metadata(6);
    assert_eq!(meta.encode(12).unwrap(), "12    ");
    assert_eq!(meta.encode(123456).unwrap(), "123456");
    assert!(meta.encode(1234567).is_err());
}

// =============================================================================
// Delete Tests
// =============================================================================

#[test]
fn test_delete() {
    let mut card = mounted_card();
    let meta = metadata(10);
    meta.persist(&mut card, 3).unwrap();

    meta.delete(&mut card).unwrap();
    assert!(card.contents(META).is_none());
    assert_eq!(meta.load(&mut card).unwrap(), 0);

    // Absent file counts as removed
    meta.delete(&mut card).unwrap();
}

#[test]
fn test_delete_failure() {
    let mut card = mounted_card();
    let meta = metadata(10);
    meta.persist(&mut card, 3).unwrap();
    card.fail_removes_of(META);

    assert!(meta.delete(&mut card).is_err());
    assert_eq!(meta.load(&mut card).unwrap(), 3);
}
