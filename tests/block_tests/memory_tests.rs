//! Tests for MemBlockStore
//!
//! These tests verify:
//! - Clones share one card (reboot simulation)
//! - In-place writes vs appends
//! - Fault injection (mount, open, remove, write)

use std::io::ErrorKind;

use spectralog::block::{BlockStore, FileHandle, MemBlockStore, OpenMode};

// =============================================================================
// Helper Functions
// =============================================================================

fn mounted_card() -> MemBlockStore {
    let mut card = MemBlockStore::new();
    card.mount(4).unwrap();
    card
}

// =============================================================================
// Basic Behaviour
// =============================================================================

#[test]
fn test_clones_share_the_card() {
    let mut card = mounted_card();
    let observer = card.clone();

    let mut handle = card.open("LOG1.CSV", OpenMode::Append).unwrap();
    handle.write_line("r1").unwrap();
    handle.close().unwrap();

    assert_eq!(observer.contents_string("LOG1.CSV").unwrap(), "r1\n");
    assert_eq!(observer.file_names(), vec!["LOG1.CSV".to_string()]);
}

#[test]
fn test_operations_require_mount() {
    let mut card = MemBlockStore::new();
    card.put_file("a.csv", "x");

    assert!(!card.exists("a.csv"));
    assert_eq!(card.open("a.csv", OpenMode::Read).err().unwrap().kind(), ErrorKind::NotConnected);
    assert_eq!(card.remove("a.csv").err().unwrap().kind(), ErrorKind::NotConnected);

    card.mount(4).unwrap();
    assert!(card.exists("a.csv"));
}

#[test]
fn test_write_mode_overwrites_from_cursor() {
    let mut card = mounted_card();
    card.put_file("m.csv", "12345     ");

    let mut handle = card.open("m.csv", OpenMode::Write).unwrap();
    handle.seek(0).unwrap();
    handle.write_all(b"7         ").unwrap();
    handle.close().unwrap();

    assert_eq!(card.contents_string("m.csv").unwrap(), "7         ");
}

#[test]
fn test_write_past_end_extends_file() {
    let mut card = mounted_card();
    card.put_file("m.csv", "ab");

    let mut handle = card.open("m.csv", OpenMode::Write).unwrap();
    handle.seek(1).unwrap();
    handle.write_all(b"XYZ").unwrap();

    assert_eq!(card.contents("m.csv").unwrap(), b"aXYZ");
}

#[test]
fn test_read_only_handle_rejects_writes() {
    let mut card = mounted_card();
    card.put_file("r.csv", "data");

    let mut handle = card.open("r.csv", OpenMode::Read).unwrap();
    assert!(handle.write_all(b"x").is_err());
    assert_eq!(card.contents("r.csv").unwrap(), b"data");
}

#[test]
fn test_handle_fails_after_file_removed() {
    let mut card = mounted_card();
    card.put_file("r.csv", "data");

    let mut handle = card.open("r.csv", OpenMode::Read).unwrap();
    card.remove("r.csv").unwrap();

    assert_eq!(handle.read_byte().err().unwrap().kind(), ErrorKind::NotFound);
    assert!(handle.size().is_err());
}

// =============================================================================
// Fault Injection
// =============================================================================

#[test]
fn test_mount_failure() {
    let mut card = MemBlockStore::new();
    card.set_mount_fails(true);

    assert!(card.mount(4).is_err());
    assert_eq!(card.mount_attempts(), 1);

    card.set_mount_fails(false);
    assert!(card.mount(4).is_ok());
}

#[test]
fn test_fail_next_opens_is_consumed() {
    let mut card = mounted_card();
    card.fail_next_opens(2);

    assert!(card.open("a.csv", OpenMode::Append).is_err());
    assert!(card.open("a.csv", OpenMode::Append).is_err());
    assert!(card.open("a.csv", OpenMode::Append).is_ok());
    assert_eq!(card.open_attempts(), 3);
}

#[test]
fn test_failed_open_does_not_create_file() {
    let mut card = mounted_card();
    card.fail_next_opens(1);

    assert!(card.open("a.csv", OpenMode::Append).is_err());
    assert!(card.file_names().is_empty());
}

#[test]
fn test_remove_failure_for_one_path() {
    let mut card = mounted_card();
    card.put_file("a.csv", "x");
    card.put_file("b.csv", "y");
    card.fail_removes_of("a.csv");

    assert!(card.remove("a.csv").is_err());
    assert!(card.remove("b.csv").is_ok());
    assert!(card.exists("a.csv"));

    card.clear_remove_failures();
    assert!(card.remove("a.csv").is_ok());
}

#[test]
fn test_write_failure() {
    let mut card = mounted_card();
    card.fail_writes(true);

    let mut handle = card.open("a.csv", OpenMode::Append).unwrap();
    assert!(handle.write_line("x").is_err());
    assert_eq!(card.contents("a.csv").unwrap(), b"");
}

#[test]
fn test_unmount_forgets_mount() {
    let mut card = mounted_card();
    card.put_file("a.csv", "x");
    card.unmount();

    assert!(!card.exists("a.csv"));
    assert!(card.contents("a.csv").is_some());
}
