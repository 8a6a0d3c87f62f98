//! Tests for LineCursor
//!
//! These tests verify:
//! - Streaming the whole file without re-seeking
//! - Agreement with absolute addressing
//! - Partial reads resume mid-line

use spectralog::block::MemBlockStore;
use spectralog::config::Config;
use spectralog::log::LogStore;

// =============================================================================
// Helper Functions
// =============================================================================

fn log_with_records(count: usize) -> (MemBlockStore, LogStore<MemBlockStore>) {
    let card = MemBlockStore::new();
    let config = Config::builder().wavelengths(340, 350, 5).build();
    let mut log = LogStore::new(card.clone(), config).unwrap();
    log.init(4).unwrap();
    for i in 0..count {
        log.write_line(&format!("2024-01-01,12:00:{:02},0,100,1,1,0,0,{},{},{}", i, i, i, i))
            .unwrap();
    }
    (card, log)
}

// =============================================================================
// Streaming Tests
// =============================================================================

#[test]
fn test_cursor_streams_every_line() {
    let (_card, mut log) = log_with_records(3);

    let lines: Vec<String> = log.lines().unwrap().map(|l| l.unwrap()).collect();

    assert_eq!(lines.len(), 4);
    assert!(lines[0].starts_with("DATE,TIME"));
    assert!(lines[3].starts_with("2024-01-01,12:00:02"));
}

#[test]
fn test_cursor_opens_file_once() {
    let (card, mut log) = log_with_records(10);
    let before = card.open_attempts();

    let count = log.lines().unwrap().count();

    assert_eq!(count, 11);
    assert_eq!(card.open_attempts(), before + 1);
}

#[test]
fn test_cursor_matches_absolute_reads() {
    let (_card, mut log) = log_with_records(6);

    let streamed: Vec<String> = log.lines().unwrap().map(|l| l.unwrap()).collect();

    for (i, line) in streamed.iter().enumerate() {
        let absolute = log.read_line_at(i as u32 + 1).unwrap().unwrap();
        assert_eq!(&absolute, line, "line {} differs", i + 1);
    }
}

#[test]
fn test_next_line_resumes_mid_line() {
    let card = MemBlockStore::new();
    let config = Config::builder().wavelengths(340, 350, 5).build();
    let mut log = LogStore::new(card.clone(), config).unwrap();
    log.init(4).unwrap();
    card.put_file("LOG1.CSV", "abcdef\ngh\n");

    let mut cursor = log.lines().unwrap();
    assert_eq!(cursor.next_line(4).unwrap().unwrap(), "abcd");
    assert_eq!(cursor.next_line(4).unwrap().unwrap(), "ef");
    assert_eq!(cursor.next_line(4).unwrap().unwrap(), "gh");
    assert_eq!(cursor.next_line(4).unwrap(), None);
    assert_eq!(cursor.next_line(4).unwrap(), None);
}

#[test]
fn test_next_line_cap_keeps_characters_whole() {
    let card = MemBlockStore::new();
    let config = Config::builder().wavelengths(340, 350, 5).build();
    let mut log = LogStore::new(card.clone(), config).unwrap();
    log.init(4).unwrap();
    // 'é' is 2 bytes, '€' is 3
    card.put_file("LOG1.CSV", "a\u{e9}\u{20ac}b\n\u{20ac}\n");

    let mut cursor = log.lines().unwrap();
    assert_eq!(cursor.next_line(2).unwrap().unwrap(), "a\u{e9}");
    assert_eq!(cursor.next_line(2).unwrap().unwrap(), "\u{20ac}");
    assert_eq!(cursor.next_line(2).unwrap().unwrap(), "b");
    assert_eq!(cursor.next_line(1).unwrap().unwrap(), "\u{20ac}");
    // Cap reached just before the terminator, as with ASCII
    assert_eq!(cursor.next_line(1).unwrap().unwrap(), "");
    assert_eq!(cursor.next_line(1).unwrap(), None);
}

#[test]
fn test_cursor_on_missing_file_is_unavailable() {
    let card = MemBlockStore::new();
    let mut log = LogStore::new(card, Config::default()).unwrap();
    log.init(4).unwrap();

    assert!(log.lines().is_err());
}

#[test]
fn test_cursor_close_releases_handle() {
    let (_card, mut log) = log_with_records(2);

    let mut cursor = log.lines().unwrap();
    assert!(cursor.next_line(5000).unwrap().is_some());
    cursor.close().unwrap();

    // Absolute reads still work afterwards
    assert!(log.read_line_at(2).unwrap().is_some());
}
