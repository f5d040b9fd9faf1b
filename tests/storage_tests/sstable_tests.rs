//! Tests for the SSTable container
//!
//! These tests verify:
//! - Builder writes header, rows, key index and footer that the reader accepts
//! - Rows must arrive in ascending decorated-key order
//! - Header, footer and key index validation on open
//! - Row section checksum verification
//! - Key decoration with both partitioners

use std::path::{Path, PathBuf};
use std::sync::Arc;

use atlastable::db::{Column, ColumnFamily, Comparator, PartitionerType, UTF8Type};
use atlastable::{AtlasError, Config, NamesLookup, SSTable, SSTableBuilder, SSTableReader};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_sstable() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("Keyspace1-Standard1-1-Data.db");
    (temp_dir, path)
}

fn utf8() -> Arc<dyn Comparator> {
    Arc::new(UTF8Type)
}

fn row(columns: &[(&str, &str)]) -> ColumnFamily {
    let mut cf = ColumnFamily::new("Standard1", utf8());
    for (name, value) in columns {
        cf.add_column(Column::new(
            name.as_bytes().to_vec(),
            value.as_bytes().to_vec(),
            1,
        ));
    }
    cf
}

/// Rows key00000..keyN, each with columns "a" and "b"
fn create_sstable_with_rows(path: &Path, config: &Config, count: usize) -> SSTable {
    let mut builder = SSTableBuilder::new(path, config).unwrap();
    for i in 0..count {
        let value = format!("value{}", i);
        builder
            .add_row(&format!("key{:05}", i), &row(&[("a", &value), ("b", "x")]))
            .unwrap();
    }
    builder.finish().unwrap()
}

fn value_of(lookup: &NamesLookup, name: &str) -> Option<String> {
    lookup
        .column_family()?
        .get_column(name.as_bytes())
        .map(|c| String::from_utf8(c.value().to_vec()).unwrap())
}

// =============================================================================
// SSTableBuilder Tests
// =============================================================================

#[test]
fn test_builder_empty_sstable() {
    let (_temp, path) = setup_temp_sstable();
    let config = Config::default();

    let builder = SSTableBuilder::new(&path, &config).unwrap();
    let sstable = builder.finish().unwrap();

    assert_eq!(sstable.row_count(), 0);
    assert!(sstable.first_key.is_empty());
    // header + footer only
    assert_eq!(sstable.file_size, 14 + 16);

    let reader = SSTableReader::open(&path, &config).unwrap();
    assert_eq!(reader.row_count(), 0);
    assert_eq!(reader.keys().count(), 0);
}

#[test]
fn test_builder_records_key_range() {
    let (_temp, path) = setup_temp_sstable();
    let sstable = create_sstable_with_rows(&path, &Config::default(), 10);

    assert_eq!(sstable.row_count(), 10);
    assert_eq!(sstable.first_key, "key00000");
    assert_eq!(sstable.last_key, "key00009");
    assert_eq!(
        sstable.file_size,
        std::fs::metadata(&path).unwrap().len()
    );
}

#[test]
fn test_builder_rejects_unsorted_keys() {
    let (_temp, path) = setup_temp_sstable();
    let mut builder = SSTableBuilder::new(&path, &Config::default()).unwrap();

    builder.add_row("banana", &row(&[("a", "1")])).unwrap();
    let result = builder.add_row("apple", &row(&[("a", "2")]));
    assert!(matches!(result, Err(AtlasError::Storage(_))));
}

#[test]
fn test_builder_rejects_duplicate_keys() {
    let (_temp, path) = setup_temp_sstable();
    let mut builder = SSTableBuilder::new(&path, &Config::default()).unwrap();

    builder.add_row("apple", &row(&[("a", "1")])).unwrap();
    let result = builder.add_row("apple", &row(&[("a", "2")]));
    assert!(matches!(result, Err(AtlasError::Storage(_))));
}

#[test]
fn test_builder_rejects_invalid_config() {
    let (_temp, path) = setup_temp_sstable();
    let config = Config::builder().column_index_size(0).build();

    let result = SSTableBuilder::new(&path, &config);
    assert!(matches!(result, Err(AtlasError::Config(_))));
}

#[test]
fn test_write_sorts_rows() {
    let (_temp, path) = setup_temp_sstable();
    let config = Config::default();

    let rows = vec![
        ("cherry", row(&[("a", "3")])),
        ("apple", row(&[("a", "1")])),
        ("banana", row(&[("a", "2")])),
    ];
    let sstable = SSTable::write(&path, &config, rows).unwrap();
    assert_eq!(sstable.first_key, "apple");
    assert_eq!(sstable.last_key, "cherry");

    let reader = SSTableReader::open(&path, &config).unwrap();
    let keys: Vec<_> = reader.keys().collect();
    assert_eq!(keys, vec!["apple", "banana", "cherry"]);
}

// =============================================================================
// SSTableReader Tests - Lookups
// =============================================================================

#[test]
fn test_reader_get_named_columns() {
    let (_temp, path) = setup_temp_sstable();
    let config = Config::default();
    create_sstable_with_rows(&path, &config, 100);

    let reader = SSTableReader::open(&path, &config).unwrap();

    // out of order: lookups go through the key index, not a scan
    for i in [45, 10, 99, 0, 73] {
        let lookup = reader
            .get_named_columns(&format!("key{:05}", i), "Standard1", [&b"a"[..]], utf8())
            .unwrap();
        assert!(lookup.is_found());
        assert_eq!(value_of(&lookup, "a"), Some(format!("value{}", i)));
        assert_eq!(value_of(&lookup, "b"), None);
    }
}

#[test]
fn test_reader_missing_row() {
    let (_temp, path) = setup_temp_sstable();
    let config = Config::default();
    create_sstable_with_rows(&path, &config, 5);

    let reader = SSTableReader::open(&path, &config).unwrap();
    let lookup = reader
        .get_named_columns("key99999", "Standard1", [&b"a"[..]], utf8())
        .unwrap();
    assert_eq!(lookup, NamesLookup::RowNotFound);
}

#[test]
fn test_reader_shared_across_queries() {
    let (_temp, path) = setup_temp_sstable();
    let config = Config::default();
    create_sstable_with_rows(&path, &config, 3);

    let reader = SSTableReader::open(&path, &config).unwrap();
    let first = reader
        .get_named_columns("key00001", "Standard1", [&b"a"[..], &b"b"[..]], utf8())
        .unwrap();
    let second = reader
        .get_named_columns("key00001", "Standard1", [&b"b"[..], &b"a"[..]], utf8())
        .unwrap();
    assert_eq!(first, second);
    assert_eq!(first.columns().count(), 2);
}

// =============================================================================
// Partitioner Tests
// =============================================================================

#[test]
fn test_hash_partitioner_round_trip() {
    let (_temp, path) = setup_temp_sstable();
    let config = Config::builder()
        .partitioner(PartitionerType::Hash)
        .build();

    let rows = (0..20).map(|i| (format!("user{}", i), row(&[("email", "e")])));
    let sstable = SSTable::write(&path, &config, rows).unwrap();
    assert_eq!(sstable.row_count(), 20);
    assert!(sstable.first_key.contains(':'));

    let reader = SSTableReader::open(&path, &config).unwrap();
    let mut keys: Vec<String> = reader.keys().map(str::to_string).collect();
    keys.sort();
    let mut expected: Vec<String> = (0..20).map(|i| format!("user{}", i)).collect();
    expected.sort();
    assert_eq!(keys, expected);

    let lookup = reader
        .get_named_columns("user7", "Standard1", [&b"email"[..]], utf8())
        .unwrap();
    assert!(lookup.is_found());
}

// =============================================================================
// Error Handling Tests
// =============================================================================

#[test]
fn test_open_nonexistent_file() {
    let (_temp, path) = setup_temp_sstable();

    let result = SSTableReader::open(&path, &Config::default());
    assert!(matches!(result, Err(AtlasError::Io(_))));
}

#[test]
fn test_open_too_small() {
    let (_temp, path) = setup_temp_sstable();
    std::fs::write(&path, b"ATCF").unwrap();

    let result = SSTableReader::open(&path, &Config::default());
    assert!(matches!(result, Err(AtlasError::Integrity(_))));
}

#[test]
fn test_open_invalid_magic() {
    let (_temp, path) = setup_temp_sstable();
    std::fs::write(&path, b"GARBAGE_DATA_NOT_AN_SSTABLE_FILE").unwrap();

    let result = SSTableReader::open(&path, &Config::default());
    assert!(matches!(result, Err(AtlasError::Integrity(_))));
}

#[test]
fn test_open_unsupported_version() {
    let (_temp, path) = setup_temp_sstable();
    let config = Config::default();
    create_sstable_with_rows(&path, &config, 2);

    let mut data = std::fs::read(&path).unwrap();
    data[4..6].copy_from_slice(&99u16.to_be_bytes());
    std::fs::write(&path, data).unwrap();

    let result = SSTableReader::open(&path, &config);
    assert!(matches!(result, Err(AtlasError::Integrity(_))));
}

#[test]
fn test_open_row_count_mismatch() {
    let (_temp, path) = setup_temp_sstable();
    let config = Config::default();
    create_sstable_with_rows(&path, &config, 3);

    let mut data = std::fs::read(&path).unwrap();
    data[6..14].copy_from_slice(&7u64.to_be_bytes());
    std::fs::write(&path, data).unwrap();

    let result = SSTableReader::open(&path, &config);
    assert!(matches!(result, Err(AtlasError::Integrity(_))));
}

#[test]
fn test_open_index_offset_out_of_range() {
    let (_temp, path) = setup_temp_sstable();
    let config = Config::default();
    create_sstable_with_rows(&path, &config, 3);

    let mut data = std::fs::read(&path).unwrap();
    let footer = data.len() - 16;
    data[footer..footer + 8].copy_from_slice(&u64::MAX.to_be_bytes());
    std::fs::write(&path, data).unwrap();

    let result = SSTableReader::open(&path, &config);
    assert!(matches!(result, Err(AtlasError::Integrity(_))));
}

// =============================================================================
// Checksum Tests
// =============================================================================

#[test]
fn test_verify_checksum_clean_file() {
    let (_temp, path) = setup_temp_sstable();
    let config = Config::default();
    create_sstable_with_rows(&path, &config, 50);

    let reader = SSTableReader::open(&path, &config).unwrap();
    reader.verify_checksum().unwrap();
}

#[test]
fn test_verify_checksum_detects_corruption() {
    let (_temp, path) = setup_temp_sstable();
    let config = Config::default();
    create_sstable_with_rows(&path, &config, 50);

    // last byte before the key index sits inside the final row's columns
    let reader = SSTableReader::open(&path, &config).unwrap();
    let mut data = std::fs::read(&path).unwrap();
    let footer = data.len() - 16;
    let mut offset_bytes = [0u8; 8];
    offset_bytes.copy_from_slice(&data[footer..footer + 8]);
    let index_offset = u64::from_be_bytes(offset_bytes) as usize;
    data[index_offset - 1] ^= 0xFF;
    std::fs::write(&path, data).unwrap();

    let result = reader.verify_checksum();
    assert!(matches!(result, Err(AtlasError::Integrity(_))));
}
