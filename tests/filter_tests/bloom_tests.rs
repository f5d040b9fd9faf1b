//! Tests for the per-row column bloom filter
//!
//! These tests verify:
//! - No false negatives
//! - False positive rate close to the configured target
//! - Serialized blocks survive a write/read cycle
//! - Corrupted blocks are rejected as integrity errors

use atlastable::filter::BloomFilter;
use atlastable::io::{FileReader, MemoryReader};
use atlastable::AtlasError;

// =============================================================================
// Helper Functions
// =============================================================================

fn column_name(i: usize) -> Vec<u8> {
    format!("column-{:06}", i).into_bytes()
}

fn filled_filter(count: usize, rate: f64) -> BloomFilter {
    let mut filter = BloomFilter::new(count, rate);
    for i in 0..count {
        filter.add(&column_name(i));
    }
    filter
}

fn serialized(filter: &BloomFilter) -> Vec<u8> {
    let mut buf = Vec::new();
    filter.serialize(&mut buf);
    buf
}

/// Recompute the trailing CRC after tampering with the block
fn reseal(buf: &mut [u8]) {
    let len = buf.len();
    let crc = crc32fast::hash(&buf[4..len - 4]);
    buf[len - 4..].copy_from_slice(&crc.to_be_bytes());
}

// =============================================================================
// Membership Tests
// =============================================================================

#[test]
fn test_no_false_negatives() {
    let filter = filled_filter(10_000, 0.01);

    for i in 0..10_000 {
        assert!(filter.is_present(&column_name(i)), "column {} missing", i);
    }
}

#[test]
fn test_false_positive_rate_near_target() {
    let filter = filled_filter(5_000, 0.01);

    let false_positives = (5_000..50_000)
        .filter(|&i| filter.is_present(&column_name(i)))
        .count();
    let rate = false_positives as f64 / 45_000.0;

    assert!(rate < 0.05, "false positive rate too high: {}", rate);
}

#[test]
fn test_empty_filter_rejects_everything() {
    let filter = BloomFilter::new(100, 0.01);

    assert!(!filter.is_present(b"anything"));
    assert!(!filter.is_present(b""));
}

// =============================================================================
// Serialization Tests
// =============================================================================

#[test]
fn test_deserialized_filter_answers_identically() {
    let filter = filled_filter(500, 0.01);
    let mut reader = MemoryReader::new(serialized(&filter));

    let restored = BloomFilter::deserialize(&mut reader).unwrap();

    assert_eq!(restored, filter);
    for i in 0..2_000 {
        let name = column_name(i);
        assert_eq!(restored.is_present(&name), filter.is_present(&name));
    }
}

#[test]
fn test_deserialize_consumes_exactly_the_block() {
    let filter = filled_filter(50, 0.01);
    let mut buf = serialized(&filter);
    buf.extend_from_slice(b"trailing");

    let mut reader = MemoryReader::new(buf);
    BloomFilter::deserialize(&mut reader).unwrap();

    assert_eq!(reader.position().unwrap(), filter.serialized_size());
}

#[test]
fn test_flipped_bit_fails_checksum() {
    let filter = filled_filter(50, 0.01);
    let mut buf = serialized(&filter);
    buf[20] ^= 0x01; // inside the bit words

    let mut reader = MemoryReader::new(buf);
    let result = BloomFilter::deserialize(&mut reader);

    assert!(matches!(result, Err(AtlasError::Integrity(_))));
}

#[test]
fn test_zero_hash_count_rejected() {
    let filter = filled_filter(50, 0.01);
    let mut buf = serialized(&filter);
    buf[4..8].copy_from_slice(&0u32.to_be_bytes());
    reseal(&mut buf);

    let mut reader = MemoryReader::new(buf);
    let result = BloomFilter::deserialize(&mut reader);

    assert!(matches!(result, Err(AtlasError::Integrity(_))));
}

#[test]
fn test_oversized_hash_count_rejected() {
    let filter = filled_filter(50, 0.01);
    let mut buf = serialized(&filter);
    buf[4..8].copy_from_slice(&1000u32.to_be_bytes());
    reseal(&mut buf);

    let mut reader = MemoryReader::new(buf);
    assert!(matches!(
        BloomFilter::deserialize(&mut reader),
        Err(AtlasError::Integrity(_))
    ));
}

#[test]
fn test_truncated_block_is_corruption() {
    let filter = filled_filter(50, 0.01);
    let mut buf = serialized(&filter);
    buf.truncate(buf.len() - 10);

    let mut reader = MemoryReader::new(buf);
    let err = BloomFilter::deserialize(&mut reader).unwrap_err();

    assert!(err.is_corruption());
}
