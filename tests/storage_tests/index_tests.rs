//! Tests for the sparse column index
//!
//! These tests verify:
//! - Block resolution at exact block boundaries
//! - De-duplication of blocks selected by several names
//! - Comparator-aware search (non-bytewise orders)
//! - Index invariants enforced on read

use atlastable::db::{LongType, UTF8Type};
use atlastable::io::MemoryReader;
use atlastable::storage::index::{
    deserialize_index, index_for, resolve_block, select_blocks, serialize_index,
};
use atlastable::storage::IndexInfo;
use atlastable::AtlasError;

// =============================================================================
// Helper Functions
// =============================================================================

/// Blocks [b..d] [e..g] [h..j], 10 bytes each
fn bej_blocks() -> Vec<IndexInfo> {
    vec![
        IndexInfo::new(&b"b"[..], &b"d"[..], 0, 10),
        IndexInfo::new(&b"e"[..], &b"g"[..], 10, 10),
        IndexInfo::new(&b"h"[..], &b"j"[..], 20, 10),
    ]
}

fn block_position(name: &[u8], entries: &[IndexInfo]) -> Option<usize> {
    resolve_block(name, entries, &UTF8Type)
        .map(|info| entries.iter().position(|e| e == info).unwrap())
}

fn roundtrip(entries: &[IndexInfo]) -> Vec<u8> {
    let mut buf = Vec::new();
    serialize_index(entries, &mut buf).unwrap();
    buf
}

// =============================================================================
// Block Resolution Tests
// =============================================================================

#[test]
fn test_name_before_first_block_resolves_to_none() {
    assert_eq!(block_position(b"a", &bej_blocks()), None);
}

#[test]
fn test_first_name_of_block_resolves_to_block() {
    let entries = bej_blocks();
    assert_eq!(block_position(b"b", &entries), Some(0));
    assert_eq!(block_position(b"e", &entries), Some(1));
    assert_eq!(block_position(b"h", &entries), Some(2));
}

#[test]
fn test_name_inside_block_resolves_to_block() {
    let entries = bej_blocks();
    assert_eq!(block_position(b"d", &entries), Some(0));
    assert_eq!(block_position(b"c", &entries), Some(0));
    assert_eq!(block_position(b"f", &entries), Some(1));
    assert_eq!(block_position(b"j", &entries), Some(2));
}

#[test]
fn test_name_past_last_block_resolves_to_none() {
    let entries = bej_blocks();
    assert_eq!(index_for(b"z", &entries, &UTF8Type), entries.len());
    assert_eq!(block_position(b"z", &entries), None);
}

#[test]
fn test_name_in_gap_between_blocks_resolves_to_none() {
    let entries = vec![
        IndexInfo::new(&b"b"[..], &b"c"[..], 0, 10),
        IndexInfo::new(&b"f"[..], &b"g"[..], 10, 10),
    ];
    // "d" sorts after block 0 ends and before block 1 starts
    assert_eq!(block_position(b"d", &entries), None);
    assert_eq!(block_position(b"ca", &entries), None);
}

#[test]
fn test_empty_index_resolves_nothing() {
    assert_eq!(block_position(b"b", &[]), None);
}

#[test]
fn test_select_blocks_reads_each_block_once() {
    let entries = bej_blocks();
    let names: Vec<&[u8]> = vec![&b"b"[..], &b"c"[..], &b"d"[..], &b"h"[..], &b"a"[..]];

    let selected = select_blocks(names, &entries, &UTF8Type);

    assert_eq!(selected.len(), 2);
    assert_eq!(selected[0].offset, 0);
    assert_eq!(selected[1].offset, 20);
}

#[test]
fn test_select_blocks_is_ascending_regardless_of_input_order() {
    let entries = bej_blocks();
    let names: Vec<&[u8]> = vec![&b"i"[..], &b"f"[..], &b"b"[..]];

    let offsets: Vec<u64> = select_blocks(names, &entries, &UTF8Type)
        .iter()
        .map(|info| info.offset)
        .collect();

    assert_eq!(offsets, vec![0, 10, 20]);
}

#[test]
fn test_resolution_follows_the_comparator() {
    let name = |v: i64| v.to_be_bytes().to_vec();
    let entries = vec![
        IndexInfo::new(name(-100), name(-1), 0, 10),
        IndexInfo::new(name(0), name(50), 10, 10),
    ];

    // bytewise, -5 (0xff..) would sort after 50
    let found = resolve_block(&name(-5), &entries, &LongType).unwrap();
    assert_eq!(found.offset, 0);
    let found = resolve_block(&name(7), &entries, &LongType).unwrap();
    assert_eq!(found.offset, 10);
    assert!(resolve_block(&name(51), &entries, &LongType).is_none());
}

// =============================================================================
// Codec Tests
// =============================================================================

#[test]
fn test_index_survives_write_and_read() {
    let entries = bej_blocks();
    let mut reader = MemoryReader::new(roundtrip(&entries));

    let restored = deserialize_index(&mut reader, &UTF8Type).unwrap();

    assert_eq!(restored, entries);
}

#[test]
fn test_out_of_order_blocks_rejected() {
    let mut entries = bej_blocks();
    entries.swap(0, 1);
    entries[0].offset = 0;
    entries[1].offset = 10;

    let mut reader = MemoryReader::new(roundtrip(&entries));

    assert!(matches!(
        deserialize_index(&mut reader, &UTF8Type),
        Err(AtlasError::Integrity(_))
    ));
}

#[test]
fn test_block_with_inverted_bounds_rejected() {
    let entries = vec![IndexInfo::new(&b"x"[..], &b"a"[..], 0, 10)];
    let mut reader = MemoryReader::new(roundtrip(&entries));

    assert!(matches!(
        deserialize_index(&mut reader, &UTF8Type),
        Err(AtlasError::Integrity(_))
    ));
}

#[test]
fn test_first_block_must_start_at_zero() {
    let mut entries = bej_blocks();
    for entry in &mut entries {
        entry.offset += 4;
    }
    let mut reader = MemoryReader::new(roundtrip(&entries));

    assert!(matches!(
        deserialize_index(&mut reader, &UTF8Type),
        Err(AtlasError::Integrity(_))
    ));
}

#[test]
fn test_declared_size_mismatch_rejected() {
    let mut buf = roundtrip(&bej_blocks());
    // shrink the declared size so the last entry straddles it
    let size = u32::from_be_bytes(buf[0..4].try_into().unwrap());
    buf[0..4].copy_from_slice(&(size - 3).to_be_bytes());

    let mut reader = MemoryReader::new(buf);

    assert!(matches!(
        deserialize_index(&mut reader, &UTF8Type),
        Err(AtlasError::Integrity(_))
    ));
}
