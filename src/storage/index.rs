//! Sparse column index
//!
//! Coarse index over a row's serialized columns. Each entry describes one
//! contiguous block of columns by its first and last column name, its offset
//! relative to the start of the column data and its width in bytes.
//!
//! ## On-disk Format
//! ```text
//! ┌────────────────┬──────────────────────────────────────────────────────┐
//! │ IndexSize (u32)│ Entries (IndexSize bytes)                            │
//! │                │ [FirstName u16+N][LastName u16+N][Offset u64][Width u64]
//! └────────────────┴──────────────────────────────────────────────────────┘
//! ```
//!
//! Invariants checked on read: entries ascending (`first <= last`,
//! `last[i] < first[i+1]`), blocks contiguous starting at offset 0.

use std::cmp::Ordering;

use bytes::{BufMut, Bytes};

use crate::db::{Column, Comparator};
use crate::error::{AtlasError, Result};
use crate::io::{put_short_bytes, FileReader};

/// One block of the sparse index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexInfo {
    pub first_name: Bytes,
    pub last_name: Bytes,
    /// Relative to the first byte of column data
    pub offset: u64,
    pub width: u64,
}

impl IndexInfo {
    pub fn new(
        first_name: impl Into<Bytes>,
        last_name: impl Into<Bytes>,
        offset: u64,
        width: u64,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            offset,
            width,
        }
    }

    /// First byte past the block; an overflowing width is corruption
    pub fn end(&self) -> Result<u64> {
        self.offset.checked_add(self.width).ok_or_else(|| {
            AtlasError::integrity(format!(
                "column index block at {} has impossible width {}",
                self.offset, self.width
            ))
        })
    }

    fn serialized_size(&self) -> u64 {
        (2 + self.first_name.len() + 2 + self.last_name.len() + 8 + 8) as u64
    }
}

// =============================================================================
// Block Resolution
// =============================================================================

/// Position of the first block whose last name is `>= name`
///
/// Returns `entries.len()` when every block ends before `name`.
pub fn index_for(name: &[u8], entries: &[IndexInfo], comparator: &dyn Comparator) -> usize {
    entries.partition_point(|info| comparator.compare(&info.last_name, name) == Ordering::Less)
}

/// The only block that can hold `name`, if any
pub fn resolve_block<'a>(
    name: &[u8],
    entries: &'a [IndexInfo],
    comparator: &dyn Comparator,
) -> Option<&'a IndexInfo> {
    let index = index_for(name, entries, comparator);
    if index == entries.len() {
        return None;
    }
    let info = &entries[index];
    if comparator.compare(name, &info.first_name) == Ordering::Less {
        return None;
    }
    Some(info)
}

/// Distinct candidate blocks for `names`, ascending
///
/// Several names landing in the same block select it once.
pub fn select_blocks<'a, I, N>(
    names: I,
    entries: &'a [IndexInfo],
    comparator: &dyn Comparator,
) -> Vec<&'a IndexInfo>
where
    I: IntoIterator<Item = N>,
    N: AsRef<[u8]>,
{
    let mut selected: Vec<&IndexInfo> = names
        .into_iter()
        .filter_map(|name| resolve_block(name.as_ref(), entries, comparator))
        .collect();

    // blocks are disjoint and ascending, so offset order is comparator order
    selected.sort_by_key(|info| info.offset);
    selected.dedup_by_key(|info| info.offset);
    selected
}

// =============================================================================
// Codec
// =============================================================================

pub fn serialize_index(entries: &[IndexInfo], buf: &mut Vec<u8>) -> Result<()> {
    let size: u64 = entries.iter().map(IndexInfo::serialized_size).sum();
    let size = u32::try_from(size)
        .map_err(|_| AtlasError::Storage(format!("column index too large: {} bytes", size)))?;

    buf.put_u32(size);
    for info in entries {
        put_short_bytes(buf, &info.first_name)?;
        put_short_bytes(buf, &info.last_name)?;
        buf.put_u64(info.offset);
        buf.put_u64(info.width);
    }
    Ok(())
}

/// Read the index and check its invariants under `comparator`
pub fn deserialize_index<R: FileReader + ?Sized>(
    reader: &mut R,
    comparator: &dyn Comparator,
) -> Result<Vec<IndexInfo>> {
    let size = reader.read_u32()? as u64;
    let start = reader.position()?;
    let end = start
        .checked_add(size)
        .ok_or_else(|| AtlasError::integrity("column index size overflows the file"))?;

    let mut entries: Vec<IndexInfo> = Vec::new();
    while reader.position()? < end {
        let first_name = Bytes::from(reader.read_short_bytes()?);
        let last_name = Bytes::from(reader.read_short_bytes()?);
        let offset = reader.read_u64()?;
        let width = reader.read_u64()?;
        let info = IndexInfo {
            first_name,
            last_name,
            offset,
            width,
        };
        check_entry(&info, entries.last(), comparator)?;
        entries.push(info);
    }

    let position = reader.position()?;
    if position != end {
        return Err(AtlasError::integrity(format!(
            "column index overran its declared size: ended at {}, expected {}",
            position, end
        )));
    }

    Ok(entries)
}

/// Check that `entries` tile the column region of `column_region_len` bytes
///
/// Blocks are already known to be contiguous from offset 0, so only the end
/// of the last one needs checking. A row without columns has no blocks.
pub fn check_coverage(entries: &[IndexInfo], column_region_len: u64) -> Result<()> {
    let covered = match entries.last() {
        Some(last) => last.end()?,
        None => 0,
    };
    if covered != column_region_len {
        return Err(AtlasError::integrity(format!(
            "column index covers {} bytes, column region holds {}",
            covered, column_region_len
        )));
    }
    Ok(())
}

fn check_entry(
    info: &IndexInfo,
    previous: Option<&IndexInfo>,
    comparator: &dyn Comparator,
) -> Result<()> {
    if info.first_name.is_empty() || info.last_name.is_empty() {
        return Err(AtlasError::integrity("column index entry with empty name"));
    }
    if comparator.compare(&info.first_name, &info.last_name) == Ordering::Greater {
        return Err(AtlasError::integrity(format!(
            "column index block at {} starts after it ends",
            info.offset
        )));
    }

    info.end()?;
    let expected_offset = previous.map(IndexInfo::end).transpose()?.unwrap_or(0);
    if info.offset != expected_offset {
        return Err(AtlasError::integrity(format!(
            "column index block at {} is not contiguous (expected {})",
            info.offset, expected_offset
        )));
    }

    if let Some(prev) = previous {
        if comparator.compare(&prev.last_name, &info.first_name) != Ordering::Less {
            return Err(AtlasError::integrity(format!(
                "column index blocks at {} and {} are out of order",
                prev.offset, info.offset
            )));
        }
    }
    Ok(())
}

// =============================================================================
// Column Indexer (writer side)
// =============================================================================

/// Groups serialized columns into index blocks of roughly `block_size` bytes
pub struct ColumnIndexer {
    block_size: u64,
    entries: Vec<IndexInfo>,
    /// (first name, start offset) of the block being filled
    open: Option<(Bytes, u64)>,
    last_name: Bytes,
    position: u64,
}

impl ColumnIndexer {
    pub fn new(block_size: usize) -> Self {
        Self {
            block_size: block_size.max(1) as u64,
            entries: Vec::new(),
            open: None,
            last_name: Bytes::new(),
            position: 0,
        }
    }

    /// Account for the next column written, in comparator order
    pub fn add(&mut self, column: &Column) {
        let name = Bytes::copy_from_slice(column.name());
        let position = self.position;
        let start = self.open.get_or_insert_with(|| (name.clone(), position)).1;

        self.position += column.serialized_size();
        self.last_name = name;

        if self.position - start >= self.block_size {
            self.close_block();
        }
    }

    fn close_block(&mut self) {
        if let Some((first_name, start)) = self.open.take() {
            self.entries.push(IndexInfo {
                first_name,
                last_name: self.last_name.clone(),
                offset: start,
                width: self.position - start,
            });
        }
    }

    pub fn finish(mut self) -> Vec<IndexInfo> {
        self.close_block();
        self.entries
    }
}
