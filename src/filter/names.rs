//! Named-column retrieval
//!
//! Reads a requested set of columns out of one row without deserializing
//! the whole row:
//!
//! 1. locate the row and check the key stored there
//! 2. drop requested names the row's bloom filter rules out
//! 3. map the survivors onto sparse-index blocks
//! 4. seek to each block once and keep exactly the requested columns
//!
//! The bloom filter and the index only prune work. Every column read is
//! matched against the full requested set, so false positives cost I/O but
//! never change the result.

use std::cmp::Ordering;
use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, trace};

use crate::db::{Column, ColumnFamily, ColumnFamilySerializer, ColumnSerializer, Comparator};
use crate::error::{AtlasError, Result};
use crate::io::FileReader;
use crate::storage::index::{check_coverage, deserialize_index, select_blocks};
use crate::storage::RowLocator;

use super::BloomFilter;

// =============================================================================
// Query
// =============================================================================

/// One named-column read: row key, column family and the wanted names
#[derive(Debug, Clone)]
pub struct NamesQuery {
    key: String,
    cf_name: String,
    comparator: Arc<dyn Comparator>,
    /// Sorted by `comparator`, no duplicates
    names: Vec<Bytes>,
}

impl NamesQuery {
    /// `key` must already be decorated. Names are sorted and de-duplicated
    /// with `comparator`; empty or comparator-invalid names are rejected.
    pub fn new<I, N>(
        key: impl Into<String>,
        cf_name: impl Into<String>,
        comparator: Arc<dyn Comparator>,
        names: I,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = N>,
        N: Into<Bytes>,
    {
        let mut names: Vec<Bytes> = names.into_iter().map(Into::into).collect();
        for name in &names {
            if name.is_empty() {
                return Err(AtlasError::Serialization(
                    "requested column name is empty".to_string(),
                ));
            }
            comparator.validate(name)?;
        }

        names.sort_by(|a, b| comparator.compare(a, b));
        names.dedup_by(|a, b| comparator.compare(a, b) == Ordering::Equal);

        Ok(Self {
            key: key.into(),
            cf_name: cf_name.into(),
            comparator,
            names,
        })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn cf_name(&self) -> &str {
        &self.cf_name
    }

    pub fn comparator(&self) -> &Arc<dyn Comparator> {
        &self.comparator
    }

    /// Requested names in comparator order
    pub fn names(&self) -> &[Bytes] {
        &self.names
    }

    pub fn contains(&self, name: &[u8]) -> bool {
        self.names
            .binary_search_by(|n| self.comparator.compare(n, name))
            .is_ok()
    }
}

// =============================================================================
// Result
// =============================================================================

/// Outcome of a named-column read
///
/// Corruption is never one of these: it surfaces as `Err`.
#[derive(Debug, Clone, PartialEq)]
pub enum NamesLookup {
    /// The table holds no row for the key
    RowNotFound,
    /// The row exists but none of the requested columns can be in it
    NoMatch,
    /// The row's column family holding the requested columns that exist
    Found(ColumnFamily),
}

impl NamesLookup {
    pub fn is_found(&self) -> bool {
        matches!(self, NamesLookup::Found(_))
    }

    pub fn column_family(&self) -> Option<&ColumnFamily> {
        match self {
            NamesLookup::Found(cf) => Some(cf),
            _ => None,
        }
    }

    pub fn into_column_family(self) -> Option<ColumnFamily> {
        match self {
            NamesLookup::Found(cf) => Some(cf),
            _ => None,
        }
    }

    /// Matched columns in comparator order
    ///
    /// Each call starts a new pass; the result itself is never consumed.
    pub fn columns(&self) -> std::slice::Iter<'_, Column> {
        match self {
            NamesLookup::Found(cf) => cf.sorted_columns(),
            _ => <&[Column]>::default().iter(),
        }
    }
}

// =============================================================================
// Retrieval
// =============================================================================

/// Read the columns named by `query` from the row `locator` points at
///
/// `reader` is consumed: the underlying handle is closed when this returns,
/// whatever the outcome. On error nothing read so far is returned.
pub fn retrieve<R, L>(mut reader: R, locator: &L, query: &NamesQuery) -> Result<NamesLookup>
where
    R: FileReader,
    L: RowLocator + ?Sized,
{
    let key = query.key();
    let comparator = query.comparator();

    let row_start = match locator.locate(key) {
        Some(position) => position,
        None => {
            debug!(key = %key, "row not found");
            return Ok(NamesLookup::RowNotFound);
        }
    };

    reader.seek(row_start)?;
    let key_on_disk = reader.read_utf()?;
    if key_on_disk != key {
        return Err(AtlasError::integrity(format!(
            "row at offset {} has key {:?}, expected {:?}",
            row_start, key_on_disk, key
        )));
    }
    let row_size = reader.read_u32()? as u64;
    let row_end = reader
        .position()?
        .checked_add(row_size)
        .ok_or_else(|| {
            AtlasError::integrity(format!("row {:?} has impossible size {}", key, row_size))
        })?;

    if query.names().is_empty() {
        return Ok(NamesLookup::NoMatch);
    }

    let bloom = BloomFilter::deserialize(&mut reader)?;
    let candidates: Vec<&Bytes> = query
        .names()
        .iter()
        .filter(|name| bloom.is_present(name))
        .collect();
    if candidates.is_empty() {
        debug!(key = %key, requested = query.names().len(), "bloom filter excluded every column");
        return Ok(NamesLookup::NoMatch);
    }

    let index = deserialize_index(&mut reader, comparator.as_ref())?;

    let mut cf = ColumnFamilySerializer::deserialize_empty(&mut reader, Arc::clone(comparator))?;
    if cf.name() != query.cf_name() {
        return Err(AtlasError::integrity(format!(
            "row {:?} holds column family {:?}, expected {:?}",
            key,
            cf.name(),
            query.cf_name()
        )));
    }
    let _column_count = reader.read_u32()?;

    let columns_base = reader.position()?;
    let column_region_len = row_end.checked_sub(columns_base).ok_or_else(|| {
        AtlasError::integrity(format!(
            "row {:?} ends at {} inside its own header",
            key, row_end
        ))
    })?;
    check_coverage(&index, column_region_len)?;

    let blocks = select_blocks(candidates.iter().copied(), &index, comparator.as_ref());
    if blocks.is_empty() {
        debug!(key = %key, candidates = candidates.len(), "no index block can hold the requested columns");
        return Ok(NamesLookup::NoMatch);
    }

    let mut columns_read = 0usize;

    for block in &blocks {
        let block_start = columns_base.checked_add(block.offset);
        let block_end = block.end().ok().and_then(|end| columns_base.checked_add(end));
        let (block_start, block_end) = match (block_start, block_end) {
            (Some(start), Some(end)) if end <= row_end => (start, end),
            _ => {
                return Err(AtlasError::integrity(format!(
                    "index block at {} (+{}) extends past end of row {:?}",
                    block.offset, block.width, key
                )))
            }
        };

        trace!(key = %key, offset = block.offset, width = block.width, "reading column block");
        reader.seek(block_start)?;

        while reader.position()? < block_end {
            let column = ColumnSerializer::deserialize(&mut reader)?;
            if reader.position()? > block_end {
                return Err(AtlasError::integrity(format!(
                    "column {} overruns index block at {}",
                    comparator.get_string(column.name()),
                    block.offset
                )));
            }
            columns_read += 1;

            // match against the full request, not the bloom survivors
            if query.contains(column.name()) {
                cf.add_column(column);
            }
        }
    }

    debug!(
        key = %key,
        blocks = blocks.len(),
        columns_read,
        columns_kept = cf.column_count(),
        "named columns read"
    );

    Ok(NamesLookup::Found(cf))
}
