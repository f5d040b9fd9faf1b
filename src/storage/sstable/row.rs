//! Row serialization
//!
//! Lays out one row exactly as the named-column reader expects it:
//!
//! ```text
//! ┌───────────────┬──────────────┬───────────┬──────────────┬───────────┬──────────┬──────────┐
//! │ Key (u16+N)   │ RowSize (u32)│ Bloom     │ Column Index │ CF Header │ Count u32│ Columns  │
//! └───────────────┴──────────────┴───────────┴──────────────┴───────────┴──────────┴──────────┘
//! ```
//! RowSize counts every byte after itself.

use bytes::BufMut;

use crate::db::{ColumnFamily, ColumnFamilySerializer, ColumnSerializer};
use crate::error::{AtlasError, Result};
use crate::filter::BloomFilter;
use crate::io::put_utf;
use crate::storage::index::{serialize_index, ColumnIndexer};

/// Serializes rows with a fixed index block size and bloom filter sizing
#[derive(Debug, Clone, Copy)]
pub struct RowSerializer {
    column_index_size: usize,
    bloom_false_positive_rate: f64,
}

impl RowSerializer {
    pub fn new(column_index_size: usize, bloom_false_positive_rate: f64) -> Self {
        Self {
            column_index_size,
            bloom_false_positive_rate,
        }
    }

    /// Serialize `cf` as the row `decorated_key`, building its bloom filter
    pub fn serialize(&self, decorated_key: &str, cf: &ColumnFamily, buf: &mut Vec<u8>) -> Result<()> {
        let mut filter = BloomFilter::new(cf.column_count(), self.bloom_false_positive_rate);
        for name in cf.column_names() {
            filter.add(name);
        }
        self.serialize_with_filter(decorated_key, cf, &filter, buf)
    }

    /// Serialize `cf` with a caller-supplied bloom filter
    ///
    /// The filter must contain every column name of `cf`; extra names are
    /// allowed and behave like false positives on read.
    pub fn serialize_with_filter(
        &self,
        decorated_key: &str,
        cf: &ColumnFamily,
        filter: &BloomFilter,
        buf: &mut Vec<u8>,
    ) -> Result<()> {
        if let Some(missing) = cf.column_names().find(|name| !filter.is_present(name)) {
            return Err(AtlasError::Storage(format!(
                "bloom filter is missing column {}",
                cf.comparator().get_string(missing)
            )));
        }

        let mut columns = Vec::new();
        let mut indexer = ColumnIndexer::new(self.column_index_size);
        for column in cf.sorted_columns() {
            indexer.add(column);
            ColumnSerializer::serialize(column, &mut columns)?;
        }

        let mut body = Vec::with_capacity(filter.serialized_size() as usize + columns.len() + 64);
        filter.serialize(&mut body);
        serialize_index(&indexer.finish(), &mut body)?;
        ColumnFamilySerializer::serialize_header(cf, &mut body)?;
        body.put_u32(cf.column_count() as u32);
        body.extend_from_slice(&columns);

        let row_size = u32::try_from(body.len())
            .map_err(|_| AtlasError::Storage(format!("row too large: {} bytes", body.len())))?;

        put_utf(buf, decorated_key)?;
        buf.put_u32(row_size);
        buf.extend_from_slice(&body);
        Ok(())
    }
}
