//! Column
//!
//! A single named value inside a column family, and its on-disk codec.
//!
//! ## On-disk Format
//! ```text
//! ┌──────────────┬──────────┬───────────────┬─────────────────┐
//! │ Name (u16+N) │ Flags(1) │ Timestamp (8) │ Value (u32+N)   │
//! └──────────────┴──────────┴───────────────┴─────────────────┘
//! ```
//! Flags bit 0 marks a tombstone; the other bits must be zero.

use bytes::{BufMut, Bytes};

use crate::error::{AtlasError, Result};
use crate::io::{put_long_bytes, put_short_bytes, FileReader};

const DELETION_FLAG: u8 = 0x01;
const KNOWN_FLAGS: u8 = DELETION_FLAG;

/// A column as stored in a row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    name: Bytes,
    value: Bytes,
    timestamp: i64,
    deleted: bool,
}

impl Column {
    pub fn new(name: impl Into<Bytes>, value: impl Into<Bytes>, timestamp: i64) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            timestamp,
            deleted: false,
        }
    }

    /// A tombstone; `local_deletion_time` becomes the value payload
    pub fn tombstone(name: impl Into<Bytes>, local_deletion_time: i32, timestamp: i64) -> Self {
        Self {
            name: name.into(),
            value: Bytes::copy_from_slice(&local_deletion_time.to_be_bytes()),
            timestamp,
            deleted: true,
        }
    }

    pub fn name(&self) -> &[u8] {
        &self.name
    }

    pub fn value(&self) -> &[u8] {
        &self.value
    }

    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn is_marked_for_delete(&self) -> bool {
        self.deleted
    }

    /// Bytes this column occupies on disk
    pub fn serialized_size(&self) -> u64 {
        (2 + self.name.len() + 1 + 8 + 4 + self.value.len()) as u64
    }

    /// Decide which of two versions of the same column survives: the newer
    /// timestamp, then the tombstone, then the larger value.
    pub fn supersedes(&self, other: &Column) -> bool {
        match self.timestamp.cmp(&other.timestamp) {
            std::cmp::Ordering::Greater => true,
            std::cmp::Ordering::Less => false,
            std::cmp::Ordering::Equal => {
                if self.deleted != other.deleted {
                    self.deleted
                } else {
                    self.value > other.value
                }
            }
        }
    }
}

/// Codec for a single column
pub struct ColumnSerializer;

impl ColumnSerializer {
    pub fn serialize(column: &Column, buf: &mut Vec<u8>) -> Result<()> {
        put_short_bytes(buf, &column.name)?;
        buf.put_u8(if column.deleted { DELETION_FLAG } else { 0 });
        buf.put_i64(column.timestamp);
        put_long_bytes(buf, &column.value)
    }

    /// Read exactly one column starting at the reader's current position
    pub fn deserialize<R: FileReader + ?Sized>(reader: &mut R) -> Result<Column> {
        let name = reader.read_short_bytes()?;
        if name.is_empty() {
            return Err(AtlasError::integrity("column with empty name"));
        }

        let flags = reader.read_u8()?;
        if flags & !KNOWN_FLAGS != 0 {
            return Err(AtlasError::integrity(format!(
                "unknown column flags {:#04x}",
                flags
            )));
        }

        let timestamp = reader.read_i64()?;
        let value = reader.read_long_bytes()?;

        Ok(Column {
            name: Bytes::from(name),
            value: Bytes::from(value),
            timestamp,
            deleted: flags & DELETION_FLAG != 0,
        })
    }
}
