//! SSTable Module
//!
//! Sorted String Table - immutable on-disk file of rows sorted by decorated
//! key.
//!
//! ## File Format
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ Header (14 bytes)                                       │
//! │   Magic: "ATCF" (4) | Version: u16 (2) | Rows: u64 (8)  │
//! ├─────────────────────────────────────────────────────────┤
//! │ Rows (variable, see `row`)                              │
//! │   [Key][RowSize][Bloom][ColumnIndex][CF][Count][Cols]   │
//! │   ... repeated for each row, ascending decorated key ...│
//! ├─────────────────────────────────────────────────────────┤
//! │ Key Index (variable)                                    │
//! │   [KeyLen: u16][Key][Offset: u64]                       │
//! │   ... repeated for each row ...                         │
//! ├─────────────────────────────────────────────────────────┤
//! │ Footer (16 bytes)                                       │
//! │   IndexOffset: u64 (8) | DataCRC: u32 (4) | Padding (4) │
//! └─────────────────────────────────────────────────────────┘
//! ```
//! All integers are big-endian.

mod builder;
mod reader;
mod row;

use std::path::PathBuf;

pub use builder::SSTableBuilder;
pub use reader::SSTableReader;
pub use row::RowSerializer;

// =============================================================================
// Shared Constants (used by builder and reader)
// =============================================================================

/// Magic bytes identifying an AtlasTable SSTable file
pub(crate) const MAGIC: &[u8; 4] = b"ATCF";

/// Current SSTable format version
pub(crate) const VERSION: u16 = 1;

/// Header size: Magic (4) + Version (2) + RowCount (8) = 14 bytes
pub(crate) const HEADER_SIZE: u64 = 14;

/// Footer size: IndexOffset (8) + DataCRC (4) + Padding (4) = 16 bytes
pub(crate) const FOOTER_SIZE: u64 = 16;

// =============================================================================
// SSTable Metadata
// =============================================================================

/// Summary of a finished SSTable, returned by [`SSTableBuilder::finish`]
#[derive(Debug, Clone)]
pub struct SSTable {
    /// Path to the SSTable file
    pub path: PathBuf,
    /// Number of rows in this SSTable
    pub row_count: u64,
    /// Smallest decorated key
    pub first_key: String,
    /// Largest decorated key
    pub last_key: String,
    /// File size in bytes
    pub file_size: u64,
}

impl SSTable {
    pub fn row_count(&self) -> u64 {
        self.row_count
    }
}
