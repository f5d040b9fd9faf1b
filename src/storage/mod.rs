//! Storage Module
//!
//! On-disk layout of rows and SSTable files.
//!
//! ## Responsibilities
//! - Resolve a decorated row key to its file offset (`RowLocator`)
//! - Sparse per-row column index and block resolution (`index`)
//! - SSTable container: header, rows, key index, footer (`sstable`)
//!
//! ## Row Layout
//! ```text
//! ┌────────────────────────────────────────┐
//! │ Decorated Key (u16 + UTF-8)            │
//! │ Row Data Size (u32)                    │
//! ├────────────────────────────────────────┤
//! │ Bloom Filter over column names         │
//! │ Sparse Column Index                    │
//! │ Column Family Header                   │
//! │ Column Count (u32)                     │
//! ├────────────────────────────────────────┤
//! │ Column blocks, back to back            │
//! │ ┌──────────┬──────────┬─────────────┐  │
//! │ │ Block 0  │ Block 1  │    ...      │  │
//! │ └──────────┴──────────┴─────────────┘  │
//! └────────────────────────────────────────┘
//! ```

pub mod index;
mod sstable;

use std::collections::{BTreeMap, HashMap};

pub use index::IndexInfo;
pub use sstable::{RowSerializer, SSTable, SSTableBuilder, SSTableReader};

/// Maps a decorated row key to the file offset where its row starts
pub trait RowLocator {
    fn locate(&self, decorated_key: &str) -> Option<u64>;
}

impl RowLocator for BTreeMap<String, u64> {
    fn locate(&self, decorated_key: &str) -> Option<u64> {
        self.get(decorated_key).copied()
    }
}

impl RowLocator for HashMap<String, u64> {
    fn locate(&self, decorated_key: &str) -> Option<u64> {
        self.get(decorated_key).copied()
    }
}
