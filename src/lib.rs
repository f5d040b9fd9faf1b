//! # AtlasTable
//!
//! Selective column retrieval from SSTable rows:
//! - Per-row bloom filter over column names, consulted before any seek
//! - Sparse column index pruning which byte ranges of a row are read
//! - Partial deserialization with exact matching against the request
//! - Explicit comparators, no global schema state
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 NamesQuery (key, cf, names)                 │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                  RowLocator (key → offset)                  │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ seek
//!          ┌────────────┴────────────┐
//!          ▼                         ▼
//!   ┌─────────────┐          ┌──────────────┐
//!   │ BloomFilter │ ───────▶ │ Column Index │
//!   │  (names)    │ survivors│  (blocks)    │
//!   └─────────────┘          └──────┬───────┘
//!                                   │ seek per block
//!                                   ▼
//!                           ┌───────────────┐
//!                           │ ColumnFamily  │
//!                           │ (exact match) │
//!                           └───────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod io;
pub mod db;
pub mod filter;
pub mod storage;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{AtlasError, Result};
pub use config::Config;
pub use db::{Column, ColumnFamily, Comparator};
pub use filter::{retrieve, NamesLookup, NamesQuery};
pub use storage::{RowLocator, SSTable, SSTableBuilder, SSTableReader};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of AtlasTable
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
