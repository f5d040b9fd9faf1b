//! DB Module
//!
//! Row-level data model shared by the reader and the writer.
//!
//! ## Responsibilities
//! - `Column` and its on-disk codec
//! - `ColumnFamily`: comparator-ordered container + header codec
//! - Comparators (`marshal`) and their `(table, cf)` registry (`schema`)
//! - Key decoration (`partitioner`)

mod column;
mod column_family;
pub mod marshal;
pub mod partitioner;
pub mod schema;

pub use column::{Column, ColumnSerializer};
pub use column_family::{ColumnFamily, ColumnFamilySerializer};
pub use marshal::{AsciiType, BytesType, Comparator, ComparatorType, LongType, UTF8Type};
pub use partitioner::{HashPartitioner, OrderPreservingPartitioner, Partitioner, PartitionerType};
pub use schema::SchemaRegistry;
