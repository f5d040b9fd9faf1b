//! Column family container
//!
//! Row-scoped, comparator-ordered set of columns plus the family's deletion
//! header.
//!
//! ## On-disk Header ("shell")
//! ```text
//! ┌──────────────────┬──────────────────────────┬──────────────────────────┐
//! │ CF name (u16+N)  │ LocalDeletionTime (i32)  │ MarkedForDeleteAt (i64)  │
//! └──────────────────┴──────────────────────────┴──────────────────────────┘
//! ```

use std::sync::Arc;

use bytes::BufMut;

use crate::error::Result;
use crate::io::{put_utf, FileReader};

use super::column::Column;
use super::marshal::Comparator;

/// Live marker for a column family that was never deleted
pub const LIVE_DELETION_TIME: i32 = i32::MIN;
pub const LIVE_DELETE_AT: i64 = i64::MIN;

/// Columns of one column family within one row, ordered by `comparator`
#[derive(Debug, Clone)]
pub struct ColumnFamily {
    name: String,
    comparator: Arc<dyn Comparator>,
    local_deletion_time: i32,
    marked_for_delete_at: i64,
    /// Sorted by `comparator`, names unique
    columns: Vec<Column>,
}

impl ColumnFamily {
    /// Empty, live column family
    pub fn new(name: impl Into<String>, comparator: Arc<dyn Comparator>) -> Self {
        Self {
            name: name.into(),
            comparator,
            local_deletion_time: LIVE_DELETION_TIME,
            marked_for_delete_at: LIVE_DELETE_AT,
            columns: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn comparator(&self) -> &Arc<dyn Comparator> {
        &self.comparator
    }

    pub fn delete(&mut self, local_deletion_time: i32, timestamp: i64) {
        self.local_deletion_time = local_deletion_time;
        self.marked_for_delete_at = timestamp;
    }

    pub fn is_marked_for_delete(&self) -> bool {
        self.marked_for_delete_at > LIVE_DELETE_AT
    }

    pub fn local_deletion_time(&self) -> i32 {
        self.local_deletion_time
    }

    pub fn marked_for_delete_at(&self) -> i64 {
        self.marked_for_delete_at
    }

    fn search(&self, name: &[u8]) -> std::result::Result<usize, usize> {
        self.columns
            .binary_search_by(|c| self.comparator.compare(c.name(), name))
    }

    /// Insert a column; an existing column with the same name is replaced
    /// only if the new one supersedes it.
    pub fn add_column(&mut self, column: Column) {
        match self.search(column.name()) {
            Ok(idx) => {
                if column.supersedes(&self.columns[idx]) {
                    self.columns[idx] = column;
                }
            }
            Err(idx) => self.columns.insert(idx, column),
        }
    }

    pub fn get_column(&self, name: &[u8]) -> Option<&Column> {
        self.search(name).ok().map(|idx| &self.columns[idx])
    }

    /// Columns in comparator order; call again for a fresh pass
    pub fn sorted_columns(&self) -> std::slice::Iter<'_, Column> {
        self.columns.iter()
    }

    pub fn column_names(&self) -> impl Iterator<Item = &[u8]> + '_ {
        self.columns.iter().map(|c| c.name())
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl PartialEq for ColumnFamily {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.comparator.name() == other.comparator.name()
            && self.local_deletion_time == other.local_deletion_time
            && self.marked_for_delete_at == other.marked_for_delete_at
            && self.columns == other.columns
    }
}

impl<'a> IntoIterator for &'a ColumnFamily {
    type Item = &'a Column;
    type IntoIter = std::slice::Iter<'a, Column>;

    fn into_iter(self) -> Self::IntoIter {
        self.sorted_columns()
    }
}

/// Codec for the column family header
pub struct ColumnFamilySerializer;

impl ColumnFamilySerializer {
    /// Write the header only; columns are laid out separately by the writer
    pub fn serialize_header(cf: &ColumnFamily, buf: &mut Vec<u8>) -> Result<()> {
        put_utf(buf, &cf.name)?;
        buf.put_i32(cf.local_deletion_time);
        buf.put_i64(cf.marked_for_delete_at);
        Ok(())
    }

    /// Read the header and return an empty container ordered by `comparator`
    pub fn deserialize_empty<R: FileReader + ?Sized>(
        reader: &mut R,
        comparator: Arc<dyn Comparator>,
    ) -> Result<ColumnFamily> {
        let name = reader.read_utf()?;
        let local_deletion_time = reader.read_i32()?;
        let marked_for_delete_at = reader.read_i64()?;

        let mut cf = ColumnFamily::new(name, comparator);
        cf.delete(local_deletion_time, marked_for_delete_at);
        Ok(cf)
    }
}
