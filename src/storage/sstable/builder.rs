//! SSTable Builder
//!
//! Writes rows, in ascending decorated-key order, to a new SSTable file.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use bytes::BufMut;
use tracing::debug;

use crate::config::Config;
use crate::db::{ColumnFamily, Partitioner};
use crate::error::Result;
use crate::io::put_utf;
use crate::AtlasError;

use super::{RowSerializer, SSTable, HEADER_SIZE, MAGIC, VERSION};

/// Builder for creating new SSTables from sorted rows
pub struct SSTableBuilder {
    /// Output file path
    path: PathBuf,
    /// Buffered writer for performance
    writer: BufWriter<File>,
    /// Number of rows written
    row_count: u64,
    /// Current write position (for the key index)
    current_offset: u64,
    /// Key index: decorated key → file offset of row
    index: Vec<(String, u64)>,
    /// Reused row buffer
    row_buf: Vec<u8>,
    rows: RowSerializer,
    partitioner: Box<dyn Partitioner>,
    /// Running CRC hasher for the row section
    data_hasher: crc32fast::Hasher,
}

impl SSTableBuilder {
    /// Create a new SSTable builder
    ///
    /// Writes the header immediately; call `add_row()` in decorated-key
    /// order, then `finish()` to write the key index and footer.
    pub fn new(path: &Path, config: &Config) -> Result<Self> {
        config.validate()?;

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;

        let mut writer = BufWriter::new(file);

        // row_count placeholder, patched in finish()
        writer.write_all(MAGIC)?;
        writer.write_all(&VERSION.to_be_bytes())?;
        writer.write_all(&0u64.to_be_bytes())?;

        Ok(Self {
            path: path.to_path_buf(),
            writer,
            row_count: 0,
            current_offset: HEADER_SIZE,
            index: Vec::new(),
            row_buf: Vec::new(),
            rows: RowSerializer::new(config.column_index_size, config.bloom_false_positive_rate),
            partitioner: config.partitioner.build(),
            data_hasher: crc32fast::Hasher::new(),
        })
    }

    /// Decorated form of `key` under this builder's partitioner
    pub fn decorate_key(&self, key: &str) -> String {
        self.partitioner.decorate_key(key)
    }

    /// Append a row; its decorated key must sort after the previous row's
    pub fn add_row(&mut self, key: &str, cf: &ColumnFamily) -> Result<()> {
        let decorated = self.decorate_key(key);

        if let Some((last, _)) = self.index.last() {
            if decorated.as_str() <= last.as_str() {
                return Err(AtlasError::Storage(format!(
                    "rows must be added in ascending key order: {:?} after {:?}",
                    decorated, last
                )));
            }
        }

        self.row_buf.clear();
        self.rows.serialize(&decorated, cf, &mut self.row_buf)?;

        self.writer.write_all(&self.row_buf)?;
        self.data_hasher.update(&self.row_buf);

        self.index.push((decorated, self.current_offset));
        self.current_offset += self.row_buf.len() as u64;
        self.row_count += 1;

        Ok(())
    }

    /// Finish building: write key index, footer, and return metadata
    pub fn finish(mut self) -> Result<SSTable> {
        let index_offset = self.current_offset;

        let mut index_block = Vec::new();
        for (key, offset) in &self.index {
            put_utf(&mut index_block, key)?;
            index_block.put_u64(*offset);
        }
        self.writer.write_all(&index_block)?;

        // Footer: index_offset (8) + data_crc (4) + padding (4)
        let data_crc = self.data_hasher.finalize();
        self.writer.write_all(&index_offset.to_be_bytes())?;
        self.writer.write_all(&data_crc.to_be_bytes())?;
        self.writer.write_all(&[0u8; 4])?;

        self.writer.flush()?;

        // Seek back and update row count in header
        let mut file = self.writer.into_inner().map_err(|e| {
            AtlasError::Storage(format!("Failed to flush SSTable: {}", e))
        })?;
        file.seek(SeekFrom::Start(6))?; // After magic + version
        file.write_all(&self.row_count.to_be_bytes())?;
        file.sync_all()?;

        let file_size = file.metadata()?.len();

        debug!(
            path = %self.path.display(),
            rows = self.row_count,
            bytes = file_size,
            "SSTable written"
        );

        let mut keys = self.index.into_iter().map(|(key, _)| key);
        let first_key = keys.next().unwrap_or_default();
        let last_key = keys.last().unwrap_or_else(|| first_key.clone());

        Ok(SSTable {
            path: self.path,
            row_count: self.row_count,
            first_key,
            last_key,
            file_size,
        })
    }
}

impl SSTable {
    /// Write `rows` to `path`, sorting them by decorated key first
    pub fn write<I, K>(path: &Path, config: &Config, rows: I) -> Result<SSTable>
    where
        I: IntoIterator<Item = (K, ColumnFamily)>,
        K: Into<String>,
    {
        let mut builder = SSTableBuilder::new(path, config)?;

        let mut decorated: Vec<(String, String, ColumnFamily)> = rows
            .into_iter()
            .map(|(key, cf)| {
                let key = key.into();
                (builder.decorate_key(&key), key, cf)
            })
            .collect();
        decorated.sort_by(|a, b| a.0.cmp(&b.0));

        for (_, key, cf) in &decorated {
            builder.add_row(key, cf)?;
        }
        builder.finish()
    }
}
