//! SSTable Reader
//!
//! Opens SSTable files, keeps the key index in memory and serves named-column
//! reads. Each read opens its own file handle, so one reader can be shared
//! by many threads.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use tracing::debug;

use crate::config::Config;
use crate::db::{Comparator, Partitioner};
use crate::error::Result;
use crate::filter::{retrieve, NamesLookup, NamesQuery};
use crate::io::BufferedFileReader;
use crate::storage::RowLocator;
use crate::AtlasError;

use super::{FOOTER_SIZE, HEADER_SIZE, MAGIC, VERSION};

/// Reader for SSTable files with an in-memory key index
pub struct SSTableReader {
    path: PathBuf,
    /// decorated key → file offset of the row
    index: BTreeMap<String, u64>,
    row_count: u64,
    /// Key index starting offset (end of row data)
    index_offset: u64,
    data_crc: u32,
    partitioner: Box<dyn Partitioner>,
    read_buffer_size: usize,
}

impl SSTableReader {
    /// Open an SSTable for reading
    ///
    /// Validates header and footer and loads the key index into memory.
    pub fn open(path: &Path, config: &Config) -> Result<Self> {
        let mut file = File::open(path)?;
        let file_size = file.metadata()?.len();

        if file_size < HEADER_SIZE + FOOTER_SIZE {
            return Err(AtlasError::Integrity(format!(
                "SSTable too small: {} bytes",
                file_size
            )));
        }

        // Read and validate header
        let mut header = [0u8; HEADER_SIZE as usize];
        file.read_exact(&mut header)?;

        if &header[0..4] != MAGIC {
            return Err(AtlasError::Integrity(format!(
                "Invalid SSTable magic: expected ATCF, got {:?}",
                &header[0..4]
            )));
        }

        let version = u16::from_be_bytes([header[4], header[5]]);
        if version != VERSION {
            return Err(AtlasError::Integrity(format!(
                "Unsupported SSTable version: {}",
                version
            )));
        }

        let mut count_bytes = [0u8; 8];
        count_bytes.copy_from_slice(&header[6..14]);
        let row_count = u64::from_be_bytes(count_bytes);

        // Read footer to get index offset
        file.seek(SeekFrom::End(-(FOOTER_SIZE as i64)))?;
        let mut footer = [0u8; FOOTER_SIZE as usize];
        file.read_exact(&mut footer)?;

        let mut offset_bytes = [0u8; 8];
        offset_bytes.copy_from_slice(&footer[0..8]);
        let index_offset = u64::from_be_bytes(offset_bytes);
        let data_crc = u32::from_be_bytes([footer[8], footer[9], footer[10], footer[11]]);

        if index_offset < HEADER_SIZE || index_offset > file_size - FOOTER_SIZE {
            return Err(AtlasError::Integrity(format!(
                "SSTable index offset {} outside file of {} bytes",
                index_offset, file_size
            )));
        }

        // Load key index: [key_len(2)][key][offset(8)]
        file.seek(SeekFrom::Start(index_offset))?;
        let index_block_size = file_size - FOOTER_SIZE - index_offset;
        let mut index_data = vec![0u8; index_block_size as usize];
        file.read_exact(&mut index_data)?;

        let index = Self::parse_key_index(&index_data, index_offset)?;
        if index.len() as u64 != row_count {
            return Err(AtlasError::Integrity(format!(
                "SSTable header claims {} rows, key index has {}",
                row_count,
                index.len()
            )));
        }

        debug!(path = %path.display(), rows = row_count, "SSTable opened");

        Ok(Self {
            path: path.to_path_buf(),
            index,
            row_count,
            index_offset,
            data_crc,
            partitioner: config.partitioner.build(),
            read_buffer_size: config.read_buffer_size,
        })
    }

    fn parse_key_index(data: &[u8], index_offset: u64) -> Result<BTreeMap<String, u64>> {
        let truncated = || AtlasError::Integrity("truncated SSTable key index".to_string());

        let mut index = BTreeMap::new();
        let mut pos = 0;
        while pos < data.len() {
            let len_bytes = data.get(pos..pos + 2).ok_or_else(truncated)?;
            let key_len = u16::from_be_bytes([len_bytes[0], len_bytes[1]]) as usize;
            pos += 2;

            let key_bytes = data.get(pos..pos + key_len).ok_or_else(truncated)?;
            let key = String::from_utf8(key_bytes.to_vec())
                .map_err(|e| AtlasError::Integrity(format!("non UTF-8 row key: {}", e)))?;
            pos += key_len;

            let offset_slice = data.get(pos..pos + 8).ok_or_else(truncated)?;
            let mut offset_bytes = [0u8; 8];
            offset_bytes.copy_from_slice(offset_slice);
            let offset = u64::from_be_bytes(offset_bytes);
            pos += 8;

            if offset < HEADER_SIZE || offset >= index_offset {
                return Err(AtlasError::Integrity(format!(
                    "row {:?} points outside the row section: {}",
                    key, offset
                )));
            }
            index.insert(key, offset);
        }
        Ok(index)
    }

    /// Read `names` of column family `cf_name` from the row `key`
    ///
    /// `key` is the client key; it is decorated with this table's
    /// partitioner before lookup.
    pub fn get_named_columns<I, N>(
        &self,
        key: &str,
        cf_name: &str,
        names: I,
        comparator: Arc<dyn Comparator>,
    ) -> Result<NamesLookup>
    where
        I: IntoIterator<Item = N>,
        N: Into<Bytes>,
    {
        let query = NamesQuery::new(self.decorate_key(key), cf_name, comparator, names)?;
        self.query(&query)
    }

    /// Run a prepared query against this table
    ///
    /// Opens a fresh file handle, released when the call returns.
    pub fn query(&self, query: &NamesQuery) -> Result<NamesLookup> {
        if !self.index.contains_key(query.key()) {
            // skip the open() for keys this table cannot hold
            return Ok(NamesLookup::RowNotFound);
        }
        let reader = BufferedFileReader::open(&self.path, self.read_buffer_size)?;
        retrieve(reader, self, query)
    }

    pub fn decorate_key(&self, key: &str) -> String {
        self.partitioner.decorate_key(key)
    }

    /// Client keys in on-disk order
    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.index
            .keys()
            .map(|decorated| self.partitioner.undecorate_key(decorated))
    }

    /// Recompute the row section checksum and compare it with the footer
    pub fn verify_checksum(&self) -> Result<()> {
        let mut file = BufReader::new(File::open(&self.path)?);
        file.seek(SeekFrom::Start(HEADER_SIZE))?;

        let mut hasher = crc32fast::Hasher::new();
        let mut remaining = self.index_offset - HEADER_SIZE;
        let mut buf = vec![0u8; 64 * 1024];
        while remaining > 0 {
            let chunk = remaining.min(buf.len() as u64) as usize;
            file.read_exact(&mut buf[..chunk])?;
            hasher.update(&buf[..chunk]);
            remaining -= chunk as u64;
        }

        let actual = hasher.finalize();
        if actual != self.data_crc {
            return Err(AtlasError::Integrity(format!(
                "SSTable data checksum mismatch: stored {:#010x}, computed {:#010x}",
                self.data_crc, actual
            )));
        }
        Ok(())
    }

    pub fn row_count(&self) -> u64 {
        self.row_count
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RowLocator for SSTableReader {
    fn locate(&self, decorated_key: &str) -> Option<u64> {
        self.index.get(decorated_key).copied()
    }
}
