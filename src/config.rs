//! Configuration for AtlasTable
//!
//! Centralized configuration with sensible defaults. Can be loaded from a
//! TOML file:
//!
//! ```toml
//! column_index_size = 65536
//! bloom_false_positive_rate = 0.01
//! partitioner = "Hash"
//!
//! [tables.Keyspace1]
//! Standard1 = "UTF8Type"
//! StandardByLong = "LongType"
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use crate::db::{ComparatorType, PartitionerType};
use crate::error::{AtlasError, Result};

/// Main configuration for an AtlasTable reader/writer
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Row Layout (writer)
    // -------------------------------------------------------------------------
    /// Target size of one sparse-index block, in serialized column bytes
    pub column_index_size: usize,

    /// False positive rate the per-row column bloom filters are sized for
    pub bloom_false_positive_rate: f64,

    // -------------------------------------------------------------------------
    // Read Path
    // -------------------------------------------------------------------------
    /// Buffer size of each file handle opened for a retrieval (bytes)
    pub read_buffer_size: usize,

    // -------------------------------------------------------------------------
    // Schema
    // -------------------------------------------------------------------------
    /// How row keys are decorated
    pub partitioner: PartitionerType,

    /// table → column family → comparator
    pub tables: BTreeMap<String, BTreeMap<String, ComparatorType>>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            column_index_size: 64 * 1024, // 64 KB
            bloom_false_positive_rate: 0.01,
            read_buffer_size: 64 * 1024,
            partitioner: PartitionerType::OrderPreserving,
            tables: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Load and validate a TOML configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&text)
            .map_err(|e| AtlasError::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.column_index_size == 0 {
            return Err(AtlasError::Config(
                "column_index_size must be greater than zero".to_string(),
            ));
        }
        if self.read_buffer_size == 0 {
            return Err(AtlasError::Config(
                "read_buffer_size must be greater than zero".to_string(),
            ));
        }
        let rate = self.bloom_false_positive_rate;
        if !(rate > 0.0 && rate < 1.0) {
            return Err(AtlasError::Config(format!(
                "bloom_false_positive_rate must be in (0, 1), got {}",
                rate
            )));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the sparse index block size (in bytes)
    pub fn column_index_size(mut self, size: usize) -> Self {
        self.config.column_index_size = size;
        self
    }

    /// Set the bloom filter false positive rate
    pub fn bloom_false_positive_rate(mut self, rate: f64) -> Self {
        self.config.bloom_false_positive_rate = rate;
        self
    }

    /// Set the read buffer size (in bytes)
    pub fn read_buffer_size(mut self, size: usize) -> Self {
        self.config.read_buffer_size = size;
        self
    }

    pub fn partitioner(mut self, partitioner: PartitionerType) -> Self {
        self.config.partitioner = partitioner;
        self
    }

    /// Declare a column family and its comparator
    pub fn column_family(
        mut self,
        table: impl Into<String>,
        cf: impl Into<String>,
        comparator: ComparatorType,
    ) -> Self {
        self.config
            .tables
            .entry(table.into())
            .or_default()
            .insert(cf.into(), comparator);
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
