//! Schema registry
//!
//! Resolves `(table, column family)` to the comparator that orders the
//! family's column names. Built once from configuration and shared read-only
//! by every reader; registration stays possible for tools that learn
//! families at runtime.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::config::Config;
use crate::error::{AtlasError, Result};

use super::marshal::{Comparator, ComparatorType};

/// Comparator provider keyed by table and column family name
#[derive(Default)]
pub struct SchemaRegistry {
    comparators: RwLock<HashMap<(String, String), Arc<dyn Comparator>>>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every column family declared in `config`
    pub fn from_config(config: &Config) -> Self {
        let registry = Self::new();
        for (table, families) in &config.tables {
            for (cf, ty) in families {
                registry.register(table, cf, ty.build());
            }
        }
        registry
    }

    /// Add or replace the comparator for a column family
    pub fn register(&self, table: &str, cf: &str, comparator: Arc<dyn Comparator>) {
        self.comparators
            .write()
            .insert((table.to_string(), cf.to_string()), comparator);
    }

    pub fn register_type(&self, table: &str, cf: &str, ty: ComparatorType) {
        self.register(table, cf, ty.build());
    }

    pub fn comparator_for(&self, table: &str, cf: &str) -> Result<Arc<dyn Comparator>> {
        self.comparators
            .read()
            .get(&(table.to_string(), cf.to_string()))
            .cloned()
            .ok_or_else(|| AtlasError::UnknownColumnFamily {
                table: table.to_string(),
                cf: cf.to_string(),
            })
    }

    pub fn len(&self) -> usize {
        self.comparators.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Table name encoded in an SSTable file name
///
/// "Keyspace1-Standard1-42-Data.db" → Some("Keyspace1")
pub fn table_name_from_path(path: &Path) -> Option<String> {
    let name = path.file_name()?.to_string_lossy();
    let stem = name.strip_suffix("-Data.db")?;
    let mut parts = stem.splitn(3, '-');
    let table = parts.next()?;
    // cf and generation must both be present
    parts.next()?;
    parts.next()?.parse::<u64>().ok()?;
    Some(table.to_string())
}
