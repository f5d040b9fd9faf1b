//! Partitioners
//!
//! Turn a client row key into the decorated key rows are sorted and located
//! by on disk.

use serde::Deserialize;

/// Maps a row key to its on-disk lookup key
pub trait Partitioner: Send + Sync {
    fn decorate_key(&self, key: &str) -> String;

    /// Recover the client key from a decorated key
    fn undecorate_key<'a>(&self, decorated: &'a str) -> &'a str;
}

/// Rows sorted by the raw key
#[derive(Debug, Default, Clone, Copy)]
pub struct OrderPreservingPartitioner;

impl Partitioner for OrderPreservingPartitioner {
    fn decorate_key(&self, key: &str) -> String {
        key.to_string()
    }

    fn undecorate_key<'a>(&self, decorated: &'a str) -> &'a str {
        decorated
    }
}

/// Rows sorted by a CRC32 token of the key: `"<token as 8 hex digits>:<key>"`
#[derive(Debug, Default, Clone, Copy)]
pub struct HashPartitioner;

impl HashPartitioner {
    const DELIMITER: char = ':';

    pub fn token(key: &str) -> u32 {
        crc32fast::hash(key.as_bytes())
    }
}

impl Partitioner for HashPartitioner {
    fn decorate_key(&self, key: &str) -> String {
        format!("{:08x}{}{}", Self::token(key), Self::DELIMITER, key)
    }

    fn undecorate_key<'a>(&self, decorated: &'a str) -> &'a str {
        decorated
            .split_once(Self::DELIMITER)
            .map(|(_, key)| key)
            .unwrap_or(decorated)
    }
}

/// Partitioner selection for configuration files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum PartitionerType {
    #[default]
    OrderPreserving,
    Hash,
}

impl PartitionerType {
    pub fn build(self) -> Box<dyn Partitioner> {
        match self {
            PartitionerType::OrderPreserving => Box::new(OrderPreservingPartitioner),
            PartitionerType::Hash => Box::new(HashPartitioner),
        }
    }
}
