//! Column name comparators
//!
//! Every column family orders its column names with one comparator. The
//! comparator is an input to every read; nothing here is global.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use serde::Deserialize;

use crate::error::{AtlasError, Result};

/// Total order over column-name byte sequences
pub trait Comparator: Send + Sync {
    fn compare(&self, a: &[u8], b: &[u8]) -> Ordering;

    /// Configuration name, e.g. `"UTF8Type"`
    fn name(&self) -> &'static str;

    /// Human readable rendering of a name (logs, CLI)
    fn get_string(&self, bytes: &[u8]) -> String;

    /// Reject names this comparator cannot order
    fn validate(&self, _bytes: &[u8]) -> Result<()> {
        Ok(())
    }
}

impl fmt::Debug for dyn Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// Built-in comparators
// =============================================================================

/// Unsigned lexicographic byte order
#[derive(Debug, Default, Clone, Copy)]
pub struct BytesType;

impl Comparator for BytesType {
    fn compare(&self, a: &[u8], b: &[u8]) -> Ordering {
        a.cmp(b)
    }

    fn name(&self) -> &'static str {
        "BytesType"
    }

    fn get_string(&self, bytes: &[u8]) -> String {
        bytes.iter().map(|b| format!("{:02x}", b)).collect()
    }
}

/// Lexicographic order over ASCII names
#[derive(Debug, Default, Clone, Copy)]
pub struct AsciiType;

impl Comparator for AsciiType {
    fn compare(&self, a: &[u8], b: &[u8]) -> Ordering {
        a.cmp(b)
    }

    fn name(&self) -> &'static str {
        "AsciiType"
    }

    fn get_string(&self, bytes: &[u8]) -> String {
        String::from_utf8_lossy(bytes).into_owned()
    }

    fn validate(&self, bytes: &[u8]) -> Result<()> {
        if bytes.is_ascii() {
            Ok(())
        } else {
            Err(AtlasError::Serialization(
                "column name is not valid ASCII".to_string(),
            ))
        }
    }
}

/// Lexicographic order over UTF-8 names
///
/// Byte order of UTF-8 equals code point order, so no decoding is needed to
/// compare.
#[derive(Debug, Default, Clone, Copy)]
pub struct UTF8Type;

impl Comparator for UTF8Type {
    fn compare(&self, a: &[u8], b: &[u8]) -> Ordering {
        a.cmp(b)
    }

    fn name(&self) -> &'static str {
        "UTF8Type"
    }

    fn get_string(&self, bytes: &[u8]) -> String {
        String::from_utf8_lossy(bytes).into_owned()
    }

    fn validate(&self, bytes: &[u8]) -> Result<()> {
        std::str::from_utf8(bytes)
            .map(|_| ())
            .map_err(|e| AtlasError::Serialization(format!("column name is not UTF-8: {}", e)))
    }
}

/// Signed 64-bit integers stored as 8 big-endian bytes
#[derive(Debug, Default, Clone, Copy)]
pub struct LongType;

impl LongType {
    fn decode(bytes: &[u8]) -> Option<i64> {
        <[u8; 8]>::try_from(bytes).ok().map(i64::from_be_bytes)
    }
}

impl Comparator for LongType {
    fn compare(&self, a: &[u8], b: &[u8]) -> Ordering {
        match (Self::decode(a), Self::decode(b)) {
            (Some(x), Some(y)) => x.cmp(&y),
            // malformed names sort after well-formed ones, bytewise among themselves
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => a.cmp(b),
        }
    }

    fn name(&self) -> &'static str {
        "LongType"
    }

    fn get_string(&self, bytes: &[u8]) -> String {
        match Self::decode(bytes) {
            Some(v) => v.to_string(),
            None => format!("<invalid long: {} bytes>", bytes.len()),
        }
    }

    fn validate(&self, bytes: &[u8]) -> Result<()> {
        if bytes.len() == 8 {
            Ok(())
        } else {
            Err(AtlasError::Serialization(format!(
                "LongType name must be 8 bytes, got {}",
                bytes.len()
            )))
        }
    }
}

// =============================================================================
// Configuration handle
// =============================================================================

/// Names the built-in comparators in configuration files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum ComparatorType {
    #[default]
    BytesType,
    AsciiType,
    UTF8Type,
    LongType,
}

impl ComparatorType {
    pub fn build(self) -> Arc<dyn Comparator> {
        match self {
            ComparatorType::BytesType => Arc::new(BytesType),
            ComparatorType::AsciiType => Arc::new(AsciiType),
            ComparatorType::UTF8Type => Arc::new(UTF8Type),
            ComparatorType::LongType => Arc::new(LongType),
        }
    }
}

impl std::str::FromStr for ComparatorType {
    type Err = AtlasError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "BytesType" => Ok(ComparatorType::BytesType),
            "AsciiType" => Ok(ComparatorType::AsciiType),
            "UTF8Type" => Ok(ComparatorType::UTF8Type),
            "LongType" => Ok(ComparatorType::LongType),
            other => Err(AtlasError::Config(format!("unknown comparator: {}", other))),
        }
    }
}
