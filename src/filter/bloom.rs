//! Bloom Filter
//!
//! Per-row summary of the column names stored in the row. Consulted before
//! any index or column bytes are read.
//!
//! Sizing for `n` names at false positive rate `p`:
//! - m = -n·ln(p) / ln(2)²  bits
//! - k = (m/n)·ln(2)        hash functions
//! - P(false positive) ≈ (1 - e^(-kn/m))^k
//!
//! Probes use double hashing `h_i = h1 + i·h2 (mod m)` where `h1`/`h2` are
//! two differently seeded CRC32 digests. The filter is persisted, so the hash
//! must not depend on the platform or the compiler (no `DefaultHasher`).
//!
//! ## On-disk Format
//! ```text
//! ┌────────────────┬────────────────┬───────────────┬──────────────┬──────────┐
//! │ BlockLen (u32) │ HashCount (u32)│ BitCount (u64)│ Words (u64×W)│ CRC (u32)│
//! └────────────────┴────────────────┴───────────────┴──────────────┴──────────┘
//! ```
//! BlockLen covers HashCount through Words; CRC covers the same range.

use bytes::BufMut;

use crate::error::{AtlasError, Result};
use crate::io::FileReader;

/// Upper bound on hash functions; anything larger is treated as corruption
pub const MAX_HASH_COUNT: u32 = 32;

/// Refuse to allocate filters larger than this (bits)
const MAX_BIT_COUNT: u64 = 1 << 32;

const SECOND_HASH_SEED: u32 = 0x9747_b28c;

/// Fixed part of the block after BlockLen: HashCount (4) + BitCount (8)
const FIXED_LEN: u64 = 12;

/// Probabilistic set of column names: no false negatives
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BloomFilter {
    words: Vec<u64>,
    bit_count: u64,
    hash_count: u32,
}

impl BloomFilter {
    /// Filter sized for `expected_items` names at `false_positive_rate`
    pub fn new(expected_items: usize, false_positive_rate: f64) -> Self {
        let n = expected_items.max(1) as f64;
        let ln2 = std::f64::consts::LN_2;

        let m = (-n * false_positive_rate.ln() / (ln2 * ln2)).ceil();
        let bit_count = (m as u64).clamp(64, MAX_BIT_COUNT);

        let k = ((bit_count as f64 / n) * ln2).round() as u32;
        let hash_count = k.clamp(1, MAX_HASH_COUNT);

        Self {
            words: vec![0u64; Self::word_count(bit_count)],
            bit_count,
            hash_count,
        }
    }

    fn word_count(bit_count: u64) -> usize {
        bit_count.div_ceil(64) as usize
    }

    fn probes(&self, name: &[u8]) -> impl Iterator<Item = u64> + '_ {
        let h1 = crc32fast::hash(name) as u64;
        let mut hasher = crc32fast::Hasher::new_with_initial(SECOND_HASH_SEED);
        hasher.update(name);
        // odd step so successive probes never collapse onto h1
        let h2 = (hasher.finalize() | 1) as u64;

        (0..self.hash_count as u64)
            .map(move |i| h1.wrapping_add(i.wrapping_mul(h2)) % self.bit_count)
    }

    pub fn add(&mut self, name: &[u8]) {
        let indices: Vec<u64> = self.probes(name).collect();
        for bit in indices {
            self.words[(bit / 64) as usize] |= 1u64 << (bit % 64);
        }
    }

    /// `false` means the name is definitely absent
    pub fn is_present(&self, name: &[u8]) -> bool {
        self.probes(name)
            .all(|bit| self.words[(bit / 64) as usize] & (1u64 << (bit % 64)) != 0)
    }

    pub fn hash_count(&self) -> u32 {
        self.hash_count
    }

    pub fn bit_count(&self) -> u64 {
        self.bit_count
    }

    /// Bytes the serialized block occupies, BlockLen and CRC included
    pub fn serialized_size(&self) -> u64 {
        4 + FIXED_LEN + self.words.len() as u64 * 8 + 4
    }

    pub fn serialize(&self, buf: &mut Vec<u8>) {
        let block_len = FIXED_LEN + self.words.len() as u64 * 8;
        buf.put_u32(block_len as u32);

        let start = buf.len();
        buf.put_u32(self.hash_count);
        buf.put_u64(self.bit_count);
        for word in &self.words {
            buf.put_u64(*word);
        }
        let crc = crc32fast::hash(&buf[start..]);
        buf.put_u32(crc);
    }

    /// Read a filter block; any inconsistency is an integrity error
    pub fn deserialize<R: FileReader + ?Sized>(reader: &mut R) -> Result<Self> {
        let block_len = reader.read_u32()? as u64;
        if block_len < FIXED_LEN {
            return Err(AtlasError::integrity(format!(
                "bloom filter block too short: {} bytes",
                block_len
            )));
        }

        let block = reader.read_bytes(block_len as usize)?;
        let expected_crc = reader.read_u32()?;
        let actual_crc = crc32fast::hash(&block);
        if expected_crc != actual_crc {
            return Err(AtlasError::integrity(format!(
                "bloom filter checksum mismatch: stored {:#010x}, computed {:#010x}",
                expected_crc, actual_crc
            )));
        }

        let hash_count = u32::from_be_bytes([block[0], block[1], block[2], block[3]]);
        let mut bit_count_bytes = [0u8; 8];
        bit_count_bytes.copy_from_slice(&block[4..12]);
        let bit_count = u64::from_be_bytes(bit_count_bytes);

        if hash_count == 0 || hash_count > MAX_HASH_COUNT {
            return Err(AtlasError::integrity(format!(
                "bloom filter hash count {} out of range 1..={}",
                hash_count, MAX_HASH_COUNT
            )));
        }
        if bit_count == 0 || bit_count > MAX_BIT_COUNT {
            return Err(AtlasError::integrity(format!(
                "bloom filter bit count {} out of range",
                bit_count
            )));
        }

        let word_count = Self::word_count(bit_count);
        if block_len != FIXED_LEN + word_count as u64 * 8 {
            return Err(AtlasError::integrity(format!(
                "bloom filter block length {} does not match {} bits",
                block_len, bit_count
            )));
        }

        let words = block[FIXED_LEN as usize..]
            .chunks_exact(8)
            .map(|chunk| {
                let mut word = [0u8; 8];
                word.copy_from_slice(chunk);
                u64::from_be_bytes(word)
            })
            .collect();

        Ok(Self {
            words,
            bit_count,
            hash_count,
        })
    }
}
