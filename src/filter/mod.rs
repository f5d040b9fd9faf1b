//! Filter Module
//!
//! Read-side filtering of a row's columns.
//!
//! ## Responsibilities
//! - Per-row bloom filter over column names (`bloom`)
//! - Named-column retrieval: bloom filter → sparse index → block reads →
//!   exact match (`names`)

mod bloom;
mod names;

pub use bloom::{BloomFilter, MAX_HASH_COUNT};
pub use names::{retrieve, NamesLookup, NamesQuery};
