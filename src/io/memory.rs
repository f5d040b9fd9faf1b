//! In-memory reader
//!
//! Serves a [`FileReader`] out of a `Bytes` buffer. Used for rows already
//! resident in memory and throughout the tests.

use bytes::Bytes;

use crate::error::{AtlasError, Result};

use super::FileReader;

/// Cursor over an immutable, cheaply clonable byte buffer
#[derive(Debug, Clone)]
pub struct MemoryReader {
    data: Bytes,
    position: u64,
}

impl MemoryReader {
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            position: 0,
        }
    }
}

impl FileReader for MemoryReader {
    fn seek(&mut self, position: u64) -> Result<()> {
        self.position = position;
        Ok(())
    }

    fn position(&mut self) -> Result<u64> {
        Ok(self.position)
    }

    fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        let start = self.position as usize;
        let end = start.checked_add(buf.len()).filter(|&e| e <= self.data.len());
        match end {
            Some(end) => {
                buf.copy_from_slice(&self.data[start..end]);
                self.position = end as u64;
                Ok(())
            }
            None => Err(AtlasError::Io(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                format!(
                    "read of {} bytes at {} exceeds buffer of {}",
                    buf.len(),
                    start,
                    self.data.len()
                ),
            ))),
        }
    }

    fn len(&self) -> u64 {
        self.data.len() as u64
    }
}
