//! I/O Module
//!
//! Seekable, positioned byte-stream abstraction used by every reader in the
//! crate.
//!
//! ## Responsibilities
//! - `FileReader`: the capability set the retrieval path needs
//!   (seek, position, exact reads, EOF check)
//! - Big-endian primitive decoding on top of `read_exact`
//! - Matching encoders for the writer side (`bytes::BufMut`)
//!
//! Alternate backing stores only have to implement the four required
//! methods; the decoding helpers come for free.

mod buffered;
mod memory;

pub use buffered::BufferedFileReader;
pub use memory::MemoryReader;

use bytes::BufMut;

use crate::error::{AtlasError, Result};

/// Upper bound for a u16-length-prefixed field
pub const MAX_SHORT_LENGTH: usize = u16::MAX as usize;

// =============================================================================
// FileReader
// =============================================================================

/// Positioned, seekable read access to an immutable byte source
pub trait FileReader {
    /// Move the cursor to an absolute position
    fn seek(&mut self, position: u64) -> Result<()>;

    /// Current absolute cursor position
    fn position(&mut self) -> Result<u64>;

    /// Fill `buf` completely or fail with `UnexpectedEof`
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<()>;

    /// Total length of the underlying source
    fn len(&self) -> u64;

    fn is_eof(&mut self) -> Result<bool> {
        Ok(self.position()? >= self.len())
    }

    fn read_u8(&mut self) -> Result<u8> {
        let mut buf = [0u8; 1];
        self.read_exact(&mut buf)?;
        Ok(buf[0])
    }

    fn read_u16(&mut self) -> Result<u16> {
        let mut buf = [0u8; 2];
        self.read_exact(&mut buf)?;
        Ok(u16::from_be_bytes(buf))
    }

    fn read_u32(&mut self) -> Result<u32> {
        let mut buf = [0u8; 4];
        self.read_exact(&mut buf)?;
        Ok(u32::from_be_bytes(buf))
    }

    fn read_i32(&mut self) -> Result<i32> {
        let mut buf = [0u8; 4];
        self.read_exact(&mut buf)?;
        Ok(i32::from_be_bytes(buf))
    }

    fn read_u64(&mut self) -> Result<u64> {
        let mut buf = [0u8; 8];
        self.read_exact(&mut buf)?;
        Ok(u64::from_be_bytes(buf))
    }

    fn read_i64(&mut self) -> Result<i64> {
        let mut buf = [0u8; 8];
        self.read_exact(&mut buf)?;
        Ok(i64::from_be_bytes(buf))
    }

    /// Read `len` bytes, refusing lengths that run past the end of the source
    fn read_bytes(&mut self, len: usize) -> Result<Vec<u8>> {
        let remaining = self.len().saturating_sub(self.position()?);
        if len as u64 > remaining {
            return Err(AtlasError::Io(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                format!("need {} bytes, only {} remain", len, remaining),
            )));
        }
        let mut buf = vec![0u8; len];
        self.read_exact(&mut buf)?;
        Ok(buf)
    }

    /// `[len: u16][bytes]`
    fn read_short_bytes(&mut self) -> Result<Vec<u8>> {
        let len = self.read_u16()? as usize;
        self.read_bytes(len)
    }

    /// `[len: u32][bytes]`
    fn read_long_bytes(&mut self) -> Result<Vec<u8>> {
        let len = self.read_u32()? as usize;
        self.read_bytes(len)
    }

    /// `[len: u16][UTF-8 bytes]`; invalid UTF-8 on disk is corruption
    fn read_utf(&mut self) -> Result<String> {
        let raw = self.read_short_bytes()?;
        String::from_utf8(raw)
            .map_err(|e| AtlasError::integrity(format!("invalid UTF-8 string: {}", e)))
    }
}

impl<T: FileReader + ?Sized> FileReader for &mut T {
    fn seek(&mut self, position: u64) -> Result<()> {
        (**self).seek(position)
    }

    fn position(&mut self) -> Result<u64> {
        (**self).position()
    }

    fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        (**self).read_exact(buf)
    }

    fn len(&self) -> u64 {
        (**self).len()
    }
}

// =============================================================================
// Encoders (writer side)
// =============================================================================

/// Append `[len: u16][bytes]`
pub fn put_short_bytes(buf: &mut Vec<u8>, bytes: &[u8]) -> Result<()> {
    if bytes.len() > MAX_SHORT_LENGTH {
        return Err(AtlasError::Storage(format!(
            "field too long: {} bytes (max {})",
            bytes.len(),
            MAX_SHORT_LENGTH
        )));
    }
    buf.put_u16(bytes.len() as u16);
    buf.put_slice(bytes);
    Ok(())
}

/// Append `[len: u32][bytes]`
pub fn put_long_bytes(buf: &mut Vec<u8>, bytes: &[u8]) -> Result<()> {
    let len = u32::try_from(bytes.len()).map_err(|_| {
        AtlasError::Storage(format!("value too long: {} bytes", bytes.len()))
    })?;
    buf.put_u32(len);
    buf.put_slice(bytes);
    Ok(())
}

/// Append `[len: u16][UTF-8 bytes]`
pub fn put_utf(buf: &mut Vec<u8>, s: &str) -> Result<()> {
    put_short_bytes(buf, s.as_bytes())
}
