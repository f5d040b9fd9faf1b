//! Buffered file reader
//!
//! `BufReader<File>` behind the [`FileReader`] capability.

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use crate::error::Result;

use super::FileReader;

/// Read-only, buffered handle on a data file
///
/// The file is closed when the reader is dropped.
pub struct BufferedFileReader {
    path: PathBuf,
    file: BufReader<File>,
    len: u64,
}

impl BufferedFileReader {
    /// Open `path` with a read buffer of `buffer_size` bytes
    pub fn open(path: &Path, buffer_size: usize) -> Result<Self> {
        let file = File::open(path)?;
        let len = file.metadata()?.len();

        Ok(Self {
            path: path.to_path_buf(),
            file: BufReader::with_capacity(buffer_size, file),
            len,
        })
    }

    /// Path this reader was opened on
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FileReader for BufferedFileReader {
    fn seek(&mut self, position: u64) -> Result<()> {
        // SeekFrom::Start always discards the BufReader buffer; a relative seek
        // keeps it when the target is already buffered.
        let current = self.file.stream_position()?;
        let delta = position as i64 - current as i64;
        self.file.seek_relative(delta)?;
        Ok(())
    }

    fn position(&mut self) -> Result<u64> {
        Ok(self.file.stream_position()?)
    }

    fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        self.file.read_exact(buf)?;
        Ok(())
    }

    fn len(&self) -> u64 {
        self.len
    }
}
