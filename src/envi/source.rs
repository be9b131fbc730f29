//! Byte-range access to the raw image data file.
//!
//! The layout decoder never touches the filesystem directly; it consumes the
//! [`ByteRangeReader`] capability defined here. The crate ships a file-backed
//! implementation and one over plain byte slices for in-memory decoding.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;
use std::sync::Mutex;

use log::trace;

use super::types::error::{EnviError, Result};

/// Capability consumed by the layout decoder.
///
/// Implementations must return exactly `end - start` bytes from
/// `read_range`, or fail. Reads take `&self` so a decode can issue them
/// without exclusive access to the source.
pub trait ByteRangeReader {
    /// Total byte length of the data source.
    fn size(&self) -> Result<u64>;

    /// Reads the half-open byte range `start..end`.
    fn read_range(&self, start: u64, end: u64) -> Result<Vec<u8>>;
}

/// File-backed byte-range source.
///
/// The handle is wrapped in a `Mutex` so reads can be issued through a
/// shared reference; each read seeks then fills the exact range.
#[derive(Debug)]
pub struct FileSource {
    file: Mutex<File>,
}

impl FileSource {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl ByteRangeReader for FileSource {
    fn size(&self) -> Result<u64> {
        let file = self.file.lock().map_err(|_| EnviError::LockPoisoned)?;
        Ok(file.metadata()?.len())
    }

    fn read_range(&self, start: u64, end: u64) -> Result<Vec<u8>> {
        let len = range_len(start, end)?;
        trace!("file read: {}..{} ({} bytes)", start, end, len);
        let mut file = self.file.lock().map_err(|_| EnviError::LockPoisoned)?;
        file.seek(SeekFrom::Start(start))?;
        let mut buf = vec![0u8; len as usize];
        file.read_exact(&mut buf)?;
        Ok(buf)
    }
}

/// In-memory source over a byte slice.
impl ByteRangeReader for [u8] {
    fn size(&self) -> Result<u64> {
        Ok(self.len() as u64)
    }

    fn read_range(&self, start: u64, end: u64) -> Result<Vec<u8>> {
        range_len(start, end)?;
        self.get(start as usize..end as usize)
            .map(<[u8]>::to_vec)
            .ok_or_else(|| {
                EnviError::Io(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!(
                        "range {}..{} outside {}-byte buffer",
                        start,
                        end,
                        self.len()
                    ),
                ))
            })
    }
}

fn range_len(start: u64, end: u64) -> Result<u64> {
    end.checked_sub(start).ok_or_else(|| {
        EnviError::Io(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("range end {} precedes start {}", end, start),
        ))
    })
}
