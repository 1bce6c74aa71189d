//! Byte sources feeding the stream decoder.
//!
//! A source hands out bytes strictly left to right. Releasing the source is
//! tied to dropping it, so a decode pass that stops early (error or caller
//! abort) still closes the underlying file exactly once.

mod reader;

pub use reader::{FileSource, ReaderSource};

use thiserror::Error;

pub trait ByteSource {
    /// Fill `buf` from the source and return how many bytes were written.
    ///
    /// A count below `buf.len()` means the source is exhausted; `0` at a
    /// record boundary is a clean end of stream.
    fn read_into(&mut self, buf: &mut [u8]) -> Result<usize, SourceError>;
}

impl<S: ByteSource + ?Sized> ByteSource for &mut S {
    fn read_into(&mut self, buf: &mut [u8]) -> Result<usize, SourceError> {
        (**self).read_into(buf)
    }
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
