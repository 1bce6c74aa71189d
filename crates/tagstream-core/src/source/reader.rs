use std::fs::File;
use std::io::{BufReader, ErrorKind, Read};
use std::path::Path;

use super::{ByteSource, SourceError};

/// Byte source over any [`Read`] implementation.
///
/// # Examples
/// ```
/// use std::io::Cursor;
///
/// use tagstream_core::{ByteSource, ReaderSource};
///
/// let mut source = ReaderSource::new(Cursor::new(vec![1u8, 2, 3]));
/// let mut buf = [0u8; 4];
/// assert_eq!(source.read_into(&mut buf)?, 3);
/// assert_eq!(source.read_into(&mut buf)?, 0);
/// # Ok::<(), tagstream_core::SourceError>(())
/// ```
pub struct ReaderSource<R> {
    inner: R,
}

/// Buffered file handle, closed when the source is dropped.
pub type FileSource = ReaderSource<BufReader<File>>;

impl<R: Read> ReaderSource<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl ReaderSource<BufReader<File>> {
    pub fn open(path: &Path) -> Result<Self, SourceError> {
        let file = File::open(path)?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: Read> ByteSource for ReaderSource<R> {
    fn read_into(&mut self, buf: &mut [u8]) -> Result<usize, SourceError> {
        fill_buf(&mut self.inner, buf).map_err(SourceError::from)
    }
}

/// Read until `buf` is full or the reader reports end of file.
///
/// Unlike `read_exact`, a short fill is not an error: the caller decides
/// whether the missing bytes are a truncation or a clean end of stream.
fn fill_buf<R: Read>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        }
    }
    Ok(filled)
}
