//! Position-tracking byte reader.
//!
//! [`ByteCursor`] is the single reader every decoder in [`crate::dbase`] goes
//! through. It wraps a file, a memory map, or an in-memory buffer behind
//! `Read + Seek`, tracks the absolute position itself, and offers an
//! explicit one-byte [`peek_u8`](ByteCursor::peek_u8) so callers never need
//! to seek backwards to look at the next byte.

use std::io::{BufReader, Cursor, Read, Seek, SeekFrom};

use crate::DbfError;

/// Supertrait combining `Read + Seek + Send` for type-erased readers.
pub(crate) trait ReadSeek: Read + Seek + Send {}
impl<T: Read + Seek + Send> ReadSeek for T {}

/// A memory-mapped file reader implementing `Read` and `Seek`.
///
/// The mapped data is not copied; it stays backed by the OS page cache.
#[cfg(feature = "cli")]
struct MmapReader {
    mmap: memmap2::Mmap,
    position: u64,
}

#[cfg(feature = "cli")]
impl MmapReader {
    fn new(mmap: memmap2::Mmap) -> Self {
        Self { mmap, position: 0 }
    }
}

#[cfg(feature = "cli")]
impl Read for MmapReader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let len = self.mmap.len() as u64;
        if self.position >= len {
            return Ok(0);
        }
        let available = (len - self.position) as usize;
        let to_read = buf.len().min(available);
        let start = self.position as usize;
        buf[..to_read].copy_from_slice(&self.mmap[start..start + to_read]);
        self.position += to_read as u64;
        Ok(to_read)
    }
}

#[cfg(feature = "cli")]
impl Seek for MmapReader {
    fn seek(&mut self, pos: SeekFrom) -> std::io::Result<u64> {
        let len = self.mmap.len() as i64;
        let new_pos = match pos {
            SeekFrom::Start(offset) => offset as i64,
            SeekFrom::End(offset) => len + offset,
            SeekFrom::Current(offset) => self.position as i64 + offset,
        };
        if new_pos < 0 {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "seek to a negative position",
            ));
        }
        self.position = new_pos as u64;
        Ok(self.position)
    }
}

/// Sequential reader over a fixed-size byte source.
pub struct ByteCursor {
    reader: Box<dyn ReadSeek>,
    len: u64,
    position: u64,
    peeked: Option<u8>,
}

impl ByteCursor {
    /// Open a file for buffered sequential reading.
    pub fn open<P: AsRef<std::path::Path>>(path: P) -> Result<Self, DbfError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)
            .map_err(|e| DbfError::Io(format!("Cannot open {}: {}", path.display(), e)))?;

        let len = file
            .metadata()
            .map_err(|e| DbfError::Io(format!("Cannot stat {}: {}", path.display(), e)))?
            .len();

        Ok(Self::new(Box::new(BufReader::new(file)), len))
    }

    /// Open a file using memory-mapped I/O.
    ///
    /// # Safety
    ///
    /// The underlying `mmap` call is `unsafe` because the mapped file must not
    /// be truncated by another process while the mapping is alive. Source
    /// tables are expected to be quiescent while they are converted.
    #[cfg(feature = "cli")]
    pub fn open_mmap<P: AsRef<std::path::Path>>(path: P) -> Result<Self, DbfError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)
            .map_err(|e| DbfError::Io(format!("Cannot open {}: {}", path.display(), e)))?;

        let len = file
            .metadata()
            .map_err(|e| DbfError::Io(format!("Cannot stat {}: {}", path.display(), e)))?
            .len();

        let mmap = unsafe {
            memmap2::Mmap::map(&file)
                .map_err(|e| DbfError::Io(format!("Cannot mmap {}: {}", path.display(), e)))?
        };

        Ok(Self::new(Box::new(MmapReader::new(mmap)), len))
    }

    /// Create a cursor over an in-memory buffer.
    ///
    /// # Examples
    ///
    /// ```
    /// use dbf::dbase::cursor::ByteCursor;
    ///
    /// let mut cur = ByteCursor::from_bytes(vec![1, 2, 3]);
    /// assert_eq!(cur.peek_u8().unwrap(), Some(1));
    /// assert_eq!(cur.position(), 0);
    /// assert_eq!(cur.read_u8().unwrap(), 1);
    /// assert_eq!(cur.read_bytes(2).unwrap(), vec![2, 3]);
    /// assert_eq!(cur.remaining(), 0);
    /// ```
    pub fn from_bytes(data: Vec<u8>) -> Self {
        let len = data.len() as u64;
        Self::new(Box::new(Cursor::new(data)), len)
    }

    fn new(reader: Box<dyn ReadSeek>, len: u64) -> Self {
        ByteCursor {
            reader,
            len,
            position: 0,
            peeked: None,
        }
    }

    /// Total size of the source in bytes.
    pub fn len(&self) -> u64 {
        self.len
    }

    /// Returns true if the source has no bytes at all.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Absolute offset of the next byte to be read.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Bytes between the current position and the end of the source.
    pub fn remaining(&self) -> u64 {
        self.len.saturating_sub(self.position)
    }

    /// Move to an absolute offset. Seeking to the current position is free.
    pub fn seek(&mut self, offset: u64) -> Result<(), DbfError> {
        if offset == self.position {
            return Ok(());
        }
        self.peeked = None;
        self.reader
            .seek(SeekFrom::Start(offset))
            .map_err(|e| DbfError::Io(format!("Cannot seek to offset {}: {}", offset, e)))?;
        self.position = offset;
        Ok(())
    }

    /// Look at the next byte without consuming it.
    ///
    /// Returns `None` at the end of the source.
    pub fn peek_u8(&mut self) -> Result<Option<u8>, DbfError> {
        if self.peeked.is_none() {
            if self.remaining() == 0 {
                return Ok(None);
            }
            let mut b = [0u8; 1];
            self.reader
                .read_exact(&mut b)
                .map_err(|e| self.read_error(1, e))?;
            self.peeked = Some(b[0]);
        }
        Ok(self.peeked)
    }

    /// Consume one byte.
    pub fn read_u8(&mut self) -> Result<u8, DbfError> {
        let mut b = [0u8; 1];
        self.read_exact(&mut b)?;
        Ok(b[0])
    }

    /// Fill `buf` completely or fail.
    pub fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), DbfError> {
        if buf.is_empty() {
            return Ok(());
        }
        if (buf.len() as u64) > self.remaining() {
            return Err(DbfError::Io(format!(
                "Unexpected end of data at offset {}: need {} bytes, {} available",
                self.position,
                buf.len(),
                self.remaining()
            )));
        }
        let start = match self.peeked.take() {
            Some(b) => {
                buf[0] = b;
                1
            }
            None => 0,
        };
        self.reader
            .read_exact(&mut buf[start..])
            .map_err(|e| self.read_error(buf.len(), e))?;
        self.position += buf.len() as u64;
        Ok(())
    }

    /// Read exactly `n` bytes into a new buffer.
    pub fn read_bytes(&mut self, n: usize) -> Result<Vec<u8>, DbfError> {
        let mut buf = vec![0u8; n];
        self.read_exact(&mut buf)?;
        Ok(buf)
    }

    /// Advance `n` bytes without interpreting them.
    pub fn skip(&mut self, n: u64) -> Result<(), DbfError> {
        if n > self.remaining() {
            return Err(DbfError::Io(format!(
                "Cannot skip {} bytes at offset {}: only {} available",
                n,
                self.position,
                self.remaining()
            )));
        }
        self.seek(self.position + n)
    }

    fn read_error(&self, n: usize, e: std::io::Error) -> DbfError {
        DbfError::Io(format!(
            "Cannot read {} bytes at offset {}: {}",
            n, self.position, e
        ))
    }
}
