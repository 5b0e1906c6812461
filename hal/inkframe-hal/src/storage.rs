//! Image storage abstractions
//!
//! Provides traits for random-access image files that can be implemented
//! by chip-specific HALs on top of flash partitions, SD cards or host files.
//!
//! Reading and seeking use the `embedded-io` traits so any reader from the
//! embedded ecosystem can back an image. Closing a file is dropping it.

use embedded_io::{ErrorKind, ErrorType, Read, Seek, SeekFrom};

/// Errors from storage operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StorageError {
    /// No file at the requested path
    NotFound,
    /// Storage is not mounted or otherwise unreachable
    Unavailable,
    /// Seek target lies outside the file
    OutOfRange,
    /// Underlying read failed
    Io,
}

impl embedded_io::Error for StorageError {
    fn kind(&self) -> ErrorKind {
        match self {
            StorageError::NotFound => ErrorKind::NotFound,
            StorageError::Unavailable => ErrorKind::NotConnected,
            StorageError::OutOfRange => ErrorKind::InvalidInput,
            StorageError::Io => ErrorKind::Other,
        }
    }
}

impl From<ErrorKind> for StorageError {
    fn from(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::NotFound => StorageError::NotFound,
            ErrorKind::NotConnected => StorageError::Unavailable,
            ErrorKind::InvalidInput => StorageError::OutOfRange,
            _ => StorageError::Io,
        }
    }
}

/// An open image file
///
/// Must support random access: BMP rows are addressed by absolute offset.
pub trait ImageFile: Read + Seek + ErrorType<Error = StorageError> {
    /// Total file length in bytes, as reported by the storage layer
    fn len(&self) -> u32;

    /// Whether the file is empty
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Move the read position to an absolute byte offset
    fn seek_to(&mut self, offset: u32) -> Result<(), StorageError> {
        self.seek(SeekFrom::Start(offset as u64)).map(|_| ())
    }

    /// Read until `buf` is full or the file ends
    ///
    /// Returns the number of bytes read. A value smaller than `buf.len()`
    /// means the file ended early.
    fn fill(&mut self, buf: &mut [u8]) -> Result<usize, StorageError> {
        let mut filled = 0;
        while filled < buf.len() {
            let n = self.read(&mut buf[filled..])?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        Ok(filled)
    }
}

/// Storage trait
///
/// Opens image files by path. Implementations decide how paths map to
/// physical locations (a flash partition, a filesystem, a RAM table).
pub trait Storage {
    /// File handle type, borrowing the storage while open
    type File<'a>: ImageFile
    where
        Self: 'a;

    /// Open a file for reading
    ///
    /// # Returns
    /// The open file, `StorageError::NotFound` if no such path exists, or
    /// `StorageError::Unavailable` if the medium cannot be accessed.
    fn open(&mut self, path: &str) -> Result<Self::File<'_>, StorageError>;

    /// Check if a file exists
    fn exists(&mut self, path: &str) -> bool {
        self.open(path).is_ok()
    }
}
