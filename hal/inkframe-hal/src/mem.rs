//! In-memory storage
//!
//! Serves borrowed byte slices as image files. Used by host-side tools and
//! tests, and by boards that link a fallback image into flash.

use embedded_io::{ErrorType, Read, Seek, SeekFrom};
use heapless::Vec;

use crate::storage::{ImageFile, Storage, StorageError};

/// Maximum number of files held by a [`MemStorage`]
pub const MAX_MEM_FILES: usize = 8;

#[derive(Debug, Clone, Copy)]
struct Entry<'d> {
    path: &'d str,
    data: &'d [u8],
    reported_len: u32,
}

/// Table of named in-memory files
#[derive(Debug, Default)]
pub struct MemStorage<'d> {
    entries: Vec<Entry<'d>, MAX_MEM_FILES>,
}

impl<'d> MemStorage<'d> {
    /// Create an empty storage
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Add or replace a file
    pub fn insert(&mut self, path: &'d str, data: &'d [u8]) -> Result<(), StorageError> {
        self.insert_with_len(path, data, data.len() as u32)
    }

    /// Add a file whose reported length differs from the readable bytes
    ///
    /// Models a storage layer whose metadata is ahead of its content, for
    /// example a file still being written.
    pub fn insert_with_len(
        &mut self,
        path: &'d str,
        data: &'d [u8],
        reported_len: u32,
    ) -> Result<(), StorageError> {
        let entry = Entry {
            path,
            data,
            reported_len,
        };
        if let Some(existing) = self.entries.iter_mut().find(|e| e.path == path) {
            *existing = entry;
            return Ok(());
        }
        self.entries.push(entry).map_err(|_| StorageError::Unavailable)
    }

    /// Remove a file
    pub fn remove(&mut self, path: &str) -> bool {
        match self.entries.iter().position(|e| e.path == path) {
            Some(idx) => {
                self.entries.swap_remove(idx);
                true
            }
            None => false,
        }
    }
}

impl<'d> Storage for MemStorage<'d> {
    type File<'a>
        = MemFile<'d>
    where
        Self: 'a;

    fn open(&mut self, path: &str) -> Result<Self::File<'_>, StorageError> {
        self.entries
            .iter()
            .find(|e| e.path == path)
            .map(|e| MemFile {
                data: e.data,
                pos: 0,
                reported_len: e.reported_len,
            })
            .ok_or(StorageError::NotFound)
    }
}

/// Open in-memory file
#[derive(Debug, Clone)]
pub struct MemFile<'d> {
    data: &'d [u8],
    pos: usize,
    reported_len: u32,
}

impl<'d> MemFile<'d> {
    /// Wrap a byte slice directly
    pub fn new(data: &'d [u8]) -> Self {
        Self {
            data,
            pos: 0,
            reported_len: data.len() as u32,
        }
    }
}

impl ErrorType for MemFile<'_> {
    type Error = StorageError;
}

impl Read for MemFile<'_> {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, StorageError> {
        let remaining = self.data.get(self.pos..).unwrap_or(&[]);
        let n = remaining.len().min(buf.len());
        buf[..n].copy_from_slice(&remaining[..n]);
        self.pos += n;
        Ok(n)
    }
}

impl Seek for MemFile<'_> {
    fn seek(&mut self, pos: SeekFrom) -> Result<u64, StorageError> {
        let target = match pos {
            SeekFrom::Start(offset) => offset as i64,
            SeekFrom::End(delta) => self.reported_len as i64 + delta,
            SeekFrom::Current(delta) => self.pos as i64 + delta,
        };
        if target < 0 {
            return Err(StorageError::OutOfRange);
        }
        // Seeking past the end is allowed; reads there return 0 bytes
        self.pos = target as usize;
        Ok(target as u64)
    }
}

impl ImageFile for MemFile<'_> {
    fn len(&self) -> u32 {
        self.reported_len
    }
}
