//! Bounded streaming reader
//!
//! Streams a byte range of an image file through a fixed scratch buffer,
//! refilling it with chunked reads. A row is never read in one piece, so
//! the scratch size is independent of the image width.

use inkframe_hal::{ImageFile, StorageError};

/// Chunked reader over a file region
pub struct ChunkReader<'b, F> {
    file: F,
    buf: &'b mut [u8],
    /// Next unread byte in `buf`
    idx: usize,
    /// Valid bytes in `buf`
    filled: usize,
    /// Region bytes not yet pulled from the file
    remaining: u32,
}

impl<'b, F: ImageFile> ChunkReader<'b, F> {
    /// Wrap an open file and a scratch buffer
    ///
    /// The scratch buffer must not be empty.
    pub fn new(file: F, buf: &'b mut [u8]) -> Self {
        Self {
            file,
            buf,
            idx: 0,
            filled: 0,
            remaining: 0,
        }
    }

    /// Position on `offset` and stream the next `len` bytes
    pub fn begin(&mut self, offset: u32, len: u32) -> Result<(), StorageError> {
        self.file.seek_to(offset)?;
        self.idx = 0;
        self.filled = 0;
        self.remaining = len;
        Ok(())
    }

    /// Read up to `out.len()` bytes starting at `offset`
    ///
    /// Bypasses the scratch buffer; used for small fixed-size headers.
    /// Returns the number of bytes read.
    pub fn read_at(&mut self, offset: u32, out: &mut [u8]) -> Result<usize, StorageError> {
        self.file.seek_to(offset)?;
        self.idx = 0;
        self.filled = 0;
        self.remaining = 0;
        self.file.fill(out)
    }

    /// Next byte of the region
    ///
    /// Returns `Ok(None)` once the region is exhausted or the file ended
    /// before the region did.
    pub fn next_byte(&mut self) -> Result<Option<u8>, StorageError> {
        if self.idx >= self.filled && !self.refill()? {
            return Ok(None);
        }
        let byte = self.buf[self.idx];
        self.idx += 1;
        Ok(Some(byte))
    }

    /// Next little-endian `u16` of the region
    pub fn next_u16_le(&mut self) -> Result<Option<u16>, StorageError> {
        let (Some(lo), Some(hi)) = (self.next_byte()?, self.next_byte()?) else {
            return Ok(None);
        };
        Ok(Some(u16::from_le_bytes([lo, hi])))
    }

    fn refill(&mut self) -> Result<bool, StorageError> {
        if self.remaining == 0 || self.buf.is_empty() {
            return Ok(false);
        }
        let want = self.buf.len().min(self.remaining as usize);
        let got = self.file.fill(&mut self.buf[..want])?;
        self.idx = 0;
        self.filled = got;
        if got < want {
            // File ended inside the region; nothing more will come
            self.remaining = 0;
        } else {
            self.remaining -= got as u32;
        }
        Ok(got > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inkframe_hal::mem::MemFile;

    #[test]
    fn test_streams_across_refills() {
        let data: Vec<u8> = (0..20).collect();
        let mut scratch = [0u8; 3];
        let mut reader = ChunkReader::new(MemFile::new(&data), &mut scratch);

        reader.begin(5, 10).unwrap();
        let mut out = Vec::new();
        while let Some(b) = reader.next_byte().unwrap() {
            out.push(b);
        }
        assert_eq!(out, (5..15).collect::<Vec<u8>>());
    }

    #[test]
    fn test_short_file_ends_region() {
        let data = [1u8, 2, 3];
        let mut scratch = [0u8; 8];
        let mut reader = ChunkReader::new(MemFile::new(&data), &mut scratch);

        reader.begin(1, 6).unwrap();
        assert_eq!(reader.next_byte().unwrap(), Some(2));
        assert_eq!(reader.next_byte().unwrap(), Some(3));
        assert_eq!(reader.next_byte().unwrap(), None);
        assert_eq!(reader.next_byte().unwrap(), None);
    }

    #[test]
    fn test_u16_le_and_partial_sample() {
        let data = [0x34u8, 0x12, 0xFF];
        let mut scratch = [0u8; 2];
        let mut reader = ChunkReader::new(MemFile::new(&data), &mut scratch);

        reader.begin(0, 3).unwrap();
        assert_eq!(reader.next_u16_le().unwrap(), Some(0x1234));
        assert_eq!(reader.next_u16_le().unwrap(), None);
    }

    #[test]
    fn test_begin_restarts_region() {
        let data = [9u8, 8, 7, 6];
        let mut scratch = [0u8; 4];
        let mut reader = ChunkReader::new(MemFile::new(&data), &mut scratch);

        reader.begin(0, 4).unwrap();
        assert_eq!(reader.next_byte().unwrap(), Some(9));
        reader.begin(2, 2).unwrap();
        assert_eq!(reader.next_byte().unwrap(), Some(7));
        assert_eq!(reader.next_byte().unwrap(), Some(6));
        assert_eq!(reader.next_byte().unwrap(), None);
    }
}
