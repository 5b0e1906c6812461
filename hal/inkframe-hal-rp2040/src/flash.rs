//! Flash-partition storage for RP2040
//!
//! The upper megabyte of the 2 MB flash holds two raw regions: the image
//! partition and, at the very end, the configuration region. Each starts
//! with an `inkframe_hal::partition` header; the payload follows one
//! erase sector later.
//!
//! ```text
//! 0x000000 ┌──────────────────────┐
//!          │ firmware             │
//! 0x100000 ├──────────────────────┤
//!          │ image partition      │  header sector + up to 892 KB
//! 0x1F0000 ├──────────────────────┤
//!          │ config region        │  header sector + TOML
//! 0x1F2000 └──────────────────────┘
//! ```

use embassy_rp::flash::{Blocking, Flash};
use embassy_rp::peripherals::FLASH;
use embassy_rp::Peri;
use embedded_io::{ErrorType, Read, Seek, SeekFrom};
use inkframe_hal::partition::{PartitionError, PartitionHeader, PartitionKind, HEADER_LEN, PAYLOAD_OFFSET};
use inkframe_hal::{ImageFile, Storage, StorageError};

/// Flash storage configuration
pub const FLASH_SIZE: usize = 2 * 1024 * 1024; // 2MB on the Pico
pub const IMAGE_REGION_START: u32 = 0x10_0000;
pub const IMAGE_REGION_END: u32 = 0x1F_0000;
pub const CONFIG_REGION_START: u32 = 0x1F_0000;
pub const CONFIG_REGION_END: u32 = 0x1F_2000;

/// Largest configuration payload
pub const CONFIG_CAPACITY: u32 = CONFIG_REGION_END - CONFIG_REGION_START - PAYLOAD_OFFSET;

type RawFlash<'d> = Flash<'d, FLASH, Blocking, FLASH_SIZE>;

fn io<E>(_: E) -> StorageError {
    StorageError::Io
}

fn from_partition(e: PartitionError) -> StorageError {
    match e {
        PartitionError::Empty => StorageError::NotFound,
        PartitionError::TooLarge { .. } => StorageError::OutOfRange,
        PartitionError::Corrupted | PartitionError::NameTooLong => StorageError::Io,
    }
}

/// Image and configuration storage in on-board flash
pub struct FlashImageStorage<'d> {
    flash: RawFlash<'d>,
}

impl<'d> FlashImageStorage<'d> {
    /// Create a new flash storage instance
    pub fn new(flash: Peri<'d, FLASH>) -> Self {
        Self {
            flash: Flash::new_blocking(flash),
        }
    }

    fn read_header(&mut self, kind: PartitionKind, region: u32) -> Result<PartitionHeader, StorageError> {
        let mut raw = [0u8; HEADER_LEN];
        self.flash.blocking_read(region, &mut raw).map_err(io)?;
        PartitionHeader::parse(kind, &raw).map_err(from_partition)
    }

    /// Header of the stored image, if any
    pub fn image_header(&mut self) -> Result<PartitionHeader, StorageError> {
        self.read_header(PartitionKind::Image, IMAGE_REGION_START)
    }

    /// Copy the stored configuration text into `buf`
    ///
    /// # Returns
    /// The number of bytes copied, `StorageError::NotFound` if the region
    /// was never written, or `StorageError::OutOfRange` if `buf` is too
    /// small.
    pub fn read_config(&mut self, buf: &mut [u8]) -> Result<usize, StorageError> {
        let header = self.read_header(PartitionKind::Config, CONFIG_REGION_START)?;
        let len = header.len as usize;
        if len > buf.len() {
            return Err(StorageError::OutOfRange);
        }
        self.flash
            .blocking_read(CONFIG_REGION_START + PAYLOAD_OFFSET, &mut buf[..len])
            .map_err(io)?;
        Ok(len)
    }
}

impl<'d> Storage for FlashImageStorage<'d> {
    type File<'a>
        = FlashImageFile<'a, 'd>
    where
        Self: 'a;

    fn open(&mut self, path: &str) -> Result<Self::File<'_>, StorageError> {
        let header = self.image_header()?;
        if header.name.as_str() != path {
            return Err(StorageError::NotFound);
        }
        Ok(FlashImageFile {
            flash: &mut self.flash,
            len: header.len,
            pos: 0,
        })
    }
}

/// Open image in the flash partition
pub struct FlashImageFile<'a, 'd> {
    flash: &'a mut RawFlash<'d>,
    len: u32,
    pos: u32,
}

impl ErrorType for FlashImageFile<'_, '_> {
    type Error = StorageError;
}

impl Read for FlashImageFile<'_, '_> {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, StorageError> {
        let remaining = self.len.saturating_sub(self.pos) as usize;
        let n = remaining.min(buf.len());
        if n == 0 {
            return Ok(0);
        }
        self.flash
            .blocking_read(IMAGE_REGION_START + PAYLOAD_OFFSET + self.pos, &mut buf[..n])
            .map_err(io)?;
        self.pos += n as u32;
        Ok(n)
    }
}

impl Seek for FlashImageFile<'_, '_> {
    fn seek(&mut self, pos: SeekFrom) -> Result<u64, StorageError> {
        let target = match pos {
            SeekFrom::Start(offset) => offset as i64,
            SeekFrom::End(delta) => self.len as i64 + delta,
            SeekFrom::Current(delta) => self.pos as i64 + delta,
        };
        if target < 0 || target > u32::MAX as i64 {
            return Err(StorageError::OutOfRange);
        }
        self.pos = target as u32;
        Ok(target as u64)
    }
}

impl ImageFile for FlashImageFile<'_, '_> {
    fn len(&self) -> u32 {
        self.len
    }
}
