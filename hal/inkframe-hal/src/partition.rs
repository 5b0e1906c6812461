//! Flash partition headers
//!
//! Image and configuration blobs live in raw flash regions. Each region
//! starts with a fixed header naming the blob and giving its length; the
//! payload follows at [`PAYLOAD_OFFSET`]. Erased flash reads as all ones,
//! so a region that was never written does not parse.

use heapless::String;

/// Encoded header size in bytes
pub const HEADER_LEN: usize = 44;

/// Longest blob name
pub const MAX_NAME_LEN: usize = 32;

/// Payload offset within a region (one erase sector for the header)
pub const PAYLOAD_OFFSET: u32 = 4096;

/// Which kind of blob a region holds, stored as its magic number
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u32)]
pub enum PartitionKind {
    /// Stored image ("IMG1")
    Image = 0x3147_4D49,
    /// TOML configuration ("CFG1")
    Config = 0x3147_4643,
}

impl PartitionKind {
    /// Magic number written at the start of the header
    pub fn magic(self) -> u32 {
        self as u32
    }
}

/// Errors from header handling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PartitionError {
    /// Region is erased or holds another kind of blob
    Empty,
    /// Header fields are inconsistent
    Corrupted,
    /// Name longer than [`MAX_NAME_LEN`]
    NameTooLong,
    /// Payload does not fit the region
    TooLarge { len: u32, capacity: u32 },
}

/// Header at the start of a partition
///
/// Layout (little endian): magic `u32`, payload length `u32`, name length
/// `u8`, three reserved bytes, then the name padded to [`MAX_NAME_LEN`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PartitionHeader {
    pub kind: PartitionKind,
    pub len: u32,
    pub name: String<MAX_NAME_LEN>,
}

impl PartitionHeader {
    /// Build a header, checking the name and the region capacity
    ///
    /// # Arguments
    /// * `kind` - Blob kind
    /// * `name` - Path the blob is opened by
    /// * `len` - Payload length in bytes
    /// * `capacity` - Region size minus [`PAYLOAD_OFFSET`]
    pub fn new(kind: PartitionKind, name: &str, len: u32, capacity: u32) -> Result<Self, PartitionError> {
        if len > capacity {
            return Err(PartitionError::TooLarge { len, capacity });
        }
        let mut stored = String::new();
        stored
            .push_str(name)
            .map_err(|_| PartitionError::NameTooLong)?;
        Ok(Self {
            kind,
            len,
            name: stored,
        })
    }

    /// Serialize for writing to flash
    pub fn encode(&self) -> [u8; HEADER_LEN] {
        let mut out = [0u8; HEADER_LEN];
        out[0..4].copy_from_slice(&self.kind.magic().to_le_bytes());
        out[4..8].copy_from_slice(&self.len.to_le_bytes());
        out[8] = self.name.len() as u8;
        out[12..12 + self.name.len()].copy_from_slice(self.name.as_bytes());
        out
    }

    /// Parse a header read from flash
    ///
    /// # Returns
    /// `PartitionError::Empty` when the magic does not match `kind`
    /// (including erased flash).
    pub fn parse(kind: PartitionKind, bytes: &[u8]) -> Result<Self, PartitionError> {
        if bytes.len() < HEADER_LEN {
            return Err(PartitionError::Corrupted);
        }
        let word = |at: usize| u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]]);

        if word(0) != kind.magic() {
            return Err(PartitionError::Empty);
        }
        let len = word(4);
        let name_len = bytes[8] as usize;
        if name_len > MAX_NAME_LEN {
            return Err(PartitionError::Corrupted);
        }
        let name = core::str::from_utf8(&bytes[12..12 + name_len]).map_err(|_| PartitionError::Corrupted)?;

        let mut stored = String::new();
        stored
            .push_str(name)
            .map_err(|_| PartitionError::Corrupted)?;
        Ok(Self {
            kind,
            len,
            name: stored,
        })
    }
}
