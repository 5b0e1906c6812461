//! BMP decoder
//!
//! Handles uncompressed and bitfield bitmaps at 1, 2, 4, 8, 16, 24 and 32
//! bits per pixel. Paletted images are classified once per palette entry;
//! direct-color images per pixel.

use inkframe_hal::{ImageFile, StorageError};

use super::{ChunkReader, FormatError, Placement, RowDecoder, RowStep, Surface};
use crate::classify::{Classification, Classifier, Rgb};
use crate::plane::BitPlaneWriter;
use crate::render::RenderError;

/// Bytes of header read before the palette
///
/// Covers the file header and the info-header fields up to the
/// compression code.
pub const BMP_HEADER_LEN: usize = 34;

/// `BM`, little-endian
const BMP_SIGNATURE: u16 = 0x4D42;

/// Uncompressed pixel data
const FORMAT_RGB: u32 = 0;
/// Channel bitfields; 16-bit pixels are then RGB565
const FORMAT_BITFIELDS: u32 = 3;

/// Parsed BMP header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BmpHeader {
    pub file_size: u32,
    /// Offset of the first pixel byte
    pub image_offset: u32,
    pub header_size: u32,
    pub width: u32,
    /// Positive for bottom-up storage, negative for top-down
    pub height: i32,
    pub planes: u16,
    pub depth: u16,
    pub format: u32,
}

fn le_u16(bytes: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([bytes[at], bytes[at + 1]])
}

fn le_u32(bytes: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

impl BmpHeader {
    /// Parse and validate the leading header bytes
    ///
    /// # Arguments
    /// * `bytes` - Start of the file; at least [`BMP_HEADER_LEN`] bytes
    ///
    /// # Returns
    /// The header, or the first reason it cannot be drawn.
    pub fn parse(bytes: &[u8]) -> Result<Self, FormatError> {
        if bytes.len() >= 2 {
            let signature = le_u16(bytes, 0);
            if signature != BMP_SIGNATURE {
                return Err(FormatError::BadSignature(signature));
            }
        }
        if bytes.len() < BMP_HEADER_LEN {
            return Err(FormatError::TruncatedHeader(bytes.len()));
        }

        let header = Self {
            file_size: le_u32(bytes, 2),
            image_offset: le_u32(bytes, 10),
            header_size: le_u32(bytes, 14),
            width: le_u32(bytes, 18),
            height: le_u32(bytes, 22) as i32,
            planes: le_u16(bytes, 26),
            depth: le_u16(bytes, 28),
            format: le_u32(bytes, 30),
        };

        if header.planes != 1 {
            return Err(FormatError::UnsupportedPlanes(header.planes));
        }
        if header.format != FORMAT_RGB && header.format != FORMAT_BITFIELDS {
            return Err(FormatError::UnsupportedCompression(header.format));
        }
        if !matches!(header.depth, 1 | 2 | 4 | 8 | 16 | 24 | 32) {
            return Err(FormatError::UnsupportedDepth(header.depth));
        }
        Ok(header)
    }

    /// Rows are stored bottom-up
    pub fn flipped(&self) -> bool {
        self.height >= 0
    }

    /// Image height in rows, regardless of storage order
    pub fn rows(&self) -> u32 {
        self.height.unsigned_abs()
    }

    /// Stored bytes per row, padded to a multiple of four
    pub fn row_size(&self) -> u32 {
        let depth = self.depth as u32;
        let bytes = if depth < 8 {
            self.width.saturating_mul(depth).saturating_add(8 - depth) / 8
        } else {
            self.width.saturating_mul(depth) / 8
        };
        bytes.saturating_add(3) & !3
    }

    /// Number of palette entries, zero for direct-color images
    pub fn palette_len(&self) -> u16 {
        if self.depth <= 8 {
            1 << self.depth
        } else {
            0
        }
    }

    /// 16-bit pixels use the 5-5-5 layout
    pub fn is_rgb555(&self) -> bool {
        self.format == FORMAT_RGB
    }
}

/// Precomputed predicates for each palette index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    whitish: [u8; 32],
    colored: [u8; 32],
}

impl Default for Palette {
    fn default() -> Self {
        Self::new()
    }
}

impl Palette {
    /// Palette with every entry black
    pub const fn new() -> Self {
        Self {
            whitish: [0; 32],
            colored: [0; 32],
        }
    }

    /// Store the predicates for one index
    pub fn set(&mut self, index: u8, c: Classification) {
        let (byte, bit) = (index as usize / 8, 1u8 << (index % 8));
        if c.whitish {
            self.whitish[byte] |= bit;
        } else {
            self.whitish[byte] &= !bit;
        }
        if c.colored {
            self.colored[byte] |= bit;
        } else {
            self.colored[byte] &= !bit;
        }
    }

    /// Predicates for one index
    pub fn get(&self, index: u8) -> Classification {
        let (byte, bit) = (index as usize / 8, 1u8 << (index % 8));
        Classification {
            whitish: self.whitish[byte] & bit != 0,
            colored: self.colored[byte] & bit != 0,
        }
    }
}

/// Streaming BMP decoder
pub struct BmpDecoder<'b, F> {
    reader: ChunkReader<'b, F>,
    header: BmpHeader,
    classifier: Classifier,
    palette: Palette,
    placement: Placement,
    /// File offset of the next row to decode
    row_pos: u32,
    /// Bytes consumed per output row (only the visible columns)
    row_bytes: u32,
    row: u16,
    /// Sub-byte pixel state for paletted depths below 8
    bit_buf: u8,
    bits_left: u8,
}

impl<'b, F: ImageFile> BmpDecoder<'b, F> {
    /// Validate the header and prepare to stream rows
    ///
    /// # Arguments
    /// * `file` - Open BMP file
    /// * `scratch` - Read buffer, any non-zero size
    /// * `x`, `y` - Panel position of the image's top-left corner
    /// * `with_color` - Route saturated pixels to the accent plane
    /// * `surface` - Panel extent and row capacity
    ///
    /// # Returns
    /// A decoder positioned on the first row. Errors leave the panel
    /// untouched.
    pub fn open(
        file: F,
        scratch: &'b mut [u8],
        x: u16,
        y: u16,
        with_color: bool,
        surface: Surface,
    ) -> Result<Self, RenderError> {
        surface.check_origin(x, y)?;

        let mut reader = ChunkReader::new(file, scratch);
        let mut raw = [0u8; BMP_HEADER_LEN];
        let got = reader.read_at(0, &mut raw)?;
        let header = BmpHeader::parse(&raw[..got])?;
        debug!(
            "bmp: {}x{} depth {} format {} offset {} file {}",
            header.width,
            header.height,
            header.depth,
            header.format,
            header.image_offset,
            header.file_size
        );

        let placement = surface.clip(x, y, header.width, header.rows())?;

        // A 1-bit image has no room for an accent color
        let with_color = with_color && header.depth != 1;
        let row_size = header.row_size();
        let row_pos = if header.flipped() {
            let skipped = header.rows() - placement.height as u32;
            header
                .image_offset
                .saturating_add(skipped.saturating_mul(row_size))
        } else {
            header.image_offset
        };
        let width = placement.width as u32;
        let row_bytes = match header.depth {
            d @ (1 | 2 | 4) => (width * d as u32).div_ceil(8),
            d => width * (d as u32 / 8),
        };

        let mut decoder = Self {
            reader,
            header,
            classifier: Classifier::new(with_color),
            palette: Palette::new(),
            placement,
            row_pos,
            row_bytes,
            row: 0,
            bit_buf: 0,
            bits_left: 0,
        };
        if header.palette_len() > 0 {
            decoder.load_palette()?;
        }
        Ok(decoder)
    }

    /// Classifier in effect after depth adjustments
    pub fn classifier(&self) -> Classifier {
        self.classifier
    }

    /// Classify the palette stored just before the pixel data
    ///
    /// Entries the file cannot supply stay black.
    fn load_palette(&mut self) -> Result<(), StorageError> {
        let entries = self.header.palette_len();
        let bytes = entries as u32 * 4;
        let start = self.header.image_offset.saturating_sub(bytes);
        self.reader.begin(start, bytes)?;

        for index in 0..entries {
            let mut quad = [0u8; 4];
            for byte in quad.iter_mut() {
                match self.reader.next_byte()? {
                    Some(b) => *byte = b,
                    None => {
                        warn!("bmp: palette cut short at entry {}", index);
                        return Ok(());
                    }
                }
            }
            let [b, g, r, _] = quad;
            self.palette
                .set(index as u8, self.classifier.classify(Rgb::new(r, g, b)));
        }
        Ok(())
    }

    fn next_bgr(&mut self) -> Result<Option<Rgb>, StorageError> {
        let (Some(b), Some(g), Some(r)) = (
            self.reader.next_byte()?,
            self.reader.next_byte()?,
            self.reader.next_byte()?,
        ) else {
            return Ok(None);
        };
        Ok(Some(Rgb::new(r, g, b)))
    }

    /// Predicates for the next pixel, `None` at end of file
    fn next_pixel(&mut self) -> Result<Option<Classification>, StorageError> {
        let rgb = match self.header.depth {
            32 => {
                let Some(rgb) = self.next_bgr()? else {
                    return Ok(None);
                };
                if self.reader.next_byte()?.is_none() {
                    return Ok(None);
                }
                rgb
            }
            24 => match self.next_bgr()? {
                Some(rgb) => rgb,
                None => return Ok(None),
            },
            16 => match self.reader.next_u16_le()? {
                Some(raw) if self.header.is_rgb555() => Rgb::from_rgb555(raw),
                Some(raw) => Rgb::from_rgb565(raw),
                None => return Ok(None),
            },
            depth => {
                let depth = depth as u8;
                if self.bits_left == 0 {
                    let Some(byte) = self.reader.next_byte()? else {
                        return Ok(None);
                    };
                    self.bit_buf = byte;
                    self.bits_left = 8;
                }
                let index = self.bit_buf >> (8 - depth);
                self.bit_buf = ((self.bit_buf as u16) << depth) as u8;
                self.bits_left -= depth;
                return Ok(Some(self.palette.get(index)));
            }
        };
        Ok(Some(self.classifier.classify(rgb)))
    }
}

impl<F: ImageFile> RowDecoder for BmpDecoder<'_, F> {
    fn placement(&self) -> Placement {
        self.placement
    }

    fn next_row(&mut self, planes: &mut BitPlaneWriter<'_>) -> Result<RowStep, RenderError> {
        let Placement {
            y, width, height, ..
        } = self.placement;
        if self.row >= height {
            return Ok(RowStep::Done);
        }

        planes.begin_row(width)?;
        self.reader.begin(self.row_pos, self.row_bytes)?;
        self.bits_left = 0;

        for col in 0..width {
            let Some(c) = self.next_pixel()? else {
                warn!("bmp: file ends in row {}", self.row);
                return Ok(RowStep::Truncated);
            };
            planes.set_class(col, self.classifier.resolve(c));
        }

        let out_y = if self.header.flipped() {
            y + (height - self.row - 1)
        } else {
            y + self.row
        };
        self.row += 1;
        self.row_pos = self.row_pos.saturating_add(self.header.row_size());
        Ok(RowStep::Row { y: out_y })
    }
}
