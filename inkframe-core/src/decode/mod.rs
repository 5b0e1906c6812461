//! Image decoders
//!
//! Both decoders produce one output row per call and never hold more than
//! a row of planes plus a fixed scratch buffer, so a frame larger than RAM
//! can be streamed from storage to the panel.
//!
//! ```text
//! storage ──► ChunkReader ──► RowDecoder::next_row ──► BitPlaneWriter ──► RenderDriver
//!              (scratch)        (classify pixels)        (mono/color)
//! ```

pub mod bmp;
pub mod raw;
pub mod reader;

pub use bmp::{BmpDecoder, BmpHeader, Palette, BMP_HEADER_LEN};
pub use raw::RawDecoder;
pub use reader::ChunkReader;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::plane::BitPlaneWriter;
use crate::render::RenderError;

/// Image header rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FormatError {
    /// First two bytes are not `BM`
    BadSignature(u16),
    /// Only single-plane images are supported
    UnsupportedPlanes(u16),
    /// Compression other than uncompressed or bitfields
    UnsupportedCompression(u32),
    /// Bit depth outside 1, 2, 4, 8, 16, 24, 32
    UnsupportedDepth(u16),
    /// File ends inside the header; holds the bytes available
    TruncatedHeader(usize),
}

/// Stored image encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ImageFormat {
    /// Headerless little-endian RGB565, row-major
    #[default]
    Raw565,
    /// Windows bitmap
    Bmp,
}

/// Drawable area handed to a decoder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Surface {
    /// Panel width in pixels
    pub width: u16,
    /// Panel height in pixels
    pub height: u16,
    /// Widest row the plane buffers accept
    pub max_row_width: u16,
}

impl Surface {
    /// Reject an origin at or beyond the panel extent
    pub fn check_origin(&self, x: u16, y: u16) -> Result<(), RenderError> {
        if x >= self.width || y >= self.height {
            return Err(RenderError::OutOfBounds { x, y });
        }
        Ok(())
    }

    /// Clip a `width`×`height` image at `(x, y)` to the panel
    ///
    /// The origin must already have passed [`Surface::check_origin`].
    pub fn clip(&self, x: u16, y: u16, width: u32, height: u32) -> Result<Placement, RenderError> {
        let placement = Placement {
            x,
            y,
            width: width.min((self.width - x) as u32) as u16,
            height: height.min((self.height - y) as u32) as u16,
        };
        if placement.width > self.max_row_width {
            return Err(RenderError::RowTooWide {
                width: placement.width,
                max: self.max_row_width,
            });
        }
        Ok(placement)
    }
}

/// Panel rectangle covered by a decode, after clipping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Placement {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

/// Outcome of one decode step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RowStep {
    /// A full row is in the planes, destined for panel row `y`
    Row { y: u16 },
    /// The file ended mid-row; the partial row was discarded
    Truncated,
    /// All rows decoded
    Done,
}

/// Row-at-a-time decoder
///
/// Each call does a bounded amount of work (one row), so the caller can
/// reset the watchdog between calls.
pub trait RowDecoder {
    /// Panel area this decode writes
    fn placement(&self) -> Placement;

    /// Decode the next row into `planes`
    ///
    /// # Returns
    /// `RowStep::Row` with the panel row the planes belong to,
    /// `RowStep::Truncated` if the file ran out, or `RowStep::Done`.
    fn next_row(&mut self, planes: &mut BitPlaneWriter<'_>) -> Result<RowStep, RenderError>;
}
