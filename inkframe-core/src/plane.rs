//! Row bit-plane packing
//!
//! The panel takes two planes per row: a mono plane (bit 0 = black) and a
//! color plane (bit 0 = accent). Bits are packed MSB-first, byte index
//! `col / 8`, and both planes start out all-ones (white).

use crate::classify::PixelClass;

/// Bytes needed for one plane of a row `width` pixels wide
pub const fn plane_bytes(width: u16) -> usize {
    (width as usize).div_ceil(8)
}

/// A finished row, ready for the display driver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowPlanes<'a> {
    /// Mono plane, bit cleared for black pixels
    pub mono: &'a [u8],
    /// Color plane, bit cleared for accent pixels
    pub color: &'a [u8],
    /// Row width in pixels
    pub width: u16,
}

/// Row does not fit the plane buffers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RowTooWide {
    pub width: u16,
    pub capacity: u16,
}

/// Accumulates one row of classified pixels into two packed planes
///
/// The plane buffers are borrowed from the caller and reused for every
/// row; nothing is allocated per row.
#[derive(Debug)]
pub struct BitPlaneWriter<'a> {
    mono: &'a mut [u8],
    color: &'a mut [u8],
    width: u16,
}

impl<'a> BitPlaneWriter<'a> {
    /// Wrap caller-provided plane buffers
    pub fn new(mono: &'a mut [u8], color: &'a mut [u8]) -> Self {
        Self {
            mono,
            color,
            width: 0,
        }
    }

    /// Widest row (in pixels) the buffers can hold
    pub fn capacity(&self) -> u16 {
        let bytes = self.mono.len().min(self.color.len());
        (bytes * 8).min(u16::MAX as usize) as u16
    }

    /// Width of the row in progress
    pub fn width(&self) -> u16 {
        self.width
    }

    /// Start a new row, resetting both planes to white
    pub fn begin_row(&mut self, width: u16) -> Result<(), RowTooWide> {
        let capacity = self.capacity();
        if width > capacity {
            return Err(RowTooWide { width, capacity });
        }
        let bytes = plane_bytes(width);
        self.mono[..bytes].fill(0xFF);
        self.color[..bytes].fill(0xFF);
        self.width = width;
        Ok(())
    }

    /// Record one pixel from its two predicates
    ///
    /// Whitish leaves both bits set. Otherwise a colored pixel clears its
    /// color bit and any other pixel clears its mono bit. Columns past the
    /// row width are ignored.
    pub fn set_pixel(&mut self, col: u16, whitish: bool, colored: bool) {
        if col >= self.width || whitish {
            return;
        }
        let idx = col as usize / 8;
        let mask = !(0x80u8 >> (col % 8));
        if colored {
            self.color[idx] &= mask;
        } else {
            self.mono[idx] &= mask;
        }
    }

    /// Record one pixel from its resolved ink
    pub fn set_class(&mut self, col: u16, class: PixelClass) {
        match class {
            PixelClass::White => self.set_pixel(col, true, false),
            PixelClass::Black => self.set_pixel(col, false, false),
            PixelClass::Accent => self.set_pixel(col, false, true),
        }
    }

    /// Finish the row and borrow its planes
    pub fn end_row(&self) -> RowPlanes<'_> {
        let bytes = plane_bytes(self.width);
        RowPlanes {
            mono: &self.mono[..bytes],
            color: &self.color[..bytes],
            width: self.width,
        }
    }
}
