//! Controller pixel format
//!
//! Each byte carries two pixels, the left one in the high nibble.

use inkframe_core::plane::RowPlanes;

/// Nibble for a black pixel
pub const BLACK: u8 = 0x0;
/// Nibble for a white pixel
pub const WHITE: u8 = 0x3;
/// Nibble for an accent (red) pixel
pub const ACCENT: u8 = 0x4;

/// Byte for two white pixels, used to clear the panel
pub const WHITE_PAIR: u8 = pair(WHITE, WHITE);

/// Pack two pixel nibbles into one byte
pub const fn pair(left: u8, right: u8) -> u8 {
    (left << 4) | (right & 0x0F)
}

/// Nibble for column `col` of a finished row
///
/// A cleared mono bit wins over a cleared color bit. Columns past the row
/// width read as white.
pub fn ink(planes: &RowPlanes<'_>, col: u16) -> u8 {
    if col >= planes.width {
        return WHITE;
    }
    let idx = col as usize / 8;
    let mask = 0x80u8 >> (col % 8);
    if planes.mono[idx] & mask == 0 {
        BLACK
    } else if planes.color[idx] & mask == 0 {
        ACCENT
    } else {
        WHITE
    }
}
