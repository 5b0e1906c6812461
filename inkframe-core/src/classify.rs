//! Pixel classification
//!
//! Maps a decoded RGB triple onto the three inks the panel can show.
//! Luminance decides black versus white; a separate, looser saturation
//! test decides whether a dark pixel goes to the accent plane instead of
//! the black one.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Channel threshold for the "whitish" tests
pub const WHITE_THRESHOLD: u8 = 0x80;

/// Channel threshold for the "colored" test
pub const ACCENT_THRESHOLD: u8 = 0xF0;

/// A fully expanded 8-bit-per-channel color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(0xFF, 0xFF, 0xFF);
    pub const BLACK: Rgb = Rgb::new(0x00, 0x00, 0x00);

    /// Create a color from its channels
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Expand an RGB565 sample (bits 15-11 R, 10-5 G, 4-0 B)
    ///
    /// Each field is shifted up to the top of its byte; low bits stay zero,
    /// so full-scale red decodes as 0xF8, not 0xFF.
    pub const fn from_rgb565(raw: u16) -> Self {
        Self {
            r: ((raw & 0xF800) >> 8) as u8,
            g: ((raw & 0x07E0) >> 3) as u8,
            b: ((raw & 0x001F) << 3) as u8,
        }
    }

    /// Expand an RGB555 sample (bit 15 unused, 14-10 R, 9-5 G, 4-0 B)
    pub const fn from_rgb555(raw: u16) -> Self {
        Self {
            r: ((raw >> 7) & 0xF8) as u8,
            g: ((raw >> 2) & 0xF8) as u8,
            b: ((raw << 3) & 0xF8) as u8,
        }
    }

    /// Sum of the three channels
    pub const fn luma_sum(&self) -> u16 {
        self.r as u16 + self.g as u16 + self.b as u16
    }
}

/// Rule used for the "whitish" predicate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Whiteness {
    /// Every channel above the threshold
    Channel,
    /// Channel sum above three times the threshold
    #[default]
    Luminance,
}

/// Ink a pixel is rendered with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PixelClass {
    White,
    Black,
    Accent,
}

/// Raw outcome of the two predicates
///
/// Both flags are independent; [`Classifier::resolve`] decides which one
/// wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Classification {
    pub whitish: bool,
    pub colored: bool,
}

/// Pixel classifier
///
/// Pure and total over all 24-bit inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Classifier {
    whiteness: Whiteness,
    accent: bool,
}

impl Classifier {
    /// Classifier for a given color mode
    ///
    /// With color enabled a pixel is whitish only if all three channels are
    /// bright; without color the channel sum decides.
    pub const fn new(color_mode: bool) -> Self {
        Self {
            whiteness: if color_mode {
                Whiteness::Channel
            } else {
                Whiteness::Luminance
            },
            accent: color_mode,
        }
    }

    /// Classifier with an explicit whiteness rule
    pub const fn with_rule(whiteness: Whiteness, accent: bool) -> Self {
        Self { whiteness, accent }
    }

    /// Whether dark colored pixels go to the accent plane
    pub const fn accent_enabled(&self) -> bool {
        self.accent
    }

    /// Whiteness rule in use
    pub const fn whiteness(&self) -> Whiteness {
        self.whiteness
    }

    /// Evaluate both predicates
    pub const fn classify(&self, rgb: Rgb) -> Classification {
        let whitish = match self.whiteness {
            Whiteness::Channel => {
                rgb.r > WHITE_THRESHOLD && rgb.g > WHITE_THRESHOLD && rgb.b > WHITE_THRESHOLD
            }
            Whiteness::Luminance => rgb.luma_sum() > 3 * WHITE_THRESHOLD as u16,
        };
        let colored =
            rgb.r > ACCENT_THRESHOLD || (rgb.g > ACCENT_THRESHOLD && rgb.b > ACCENT_THRESHOLD);
        Classification { whitish, colored }
    }

    /// Decide the ink for a pair of predicates
    ///
    /// Whitish always wins; `colored` only counts when accent is enabled.
    pub const fn resolve(&self, c: Classification) -> PixelClass {
        if c.whitish {
            PixelClass::White
        } else if c.colored && self.accent {
            PixelClass::Accent
        } else {
            PixelClass::Black
        }
    }

    /// Classify and resolve in one step
    pub const fn class_of(&self, rgb: Rgb) -> PixelClass {
        self.resolve(self.classify(rgb))
    }
}
