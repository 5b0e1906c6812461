//! Configuration type definitions
//!
//! These types represent the frame configuration. It is written as TOML,
//! embedded in the firmware image and optionally overridden from flash.

use heapless::String;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::decode::{ImageFormat, Surface};
use crate::frame::MAX_ROW_WIDTH;
use crate::scheduler::{RefreshPolicy, DEFAULT_DEBOUNCE_MS};

/// Maximum image path length
pub const MAX_PATH_LEN: usize = 32;

/// Default image path
pub const DEFAULT_IMAGE_PATH: &str = "image.bin";

/// Panel geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DisplayConfig {
    /// Panel width in pixels
    pub width: u16,
    /// Panel height in pixels
    pub height: u16,
    /// Widest row a decode may produce
    pub max_row_width: u16,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 384,
            max_row_width: MAX_ROW_WIDTH,
        }
    }
}

/// Image drawn by scheduled renders
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ImageConfig {
    /// Path in image storage
    pub path: String<MAX_PATH_LEN>,
    /// Encoding of the stored file
    pub format: ImageFormat,
    /// Raw image width (ignored for BMP, which carries its own)
    pub width: u16,
    /// Raw image height (ignored for BMP)
    pub height: u16,
    /// Panel column of the left edge
    pub x: u16,
    /// Panel row of the top edge
    pub y: u16,
    /// Use the accent color
    pub color: bool,
}

impl Default for ImageConfig {
    fn default() -> Self {
        let mut path = String::new();
        let _ = path.push_str(DEFAULT_IMAGE_PATH);
        Self {
            path,
            format: ImageFormat::Raw565,
            width: 640,
            height: 384,
            x: 0,
            y: 0,
            color: true,
        }
    }
}

/// Refresh scheduling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RefreshConfig {
    /// Delay between scheduling and firing a render
    pub debounce_ms: u32,
    /// Behavior on changes while a render is scheduled
    pub policy: RefreshPolicy,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            policy: RefreshPolicy::SingleFlight,
        }
    }
}

/// Hardware watchdog
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WatchdogConfig {
    /// Reboot if not reset within this time
    pub timeout_ms: u32,
}

impl Default for WatchdogConfig {
    fn default() -> Self {
        Self { timeout_ms: 8000 }
    }
}

/// Status LED
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StatusConfig {
    /// Time between LED toggles
    pub led_interval_ms: u32,
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            led_interval_ms: 500,
        }
    }
}

/// Configuration rejected by [`FrameConfig::validate`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// A panel or image dimension is zero
    ZeroDimension,
    /// Debounce of 0 would fire in the same tick as the upload
    ZeroDebounce,
    /// Watchdog or LED interval is zero
    ZeroInterval,
    /// Row width above the compiled plane buffers
    RowWidthTooLarge { requested: u16, capacity: u16 },
    /// No image path
    EmptyPath,
}

/// Complete frame configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FrameConfig {
    pub display: DisplayConfig,
    pub image: ImageConfig,
    pub refresh: RefreshConfig,
    pub watchdog: WatchdogConfig,
    pub status: StatusConfig,
}

impl FrameConfig {
    /// Create a configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Check the configuration can drive a render
    pub fn validate(&self) -> Result<(), ConfigError> {
        let d = &self.display;
        if d.width == 0 || d.height == 0 || d.max_row_width == 0 {
            return Err(ConfigError::ZeroDimension);
        }
        if self.image.format == ImageFormat::Raw565 && (self.image.width == 0 || self.image.height == 0) {
            return Err(ConfigError::ZeroDimension);
        }
        if d.max_row_width > MAX_ROW_WIDTH {
            return Err(ConfigError::RowWidthTooLarge {
                requested: d.max_row_width,
                capacity: MAX_ROW_WIDTH,
            });
        }
        if self.refresh.debounce_ms == 0 {
            return Err(ConfigError::ZeroDebounce);
        }
        if self.watchdog.timeout_ms == 0 || self.status.led_interval_ms == 0 {
            return Err(ConfigError::ZeroInterval);
        }
        if self.image.path.is_empty() {
            return Err(ConfigError::EmptyPath);
        }
        Ok(())
    }

    /// Drawable area for the configured panel
    ///
    /// The panel's own extent may be smaller than the configured one; the
    /// caller should intersect with the driver's.
    pub fn surface(&self) -> Surface {
        Surface {
            width: self.display.width,
            height: self.display.height,
            max_row_width: self.display.max_row_width,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = FrameConfig::new();
        assert_eq!(config.display.width, 640);
        assert_eq!(config.display.height, 384);
        assert_eq!(config.image.path.as_str(), "image.bin");
        assert_eq!(config.image.format, ImageFormat::Raw565);
        assert!(config.image.color);
        assert_eq!(config.refresh.debounce_ms, 1000);
        assert_eq!(config.refresh.policy, RefreshPolicy::SingleFlight);
        assert_eq!(config.status.led_interval_ms, 500);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects() {
        let mut config = FrameConfig::new();
        config.display.height = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroDimension));

        let mut config = FrameConfig::new();
        config.display.max_row_width = MAX_ROW_WIDTH + 8;
        assert_eq!(
            config.validate(),
            Err(ConfigError::RowWidthTooLarge {
                requested: MAX_ROW_WIDTH + 8,
                capacity: MAX_ROW_WIDTH
            })
        );

        let mut config = FrameConfig::new();
        config.refresh.debounce_ms = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroDebounce));

        let mut config = FrameConfig::new();
        config.image.path.clear();
        assert_eq!(config.validate(), Err(ConfigError::EmptyPath));
    }

    #[test]
    fn test_bmp_ignores_raw_dimensions() {
        let mut config = FrameConfig::new();
        config.image.format = ImageFormat::Bmp;
        config.image.width = 0;
        assert!(config.validate().is_ok());
    }
}
