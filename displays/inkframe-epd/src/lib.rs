//! Driver for the 7.5" 640x384 black/white/red e-paper panel
//!
//! The panel sits behind a UC8159-class controller that takes 4 bits per
//! pixel, two pixels per byte. This crate converts the pipeline's two row
//! planes into that format and implements
//! [`inkframe_core::RenderDriver`] over `embedded-hal` 1.0 SPI and GPIO.
//!
//! # Wiring
//!
//! - SPI (mode 0, chip select owned by the [`SpiDevice`](embedded_hal::spi::SpiDevice))
//! - DC: low for commands, high for data
//! - RST: active low
//! - BUSY: low while the controller is busy
//!
//! Refresh blocks in a BUSY poll loop for several seconds. Hand the driver
//! an `inkframe_hal::FeedingDelay` (or any delay that resets the
//! watchdog) so that wait never trips the watchdog.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

mod fmt;

pub mod pixel;
pub mod uc8159;

pub use uc8159::{PanelConfig, PowerState, Uc8159};
