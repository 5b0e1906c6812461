//! RP2040-specific HAL for the e-paper frame firmware
//!
//! This crate provides RP2040 implementations of the shared
//! `inkframe-hal` traits:
//!
//! - Flash-partition image storage and the configuration region
//!   (implements `inkframe_hal::Storage`)
//! - A shared handle to the hardware watchdog (implements
//!   `inkframe_hal::Watchdog`)
//! - The embassy time driver as a millisecond clock

#![no_std]

pub mod clock;
pub mod flash;
pub mod watchdog;

pub use clock::EmbassyClock;
pub use flash::{FlashImageFile, FlashImageStorage};
pub use watchdog::RpWatchdog;
