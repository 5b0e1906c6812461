//! Board-agnostic image pipeline for the e-paper frame firmware
//!
//! This crate contains all application logic that does not depend on
//! specific hardware implementations:
//!
//! - Pixel classification into white / black / accent
//! - Row bit-plane packing in the panel's native two-plane format
//! - Streaming BMP and raw RGB565 decoders (one row per step)
//! - The render loop with its watchdog reset cadence
//! - The debounced refresh scheduler
//! - The `Frame` context tying storage, panel and scheduler together
//! - Configuration type definitions and parser
//! - Display driver trait

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

mod fmt;

pub mod classify;
pub mod config;
pub mod decode;
pub mod frame;
pub mod plane;
pub mod render;
pub mod scheduler;
pub mod traits;

#[cfg(test)]
mod testing;

pub use classify::{Classifier, PixelClass, Rgb, Whiteness};
pub use frame::{Frame, RowBuffers};
pub use plane::BitPlaneWriter;
pub use render::{RenderError, RenderReport};
pub use scheduler::{RefreshPolicy, RefreshScheduler, RefreshState};
pub use traits::{DriverError, RenderDriver};
