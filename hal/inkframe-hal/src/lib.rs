//! Inkframe Hardware Abstraction Layer
//!
//! This crate defines the platform capabilities the image pipeline consumes.
//! Chip-specific HALs (RP2040, host simulators, etc.) implement them so the
//! same decode and render code runs everywhere.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  Application (inkframe-firmware, etc.)  │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  inkframe-core (decode, render, sched)  │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  inkframe-hal (this crate - traits)     │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │ inkframe-hal- │       │ mem (in-RAM   │
//! │    rp2040     │       │ host storage) │
//! └───────────────┘       └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`storage::Storage`], [`storage::ImageFile`] - Random-access image files
//! - [`watchdog::Watchdog`] - Hardware watchdog reset
//! - [`clock::Clock`] - Monotonic millisecond counter
//!
//! [`partition`] holds the header format shared by flash-backed storage.

#![no_std]
#![deny(unsafe_code)]

pub mod clock;
pub mod mem;
pub mod partition;
pub mod storage;
pub mod watchdog;

// Re-export key traits at crate root for convenience
pub use clock::Clock;
pub use partition::{PartitionError, PartitionHeader, PartitionKind};
pub use storage::{ImageFile, Storage, StorageError};
pub use watchdog::{FeedingDelay, Watchdog};
