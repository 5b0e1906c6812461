//! Configuration loading
//!
//! Loads the frame configuration from the flash config region, falling
//! back to the `frame.toml` embedded at build time. Parsing lives in
//! `inkframe_core::config`.

pub mod loader;

pub use loader::{load_config, ConfigPersistence};
