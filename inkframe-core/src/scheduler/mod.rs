//! Refresh scheduler
//!
//! Decouples "a new image is available" from "the panel refreshes", so a
//! render never starts while the upload that triggered it is still
//! writing the file.

pub mod refresh;

pub use refresh::{RefreshPolicy, RefreshScheduler, RefreshState, DEFAULT_DEBOUNCE_MS};
