//! Frame configuration
//!
//! Board-agnostic configuration structures and a small TOML reader for
//! them.

pub mod toml;
pub mod types;

pub use toml::{parse_config, ParseError};
pub use types::*;
