//! Configuration persistence
//!
//! Loads the frame configuration from flash.
//! Falls back to embedded defaults if flash is empty or invalid.

use core::str;
use defmt::*;

use inkframe_core::config::{parse_config, ConfigError as ValidationError, FrameConfig, ParseError};
use inkframe_hal::StorageError;
use inkframe_hal_rp2040::flash::{FlashImageStorage, CONFIG_CAPACITY};

/// Embedded default configuration (compiled into firmware)
/// Edit frame.toml and rebuild to customize
pub const EMBEDDED_CONFIG: &str = include_str!("../../frame.toml");

/// Maximum TOML config size
const MAX_TOML_SIZE: usize = CONFIG_CAPACITY as usize;

/// Configuration persistence errors
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Flash operation failed
    Flash(StorageError),
    /// Invalid UTF-8 in TOML data
    InvalidUtf8,
    /// TOML parsing failed
    TomlParse(ParseError),
    /// Parsed, but unusable
    Invalid(ValidationError),
}

impl From<StorageError> for ConfigError {
    fn from(e: StorageError) -> Self {
        ConfigError::Flash(e)
    }
}

impl From<ParseError> for ConfigError {
    fn from(e: ParseError) -> Self {
        ConfigError::TomlParse(e)
    }
}

impl From<ValidationError> for ConfigError {
    fn from(e: ValidationError) -> Self {
        ConfigError::Invalid(e)
    }
}

/// Configuration persistence manager
///
/// Borrows the flash storage for the duration of the load; the storage is
/// handed to the frame afterwards.
pub struct ConfigPersistence<'a, 'd> {
    storage: &'a mut FlashImageStorage<'d>,
}

impl<'a, 'd> ConfigPersistence<'a, 'd> {
    /// Create a new config persistence manager
    pub fn new(storage: &'a mut FlashImageStorage<'d>) -> Self {
        Self { storage }
    }

    /// Load configuration from the flash config region
    pub fn load(&mut self) -> Result<FrameConfig, ConfigError> {
        info!("Loading configuration from flash...");

        let mut buffer = [0u8; MAX_TOML_SIZE];
        let len = self.storage.read_config(&mut buffer)?;
        debug!("Read {} bytes of TOML from flash", len);

        let toml_str = str::from_utf8(&buffer[..len]).map_err(|_| ConfigError::InvalidUtf8)?;
        parse_and_validate(toml_str)
    }
}

fn parse_and_validate(toml_str: &str) -> Result<FrameConfig, ConfigError> {
    let config = parse_config(toml_str)?;
    config.validate()?;
    Ok(config)
}

/// Load the configuration for this boot
///
/// Prefers flash, then the embedded `frame.toml`, then built-in defaults.
pub fn load_config(storage: &mut FlashImageStorage<'_>) -> FrameConfig {
    match ConfigPersistence::new(storage).load() {
        Ok(config) => {
            info!("Loaded configuration from flash");
            log_config_summary(&config);
            return config;
        }
        Err(ConfigError::Flash(StorageError::NotFound)) => {
            info!("No configuration in flash, using embedded defaults");
        }
        Err(e) => {
            warn!("Flash configuration rejected: {:?}, using embedded defaults", e);
        }
    }

    match parse_and_validate(EMBEDDED_CONFIG) {
        Ok(config) => {
            log_config_summary(&config);
            config
        }
        Err(e) => {
            // build.rs validates frame.toml, so this is a development error
            error!("Embedded configuration rejected: {:?}", e);
            FrameConfig::new()
        }
    }
}

/// Log a summary of the loaded configuration
fn log_config_summary(config: &FrameConfig) {
    info!("Configuration loaded successfully");
    debug!("  panel {}x{}", config.display.width, config.display.height);
    debug!(
        "  image {} ({:?}) at ({}, {})",
        config.image.path.as_str(),
        config.image.format,
        config.image.x,
        config.image.y
    );
    debug!(
        "  debounce {} ms, {:?}",
        config.refresh.debounce_ms,
        config.refresh.policy
    );
}
