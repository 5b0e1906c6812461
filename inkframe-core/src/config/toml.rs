//! Simple TOML parser for frame configuration
//!
//! This is a minimal TOML parser that handles only the subset needed for
//! the frame configuration. It does NOT support the full TOML language and
//! never allocates.
//!
//! Supported features:
//! - Key = value pairs (string, integer, boolean)
//! - [section] headers
//! - Comments (# ...), including after a value
//!
//! NOT supported:
//! - Arrays and inline tables
//! - Multi-line strings and escapes
//! - Dotted keys

use heapless::String;

use super::types::{FrameConfig, MAX_PATH_LEN};
use crate::decode::ImageFormat;
use crate::scheduler::RefreshPolicy;

/// Parse error, with the 1-based line it occurred on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseError {
    /// Unknown or malformed section header
    InvalidSection(usize),
    /// Value of the wrong type or out of range
    InvalidValue(usize),
    /// String longer than its fixed capacity
    ValueTooLong(usize),
    /// Line is neither a header nor `key = value`
    Syntax(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Root,
    Display,
    Image,
    Refresh,
    Watchdog,
    Status,
}

/// Parse TOML configuration into a [`FrameConfig`]
///
/// Keys missing from the input keep their defaults. Unknown keys are
/// ignored so newer files still load on older firmware.
pub fn parse_config(input: &str) -> Result<FrameConfig, ParseError> {
    let mut config = FrameConfig::new();
    let mut section = Section::Root;

    for (idx, line) in input.lines().enumerate() {
        let line_no = idx + 1;
        let line = line.trim();

        // Skip empty lines and comments
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if line.starts_with('[') {
            section = parse_section_header(line).ok_or(ParseError::InvalidSection(line_no))?;
            continue;
        }

        let (key, value) = parse_key_value(line).ok_or(ParseError::Syntax(line_no))?;
        apply_value(section, key, value, &mut config).map_err(|e| e.at(line_no))?;
    }

    Ok(config)
}

/// Error raised while applying a single value, before the line is known
enum ValueError {
    Invalid,
    TooLong,
}

impl ValueError {
    fn at(self, line: usize) -> ParseError {
        match self {
            ValueError::Invalid => ParseError::InvalidValue(line),
            ValueError::TooLong => ParseError::ValueTooLong(line),
        }
    }
}

fn parse_section_header(line: &str) -> Option<Section> {
    let name = line.strip_prefix('[')?.strip_suffix(']')?.trim();
    match name {
        "display" => Some(Section::Display),
        "image" => Some(Section::Image),
        "refresh" => Some(Section::Refresh),
        "watchdog" => Some(Section::Watchdog),
        "status" => Some(Section::Status),
        _ => None,
    }
}

fn parse_key_value(line: &str) -> Option<(&str, &str)> {
    let eq_pos = line.find('=')?;
    let key = line[..eq_pos].trim();
    let value = line[eq_pos + 1..].trim();

    // Remove inline comments
    let value = match value.find('#') {
        // Make sure # is not inside a string
        Some(hash_pos) if value[..hash_pos].matches('"').count() % 2 == 0 => {
            value[..hash_pos].trim()
        }
        _ => value,
    };

    if key.is_empty() || value.is_empty() {
        return None;
    }

    Some((key, value))
}

fn parse_string(value: &str) -> &str {
    if value.starts_with('"') && value.ends_with('"') && value.len() >= 2 {
        &value[1..value.len() - 1]
    } else {
        // Allow unquoted strings for simple values
        value
    }
}

fn parse_int<T: core::str::FromStr>(value: &str) -> Result<T, ValueError> {
    value.parse().map_err(|_| ValueError::Invalid)
}

fn parse_bool(value: &str) -> Result<bool, ValueError> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(ValueError::Invalid),
    }
}

fn parse_path(value: &str) -> Result<String<MAX_PATH_LEN>, ValueError> {
    let mut path = String::new();
    path.push_str(parse_string(value))
        .map_err(|_| ValueError::TooLong)?;
    Ok(path)
}

fn parse_format(value: &str) -> Result<ImageFormat, ValueError> {
    match parse_string(value) {
        "raw565" | "raw" => Ok(ImageFormat::Raw565),
        "bmp" => Ok(ImageFormat::Bmp),
        _ => Err(ValueError::Invalid),
    }
}

fn parse_policy(value: &str) -> Result<RefreshPolicy, ValueError> {
    match parse_string(value) {
        "single-flight" => Ok(RefreshPolicy::SingleFlight),
        "rearm" => Ok(RefreshPolicy::Rearm),
        _ => Err(ValueError::Invalid),
    }
}

fn apply_value(
    section: Section,
    key: &str,
    value: &str,
    config: &mut FrameConfig,
) -> Result<(), ValueError> {
    match section {
        Section::Display => match key {
            "width" => config.display.width = parse_int(value)?,
            "height" => config.display.height = parse_int(value)?,
            "max_row_width" => config.display.max_row_width = parse_int(value)?,
            _ => {} // Ignore unknown keys
        },
        Section::Image => match key {
            "path" => config.image.path = parse_path(value)?,
            "format" => config.image.format = parse_format(value)?,
            "width" => config.image.width = parse_int(value)?,
            "height" => config.image.height = parse_int(value)?,
            "x" => config.image.x = parse_int(value)?,
            "y" => config.image.y = parse_int(value)?,
            "color" => config.image.color = parse_bool(value)?,
            _ => {}
        },
        Section::Refresh => match key {
            "debounce_ms" => config.refresh.debounce_ms = parse_int(value)?,
            "policy" => config.refresh.policy = parse_policy(value)?,
            _ => {}
        },
        Section::Watchdog => {
            if key == "timeout_ms" {
                config.watchdog.timeout_ms = parse_int(value)?;
            }
        }
        Section::Status => {
            if key == "led_interval_ms" {
                config.status.led_interval_ms = parse_int(value)?;
            }
        }
        Section::Root => {
            // No root-level keys
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
# Frame configuration
[display]
width = 640
height = 384
max_row_width = 640

[image]
path = "photo.bmp"   # uploaded by the web UI
format = "bmp"
x = 16
y = 8
color = false

[refresh]
debounce_ms = 2500
policy = "rearm"

[watchdog]
timeout_ms = 6000

[status]
led_interval_ms = 250
"#;

    #[test]
    fn test_parse_full() {
        let config = parse_config(SAMPLE).unwrap();
        assert_eq!(config.image.path.as_str(), "photo.bmp");
        assert_eq!(config.image.format, ImageFormat::Bmp);
        assert_eq!((config.image.x, config.image.y), (16, 8));
        assert!(!config.image.color);
        assert_eq!(config.refresh.debounce_ms, 2500);
        assert_eq!(config.refresh.policy, RefreshPolicy::Rearm);
        assert_eq!(config.watchdog.timeout_ms, 6000);
        assert_eq!(config.status.led_interval_ms, 250);
        // Untouched keys keep defaults
        assert_eq!(config.image.width, 640);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_input_is_default() {
        assert_eq!(parse_config("").unwrap(), FrameConfig::new());
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let config = parse_config("[display]\nrotation = 90\nwidth = 800\n").unwrap();
        assert_eq!(config.display.width, 800);
    }

    #[test]
    fn test_errors_carry_line_numbers() {
        assert_eq!(
            parse_config("[display]\nwidth = wide\n"),
            Err(ParseError::InvalidValue(2))
        );
        assert_eq!(parse_config("\n[network]\n"), Err(ParseError::InvalidSection(2)));
        assert_eq!(parse_config("[image]\njust words\n"), Err(ParseError::Syntax(2)));
        assert_eq!(
            parse_config("[image]\npath = \"a/very/long/path/that/does/not/fit.bin\"\n"),
            Err(ParseError::ValueTooLong(2))
        );
        assert_eq!(
            parse_config("[refresh]\npolicy = \"sometimes\"\n"),
            Err(ParseError::InvalidValue(2))
        );
    }

    #[test]
    fn test_parse_key_value() {
        assert_eq!(parse_key_value("a = 1 # note"), Some(("a", "1")));
        assert_eq!(parse_key_value("p = \"x#y\""), Some(("p", "\"x#y\"")));
        assert_eq!(parse_key_value("= 1"), None);
        assert_eq!(parse_key_value("novalue"), None);
    }

    #[test]
    fn test_out_of_range_integer() {
        assert_eq!(
            parse_config("[display]\nwidth = 70000\n"),
            Err(ParseError::InvalidValue(2))
        );
    }
}
