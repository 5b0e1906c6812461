//! Build script for inkframe-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Validates frame.toml at compile time

use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Row width the firmware's decode buffers are compiled for
const MAX_ROW_WIDTH: i64 = 640;

/// Longest image path the configuration holds
const MAX_PATH_LEN: usize = 32;

fn main() {
    setup_linker();
    validate_config();
}

/// Set up linker search paths for memory.x
fn setup_linker() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    // Copy memory.x to the output directory
    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).unwrap();
    f.write_all(memory_x).unwrap();

    // Tell rustc where to find memory.x
    println!("cargo:rustc-link-search={}", out_dir.display());

    // Re-run if memory.x changes
    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Validate frame.toml configuration at compile time
fn validate_config() {
    // Re-run if frame.toml changes
    println!("cargo:rerun-if-changed=frame.toml");

    let config_path = Path::new("frame.toml");

    if !config_path.exists() {
        fail(
            "frame.toml not found!",
            &["The firmware embeds frame.toml as its default configuration.".to_string()],
        );
    }

    let config_content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => fail("Failed to read frame.toml", &[e.to_string()]),
    };

    // Parse and validate TOML syntax
    let config: toml::Value = match toml::from_str(&config_content) {
        Ok(value) => value,
        Err(e) => fail(
            "Invalid TOML syntax in frame.toml",
            &e.to_string().lines().map(str::to_string).collect::<Vec<_>>(),
        ),
    };

    let mut errors = Vec::new();
    validate_display(&config, &mut errors);
    validate_image(&config, &mut errors);
    validate_refresh(&config, &mut errors);
    validate_positive(&config, "watchdog", "timeout_ms", &mut errors);
    validate_positive(&config, "status", "led_interval_ms", &mut errors);

    if !errors.is_empty() {
        fail("Invalid configuration in frame.toml", &errors);
    }

    println!("cargo:warning=frame.toml validated successfully");
}

/// Print a boxed error report and abort the build
fn fail(title: &str, lines: &[String]) -> ! {
    let body = lines
        .iter()
        .map(|line| {
            let truncated = if line.len() > 62 {
                format!("{}...", &line[..59])
            } else {
                line.to_string()
            };
            format!("║  • {:<62} ║", truncated)
        })
        .collect::<Vec<_>>()
        .join("\n");
    panic!(
        "\n\
        ╔══════════════════════════════════════════════════════════════════╗\n\
        ║  ERROR: {:<56} ║\n\
        ╠══════════════════════════════════════════════════════════════════╣\n\
        {}\n\
        ╚══════════════════════════════════════════════════════════════════╝\n",
        title, body
    );
}

/// Integer `key` of `[section]`, if present
fn integer(config: &toml::Value, section: &str, key: &str, errors: &mut Vec<String>) -> Option<i64> {
    match config.get(section).and_then(|s| s.get(key)) {
        Some(toml::Value::Integer(v)) => Some(*v),
        Some(_) => {
            errors.push(format!("[{}] {} must be an integer", section, key));
            None
        }
        None => None,
    }
}

/// String `key` of `[section]`, if present
fn string<'a>(config: &'a toml::Value, section: &str, key: &str, errors: &mut Vec<String>) -> Option<&'a str> {
    match config.get(section).and_then(|s| s.get(key)) {
        Some(toml::Value::String(v)) => Some(v.as_str()),
        Some(_) => {
            errors.push(format!("[{}] {} must be a string", section, key));
            None
        }
        None => None,
    }
}

fn validate_positive(config: &toml::Value, section: &str, key: &str, errors: &mut Vec<String>) {
    if let Some(v) = integer(config, section, key, errors) {
        if v <= 0 || v > u32::MAX as i64 {
            errors.push(format!("[{}] {} must be 1-{}", section, key, u32::MAX));
        }
    }
}

fn validate_dimension(config: &toml::Value, section: &str, key: &str, errors: &mut Vec<String>) {
    if let Some(v) = integer(config, section, key, errors) {
        if v <= 0 || v > u16::MAX as i64 {
            errors.push(format!("[{}] {} must be 1-{}", section, key, u16::MAX));
        }
    }
}

/// Validate the panel geometry
fn validate_display(config: &toml::Value, errors: &mut Vec<String>) {
    validate_dimension(config, "display", "width", errors);
    validate_dimension(config, "display", "height", errors);
    validate_dimension(config, "display", "max_row_width", errors);

    if let Some(w) = integer(config, "display", "max_row_width", errors) {
        if w > MAX_ROW_WIDTH {
            errors.push(format!("[display] max_row_width must be at most {}", MAX_ROW_WIDTH));
        }
    }
}

/// Validate the image placement and encoding
fn validate_image(config: &toml::Value, errors: &mut Vec<String>) {
    if let Some(path) = string(config, "image", "path", errors) {
        if path.is_empty() || path.len() > MAX_PATH_LEN {
            errors.push(format!("[image] path must be 1-{} bytes", MAX_PATH_LEN));
        }
    }

    if let Some(format) = string(config, "image", "format", errors) {
        if !["raw565", "raw", "bmp"].contains(&format) {
            errors.push("[image] format must be 'raw565' or 'bmp'".to_string());
        }
    }

    validate_dimension(config, "image", "width", errors);
    validate_dimension(config, "image", "height", errors);

    for key in ["x", "y"] {
        if let Some(v) = integer(config, "image", key, errors) {
            if v < 0 || v > u16::MAX as i64 {
                errors.push(format!("[image] {} must be 0-{}", key, u16::MAX));
            }
        }
    }

    match config.get("image").and_then(|s| s.get("color")) {
        Some(toml::Value::Boolean(_)) | None => {}
        Some(_) => errors.push("[image] color must be true or false".to_string()),
    }
}

/// Validate the refresh scheduling
fn validate_refresh(config: &toml::Value, errors: &mut Vec<String>) {
    validate_positive(config, "refresh", "debounce_ms", errors);

    if let Some(policy) = string(config, "refresh", "policy", errors) {
        if !["single-flight", "rearm"].contains(&policy) {
            errors.push("[refresh] policy must be 'single-flight' or 'rearm'".to_string());
        }
    }
}
