//! Build script for lcd20x4-bridge
//!
//! Validates the embedded bridge.toml at compile time

use std::fs;
use std::path::Path;

const KNOWN_KEYS: [&str; 5] = ["address", "port", "uid", "debug", "glyph_file"];

fn main() {
    validate_config();
}

/// Validate bridge.toml at compile time
fn validate_config() {
    println!("cargo:rerun-if-changed=bridge.toml");
    println!("cargo:rerun-if-changed=build.rs");

    let config_path = Path::new("bridge.toml");

    let config_content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Failed to read bridge.toml                               ║\n\
                ║                                                                  ║\n\
                ║  Error: {:<56} ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                e
            );
        }
    };

    let config: toml::Table = match toml::from_str(&config_content) {
        Ok(table) => table,
        Err(e) => {
            let error_msg = e.to_string();
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Invalid TOML syntax in bridge.toml                       ║\n\
                ╠══════════════════════════════════════════════════════════════════╣\n\
                {}\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                format_error_lines(&error_msg)
            );
        }
    };

    let errors = check_values(&config);
    if !errors.is_empty() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: Invalid bridge configuration                             ║\n\
            ╠══════════════════════════════════════════════════════════════════╣\n\
            {}\n\
            ╚══════════════════════════════════════════════════════════════════╝\n",
            errors
                .iter()
                .map(|e| format!("║  • {:<62} ║", e))
                .collect::<Vec<_>>()
                .join("\n")
        );
    }
}

/// Format error message lines with box drawing
fn format_error_lines(msg: &str) -> String {
    msg.lines()
        .map(|line| {
            // Counted in chars; TOML errors quote the offending line verbatim
            let truncated = if line.chars().count() > 64 {
                format!("{}...", line.chars().take(61).collect::<String>())
            } else {
                line.to_string()
            };
            format!("║  {:<64} ║", truncated)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Check keys and value types
fn check_values(config: &toml::Table) -> Vec<String> {
    let mut errors = Vec::new();

    for key in config.keys() {
        if !KNOWN_KEYS.contains(&key.as_str()) {
            errors.push(format!("unknown key '{}'", key));
        }
    }

    for key in ["address", "uid", "glyph_file"] {
        if let Some(value) = config.get(key) {
            if !value.is_str() {
                errors.push(format!("'{}' must be a string", key));
            }
        }
    }

    match config.get("port") {
        Some(toml::Value::Integer(port)) if !(1..=65535).contains(port) => {
            errors.push("port must be 1-65535".to_string());
        }
        Some(toml::Value::Integer(_)) | None => {}
        Some(_) => errors.push("port must be an integer".to_string()),
    }

    if let Some(value) = config.get("debug") {
        if !value.is_bool() {
            errors.push("debug must be true or false".to_string());
        }
    }

    errors
}
