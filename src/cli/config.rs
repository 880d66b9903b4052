//! Config command handlers

use crate::cli::ConfigInitArgs;
use crate::config::{ConfigError, TelewireConfig};
use std::fs;

const EXAMPLE_CONFIG: &str = include_str!("../../telewire.example.toml");

/// Render the annotated example config, pointing `[connection] url` at
/// `url` when one is given.
///
/// The result is parsed and validated before it is returned, so a bad URL
/// never reaches disk.
pub fn render_config(url: Option<&str>) -> Result<String, ConfigError> {
    let rendered = match url {
        Some(url) => {
            let quoted = toml::Value::String(url.to_string()).to_string();
            let mut in_connection = false;
            let mut replaced = false;
            let mut lines = Vec::new();
            for line in EXAMPLE_CONFIG.lines() {
                let trimmed = line.trim_start();
                if trimmed.starts_with('[') {
                    in_connection = trimmed.starts_with("[connection]");
                }
                if in_connection && !replaced && trimmed.starts_with("url =") {
                    lines.push(format!("url = {}", quoted));
                    replaced = true;
                } else {
                    lines.push(line.to_string());
                }
            }
            lines.join("\n") + "\n"
        }
        None => EXAMPLE_CONFIG.to_string(),
    };

    let config: TelewireConfig =
        toml::from_str(&rendered).map_err(|e| ConfigError::Parse(e.to_string()))?;
    config.validate()?;
    Ok(rendered)
}

/// Handle `telewire config init` command
pub fn handle_config_init(args: &ConfigInitArgs) -> Result<(), Box<dyn std::error::Error>> {
    if args.output.exists() && !args.force {
        return Err(format!(
            "File already exists: {}. Use --force to overwrite.",
            args.output.display()
        )
        .into());
    }

    let rendered = render_config(args.url.as_deref())?;
    if let Some(parent) = args.output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(&args.output, rendered)?;

    println!("✓ Configuration file created: {}", args.output.display());
    if args.url.is_none() {
        println!("  Set [connection] url to your server's admin address.");
    }

    Ok(())
}
