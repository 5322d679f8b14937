//! Configuration commands.

use super::get_paths;
use anyhow::{Context, Result};
use colored::Colorize;
use leakdex_config::{Config, FlattenPolicy};

pub fn show() -> Result<()> {
    let paths = get_paths()?;

    println!("{}", "Current Configuration".cyan().bold());
    println!("{}", "─".repeat(50));

    if paths.config_file.exists() {
        let contents =
            std::fs::read_to_string(&paths.config_file).context("Failed to read config file")?;
        println!("{}", contents);
    } else {
        println!(
            "{}",
            "No config file yet, showing defaults. Run 'leakdex init' to create one.".dimmed()
        );
        println!();
        println!("{}", Config::default_config_string());
    }

    Ok(())
}

pub fn path() -> Result<()> {
    let paths = get_paths()?;
    println!("{}", paths.config_file.display());
    Ok(())
}

pub fn set(key: &str, value: &str) -> Result<()> {
    let paths = get_paths()?;

    let mut config = Config::load_from(&paths.config_file).context("Failed to load config")?;

    let parts: Vec<&str> = key.split('.').collect();

    match parts.as_slice() {
        ["search", "url"] => config.search.url = value.to_string(),
        ["search", "index"] => config.search.index = value.to_string(),
        ["search", "username"] => config.search.username = optional(value),
        ["search", "password"] => config.search.password = optional(value),
        ["search", "timeout_seconds"] => {
            config.search.timeout_seconds = value.parse().context("Invalid timeout value")?;
        }
        ["ingest", "max_line_bytes"] => {
            config.ingest.max_line_bytes =
                value.parse().context("Invalid max_line_bytes value")?;
        }
        ["ingest", "min_line_chars"] => {
            config.ingest.min_line_chars =
                value.parse().context("Invalid min_line_chars value")?;
        }
        ["ingest", "csv_delimiter"] => {
            let mut chars = value.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => config.ingest.csv_delimiter = c,
                _ => anyhow::bail!("csv_delimiter must be a single character"),
            }
        }
        ["ingest", "flatten"] => config.ingest.flatten = value.parse::<FlattenPolicy>()?,
        ["ingest", "queue_capacity"] => {
            config.ingest.queue_capacity =
                value.parse().context("Invalid queue_capacity value")?;
        }
        ["ingest", "sink_concurrency"] => {
            config.ingest.sink_concurrency =
                value.parse().context("Invalid sink_concurrency value")?;
        }
        ["ingest", "await_sink"] => {
            config.ingest.await_sink = value.parse().context("Invalid boolean value")?;
        }
        ["ingest", "stamp_upload_date"] => {
            config.ingest.stamp_upload_date = value.parse().context("Invalid boolean value")?;
        }
        ["ui", "color"] => {
            config.ui.color = value.parse().context("Invalid boolean value")?;
        }
        _ => {
            anyhow::bail!("Unknown config key: {}", key);
        }
    }

    config
        .save_to(&paths.config_file)
        .context("Failed to save config")?;

    let shown = if key == "search.password" { "********" } else { value };
    println!("{} Set {} = {}", "✓".green(), key.cyan(), shown);

    Ok(())
}

/// An empty value clears an optional setting.
fn optional(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
