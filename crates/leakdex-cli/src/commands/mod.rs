//! CLI command implementations.

pub mod config;
pub mod ingest;
pub mod init;
pub mod status;

use anyhow::{Context, Result};
use leakdex_config::{AppPaths, Config};

/// Get the application paths.
pub fn get_paths() -> Result<AppPaths> {
    AppPaths::new().context("Failed to determine application directories")
}

/// Load the configuration, applying the command-line engine URL if given.
///
/// A missing config file is not an error; the defaults are used.
pub fn load_config(es_url: Option<&str>) -> Result<Config> {
    let paths = get_paths()?;
    let mut config = Config::load_from(&paths.config_file).context("Failed to load config")?;

    if let Some(url) = es_url {
        config.search.url = url.to_string();
    }
    if !config.ui.color {
        colored::control::set_override(false);
    }

    Ok(config)
}

/// Format a file size in human-readable form.
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}
