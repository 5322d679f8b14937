//! Initialize Leakdex.

use super::get_paths;
use anyhow::{Context, Result};
use colored::Colorize;
use leakdex_config::Config;

pub fn run() -> Result<()> {
    let paths = get_paths()?;

    if paths.is_initialized() {
        println!("{} Leakdex is already initialized.", "Note:".yellow().bold());
        println!("  Config: {}", paths.config_file.display());
        println!("  Downloads: {}", paths.download_dir.display());
        return Ok(());
    }

    println!("{}", "Initializing Leakdex...".cyan().bold());

    paths.ensure_dirs().context("Failed to create directories")?;
    println!("  {} Created directories", "✓".green());

    Config::create_default_file(&paths.config_file).context("Failed to create config file")?;
    println!(
        "  {} Created config: {}",
        "✓".green(),
        paths.config_file.display()
    );

    println!();
    println!("{}", "Leakdex initialized successfully!".green().bold());
    println!();
    println!("Next steps:");
    println!(
        "  1. Point at your engine: {}",
        "leakdex config set search.url http://localhost:9200".cyan()
    );
    println!("  2. Check the connection: {}", "leakdex status".cyan());
    println!("  3. Ingest a dump: {}", "leakdex ingest ./combo.txt".cyan());

    Ok(())
}
