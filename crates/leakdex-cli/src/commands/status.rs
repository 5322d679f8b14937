//! Status command - check the search engine connection.

use super::{get_paths, load_config};
use anyhow::{Context, Result};
use colored::Colorize;
use leakdex_search::{SearchClient, SearchError};
use tokio::runtime::Runtime;

pub fn run(es_url: Option<&str>) -> Result<()> {
    let paths = get_paths()?;
    let config = load_config(es_url)?;

    println!("{}", "Leakdex Status".cyan().bold());
    println!("{}", "─".repeat(50));

    println!();
    println!("{}", "Configuration".white().bold());
    let config_state = if paths.is_initialized() {
        paths.config_file.display().to_string()
    } else {
        "not initialized (using defaults)".dimmed().to_string()
    };
    println!("  Config: {}", config_state);
    println!("  Engine: {}", config.search.url);
    println!("  Index: {}", config.search.index);
    println!(
        "  Flatten: {:?}, queue {}, {} concurrent upserts",
        config.ingest.flatten, config.ingest.queue_capacity, config.ingest.sink_concurrency
    );

    let client = SearchClient::from_config(&config.search).context("Failed to create search client")?;
    let rt = Runtime::new().context("Failed to create async runtime")?;

    println!();
    println!("{}", "Search Engine".white().bold());
    match rt.block_on(client.info()) {
        Ok(info) => {
            println!("  {} Reachable", "●".green());
            println!("  Cluster: {}", info.cluster_name);
            println!("  Version: {}", info.version.number);
        }
        Err(SearchError::ServerNotRunning { url }) => {
            println!("  {} Not reachable at {}", "✗".red(), url);
        }
        Err(e) => {
            println!("  {} {}", "✗".red(), e);
        }
    }

    Ok(())
}
