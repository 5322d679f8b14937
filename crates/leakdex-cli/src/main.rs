//! Leakdex CLI - ingest leaked-credential dumps into a search engine.

mod commands;

use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Leakdex - breach dump ingestion
#[derive(Parser)]
#[command(name = "leakdex")]
#[command(version)]
#[command(about = "Ingest leaked-credential dumps into a searchable index", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Search engine URL (overrides the config file)
    #[arg(long, global = true, env = "ELASTIC_URL")]
    es_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize Leakdex (create config and data directories)
    Init,

    /// Manage configuration
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Check the search engine connection
    Status,

    /// Ingest a file, a directory of dumps or a URL
    Ingest {
        /// File, directory or http(s) URL
        target: String,

        /// Source name stored as leak_source (defaults to the file name)
        #[arg(short, long)]
        name: Option<String>,

        /// Parse and count records without writing them
        #[arg(long)]
        dry_run: bool,

        /// Report counts without waiting for each upsert to finish first
        #[arg(long)]
        no_wait: bool,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Print the config file location
    Path,

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., search.index)
        key: String,

        /// Value to set
        value: String,
    },
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("leakdex=debug,info"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("leakdex=info,warn"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let es_url = cli.es_url.as_deref();

    let result = match cli.command {
        Commands::Init => commands::init::run(),
        Commands::Config(cmd) => match cmd {
            ConfigCommands::Show => commands::config::show(),
            ConfigCommands::Path => commands::config::path(),
            ConfigCommands::Set { key, value } => commands::config::set(&key, &value),
        },
        Commands::Status => commands::status::run(es_url),
        Commands::Ingest {
            target,
            name,
            dry_run,
            no_wait,
        } => commands::ingest::run(&target, name, dry_run, no_wait, es_url),
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}
