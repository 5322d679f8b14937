//! Ingest command implementation.

use super::{format_size, get_paths, load_config};
use anyhow::{Context, Result};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use leakdex_ingest::{download, DiscardSink, DocumentSink, IngestReport, Ingestor};
use leakdex_search::SearchClient;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Runtime;
use tracing::debug;

/// Ingest a file, a directory or a URL.
pub fn run(
    target: &str,
    name: Option<String>,
    dry_run: bool,
    no_wait: bool,
    es_url: Option<&str>,
) -> Result<()> {
    let mut config = load_config(es_url)?;
    if no_wait {
        config.ingest.await_sink = false;
    }

    let rt = Runtime::new().context("Failed to create async runtime")?;

    let sink: Arc<dyn DocumentSink> = if dry_run {
        Arc::new(DiscardSink::new())
    } else {
        let client =
            SearchClient::from_config(&config.search).context("Failed to create search client")?;
        if !rt.block_on(client.is_available()) {
            anyhow::bail!(
                "Search engine is not reachable at {}. Check 'leakdex status'.",
                config.search.url
            );
        }
        Arc::new(client)
    };

    debug!("Writing documents to {}", sink.name());
    let ingestor = Ingestor::new(sink, config.ingest.clone()).context("Invalid ingest settings")?;

    let pb = spinner()?;
    let reports = if is_url(target) {
        pb.set_message(format!("Downloading {}", target));
        let paths = get_paths()?;
        let http = reqwest::Client::new();
        let mut fetched = rt
            .block_on(download(&http, target, Some(paths.download_dir.as_path())))
            .context("Download failed")?;
        if let Some(name) = name {
            fetched.source_name = name;
        }

        pb.set_message(format!(
            "Ingesting {} ({})",
            fetched.source_name,
            format_size(fetched.bytes)
        ));
        vec![rt.block_on(ingestor.ingest_download(&fetched))?]
    } else {
        let path = Path::new(target);
        if !path.exists() {
            pb.finish_and_clear();
            anyhow::bail!("Path does not exist: {}", path.display());
        }

        if path.is_dir() {
            if name.is_some() {
                pb.finish_and_clear();
                anyhow::bail!("--name cannot be used with a directory");
            }
            pb.set_message(format!("Ingesting files under {}", path.display()));
            rt.block_on(ingestor.ingest_directory(path))?
        } else {
            let source = name.unwrap_or_else(|| {
                path.file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_else(|| target.to_string())
            });
            pb.set_message(format!("Ingesting {}", source));
            vec![rt.block_on(ingestor.ingest_path(path, &source))?]
        }
    };
    pb.finish_and_clear();

    if reports.is_empty() {
        println!("{}", "No files found.".yellow());
        return Ok(());
    }

    for report in &reports {
        print_report(report);
    }

    let total: usize = reports.iter().map(|r| r.records).sum();
    if reports.len() > 1 {
        println!();
        println!(
            "{} {} records from {} sources",
            "Total:".green().bold(),
            total,
            reports.len()
        );
    }

    if no_wait {
        let pb = spinner()?;
        pb.set_message("Waiting for background upserts");
        let flushed = rt.block_on(ingestor.flush())?;
        pb.finish_and_clear();
        println!(
            "  Background upserts: {} succeeded, {} failed",
            flushed.succeeded.to_string().green(),
            color_failed(flushed.failed)
        );
    }

    if dry_run {
        println!();
        println!("{}", "Dry run - nothing was written.".cyan());
    }

    Ok(())
}

fn print_report(report: &IngestReport) {
    println!(
        "{} {} [{}] {} records in {:.2?}",
        "✓".green(),
        report.source.bold(),
        report.format,
        report.records,
        report.elapsed
    );

    if report.skipped > 0 || report.filtered > 0 {
        println!(
            "  {} skipped, {} filtered as noise",
            report.skipped.to_string().yellow(),
            report.filtered
        );
    }

    if let Some(sink) = report.sink {
        println!(
            "  Upserts: {} succeeded, {} failed",
            sink.succeeded.to_string().green(),
            color_failed(sink.failed)
        );
    }
}

fn color_failed(failed: usize) -> colored::ColoredString {
    if failed > 0 {
        failed.to_string().red()
    } else {
        failed.to_string().normal()
    }
}

fn is_url(target: &str) -> bool {
    let lower = target.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

fn spinner() -> Result<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.enable_steady_tick(Duration::from_millis(100));
    Ok(pb)
}
