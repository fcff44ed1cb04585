//! Link-Ripple main entry point
//!
//! This is the command-line interface for the Link-Ripple broken-link crawler.

use anyhow::Context;
use clap::Parser;
use link_ripple::config::{load_config_with_hash, validate, Config};
use link_ripple::crawler::{crawl, CompletionSummary, Supervisor};
use link_ripple::output::{quit_signal, CsvSink, ProgressView, ViewExit};
use link_ripple::state::{ProgressAggregator, ProgressSnapshot};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing_subscriber::EnvFilter;

/// Link-Ripple: a concurrent broken-link crawler
///
/// Link-Ripple crawls a website from a seed URL, checks the status of every
/// link it finds, and appends one CSV row per checked link. Healthy links on
/// the seed's host are crawled in turn until every reachable URL has been
/// checked once.
#[derive(Parser, Debug)]
#[command(name = "link-ripple")]
#[command(version)]
#[command(about = "A concurrent broken-link crawler", long_about = None)]
struct Cli {
    /// URL to start crawling from (prompted for when omitted)
    #[arg(value_name = "SEED")]
    seed: Option<String>,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// CSV file to append link records to
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Stop starting new page crawls after this many pages
    #[arg(long)]
    max_pages: Option<usize>,

    /// Do not crawl pages more than this many links away from the seed
    #[arg(long)]
    max_depth: Option<u32>,

    /// Maximum number of pages crawled at the same time
    #[arg(long)]
    concurrency: Option<usize>,

    /// Do not show the live progress line
    #[arg(long)]
    no_progress: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let config = load_configuration(&cli)?;

    let seed = match &cli.seed {
        Some(seed) => seed.clone(),
        None => prompt_for_seed()?,
    };

    // Setup failures are fatal; nothing has been crawled yet.
    let sink = Arc::new(CsvSink::open(&config.output.csv_path)?);
    tracing::info!("Writing link records to {}", sink.path().display());

    let summary = if cli.no_progress || cli.quiet {
        crawl(&config, &seed, sink).await?
    } else {
        let supervisor = Supervisor::new(&config, sink)?;
        let progress = ProgressAggregator::new();
        let view = spawn_progress_view(progress.subscribe());

        let summary = supervisor.run_with_progress(&seed, progress).await?;

        match view.await {
            Ok(Ok(ViewExit::Quit)) => tracing::debug!("Progress view was dismissed early"),
            Ok(Ok(ViewExit::Completed)) => {}
            Ok(Err(e)) => tracing::warn!("Progress view failed: {}", e),
            Err(e) => tracing::warn!("Progress view task failed: {}", e),
        }
        summary
    };

    if !cli.quiet {
        print_summary(&summary, &config);
    }

    Ok(())
}

/// Renders the live progress line on stdout until the run finishes or Ctrl-C
fn spawn_progress_view(
    rx: watch::Receiver<ProgressSnapshot>,
) -> JoinHandle<io::Result<ViewExit>> {
    tokio::spawn(async move {
        let mut view = ProgressView::new(rx, io::stdout());
        let exit = view.run_until(quit_signal()).await;
        if matches!(exit, Ok(ViewExit::Quit)) {
            eprintln!("Progress view closed, crawl continues. Press Ctrl-C again to abort.");
            tokio::spawn(async {
                quit_signal().await;
                std::process::exit(130);
            });
        }
        exit
    })
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("link_ripple=warn"),
            1 => EnvFilter::new("link_ripple=info,warn"),
            2 => EnvFilter::new("link_ripple=debug,info"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Loads the config file (if any) and applies command-line overrides
fn load_configuration(cli: &Cli) -> Result<Config, Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            match load_config_with_hash(path) {
                Ok((cfg, hash)) => {
                    tracing::info!("Configuration loaded successfully (hash: {})", hash);
                    cfg
                }
                Err(e) => {
                    tracing::error!("Failed to load configuration: {}", e);
                    return Err(e.into());
                }
            }
        }
        None => Config::default(),
    };

    if let Some(output) = &cli.output {
        config.output.csv_path = output.display().to_string();
    }
    if let Some(max_pages) = cli.max_pages {
        config.crawler.max_pages = Some(max_pages);
    }
    if let Some(max_depth) = cli.max_depth {
        config.crawler.max_depth = Some(max_depth);
    }
    if let Some(concurrency) = cli.concurrency {
        config.crawler.max_concurrent_tasks = concurrency;
    }

    validate(&config)?;
    Ok(config)
}

/// Asks for the seed URL on stdin
fn prompt_for_seed() -> anyhow::Result<String> {
    print!("Enter website url: ");
    io::stdout().flush().context("failed to write prompt")?;

    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("failed to read seed URL from stdin")?;

    let seed = line.trim();
    if seed.is_empty() {
        anyhow::bail!("no seed URL given");
    }
    Ok(seed.to_string())
}

fn print_summary(summary: &CompletionSummary, config: &Config) {
    println!("=== Link-Ripple Crawl Summary ===\n");
    println!("  Seed: {}", summary.seed);
    println!("  Started: {}", summary.started_at.to_rfc3339());
    println!("  Duration: {}s", summary.duration().num_seconds());
    println!("  Pages crawled: {}", summary.pages_crawled);
    if summary.pages_skipped > 0 {
        println!("  Pages skipped by limits: {}", summary.pages_skipped);
    }
    println!("  URLs seen: {}", summary.urls_admitted);
    println!("  Links checked: {}", summary.counters.total);
    println!("  Valid: {}", summary.counters.valid);
    println!("  Broken: {}", summary.counters.broken);
    println!("\n✓ Results appended to: {}", config.output.csv_path);
}
