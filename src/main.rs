//! Gig-Crawler main entry point
//!
//! This is the command-line interface for the marketplace listing crawler.

use anyhow::Context;
use clap::Parser;
use gig_crawler::codec::{self, IdCodec};
use gig_crawler::config::{load_config_with_hash, require_codec_key, resolve_codec_key, Config};
use gig_crawler::crawler::{Coordinator, StoreFactory};
use gig_crawler::output::{export_listings, load_statistics, print_statistics, resolve_listing_url};
use gig_crawler::sources::SUPPORTED_PLATFORMS;
use gig_crawler::storage::{open_storage, Storage};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Gig-Crawler: marketplace listing ingestion
///
/// Polls freelance marketplaces on a fast and a slow cadence, stores every
/// listing it has not seen before and exposes stored listings under opaque
/// public identifiers.
#[derive(Parser, Debug)]
#[command(name = "gig-crawler")]
#[command(version)]
#[command(about = "Marketplace listing crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show the configured sources without crawling
    #[arg(long, group = "mode")]
    dry_run: bool,

    /// Crawl every enabled source once, store new listings and exit
    #[arg(long, group = "mode")]
    once: bool,

    /// Crawl one source and print what it yields without storing anything
    #[arg(long, value_name = "PLATFORM", group = "mode")]
    probe: Option<String>,

    /// Show listing counts per platform and exit
    #[arg(long, group = "mode")]
    stats: bool,

    /// Print stored listings as JSON lines with public identifiers
    #[arg(long, group = "mode")]
    list: bool,

    /// Print the marketplace URL behind a public identifier
    #[arg(long, value_name = "PUBLIC_ID", group = "mode", requires = "platform")]
    resolve: Option<String>,

    /// Restrict --list to one platform, or name the platform for --resolve
    #[arg(long, value_name = "PLATFORM")]
    platform: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    install_codec(&config)?;

    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.once {
        handle_once(&config).await?;
    } else if let Some(platform) = &cli.probe {
        handle_probe(&config, platform).await?;
    } else if cli.stats {
        handle_stats(&config)?;
    } else if cli.list {
        handle_list(&config, cli.platform.as_deref())?;
    } else if let (Some(public_id), Some(platform)) = (&cli.resolve, &cli.platform) {
        handle_resolve(&config, platform, public_id)?;
    } else {
        handle_run(&config).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("gig_crawler=info,warn"),
            1 => EnvFilter::new("gig_crawler=debug,info"),
            2 => EnvFilter::new("gig_crawler=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Installs the process-wide identifier codec
///
/// Without a configured key a fresh one is generated, so public identifiers
/// issued by this process stop resolving after a restart.
fn install_codec(config: &Config) -> anyhow::Result<()> {
    let codec = match resolve_codec_key(config) {
        Some(key) => IdCodec::from_hex(&key).context("identifier key")?,
        None => {
            tracing::warn!(
                "No identifier key configured; public ids will not survive a restart"
            );
            IdCodec::generate()
        }
    };
    codec::install(codec)?;
    Ok(())
}

fn open_store(config: &Config) -> anyhow::Result<gig_crawler::SqliteStorage> {
    let path = Path::new(&config.storage.database_path);
    open_storage(path).with_context(|| format!("opening {}", path.display()))
}

/// Handles the --dry-run mode: shows what would be crawled
fn handle_dry_run(config: &Config) {
    println!("=== Gig-Crawler Dry Run ===\n");

    println!("Scheduler:");
    println!("  Fast interval: {}s", config.scheduler.fast_interval);
    println!("  Slow interval: {}s", config.scheduler.slow_interval);
    println!("  Refresh existing: {}", config.scheduler.refresh_existing);

    println!("\nUser Agent:");
    println!("  Name: {}", config.user_agent.crawler_name);
    println!("  Version: {}", config.user_agent.crawler_version);
    println!("  Contact URL: {}", config.user_agent.contact_url);
    println!("  Contact Email: {}", config.user_agent.contact_email);

    println!("\nStorage:");
    println!("  Database: {}", config.storage.database_path);

    println!("\nSources ({}):", config.sources.len());
    for entry in &config.sources {
        println!(
            "  - {} [{}{}] {} (target {})",
            entry.platform,
            entry.cadence(),
            if entry.enabled { "" } else { ", disabled" },
            entry.base_url,
            entry.target_count
        );
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the --once mode: one manual crawl-and-ingest pass
async fn handle_once(config: &Config) -> anyhow::Result<()> {
    let coordinator = Coordinator::new(config)?;
    let mut store = open_store(config)?;

    let report = coordinator.crawl_all_once(&mut store).await;
    println!("Crawled {} new listings", report.inserted());
    if report.failed > 0 || report.rolled_back > 0 {
        println!(
            "({} sources failed, {} batches rolled back; see log)",
            report.failed, report.rolled_back
        );
    }
    Ok(())
}

/// Handles the --probe mode: crawl one source without persisting
async fn handle_probe(config: &Config, platform: &str) -> anyhow::Result<()> {
    let coordinator = Coordinator::new(config)?;
    let candidates = coordinator.probe(platform).await?;

    if candidates.is_empty() {
        println!("{}: no listings found", platform);
        return Ok(());
    }
    for candidate in &candidates {
        println!("{}", serde_json::to_string(candidate)?);
    }
    tracing::info!("{} listings from {}", candidates.len(), platform);
    Ok(())
}

/// Handles the --stats mode: listing counts per platform
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    println!("Database: {}\n", config.storage.database_path);
    let store = open_store(config)?;
    let stats = load_statistics(&store, SUPPORTED_PLATFORMS)?;
    print_statistics(&stats);
    Ok(())
}

/// Handles the --list mode: JSON lines with public identifiers
fn handle_list(config: &Config, platform: Option<&str>) -> anyhow::Result<()> {
    let store = open_store(config)?;
    let written = export_listings(&store, platform, codec::global(), io::stdout().lock())?;
    tracing::info!("Listed {} listings", written);
    Ok(())
}

/// Handles the --resolve mode: public identifier to marketplace URL
///
/// Refuses to run under a generated key, which could never decode an
/// identifier printed by another run.
fn handle_resolve(config: &Config, platform: &str, public_id: &str) -> anyhow::Result<()> {
    require_codec_key(config)?;
    let registry = gig_crawler::SourceRegistry::from_config(config)?;
    let url = resolve_listing_url(codec::global(), &registry, platform, public_id)?;
    println!("{}", url);
    Ok(())
}

/// Runs the cadence loops until Ctrl-C
async fn handle_run(config: &Config) -> anyhow::Result<()> {
    let coordinator = Coordinator::new(config)?;

    // Create the schema once before the loops open their own connections
    drop(open_store(config)?);

    let path = PathBuf::from(&config.storage.database_path);
    let factory: StoreFactory = Arc::new(move || {
        open_storage(&path).map(|store| Box::new(store) as Box<dyn Storage>)
    });

    tracing::info!(
        "Starting {} sources ({} loops)",
        coordinator.registry().len(),
        coordinator.scheduler().cadences().len()
    );
    let handles = coordinator.start(factory);

    tokio::signal::ctrl_c().await?;
    tracing::info!("Interrupted; stopping loops");
    for handle in handles {
        handle.abort();
    }
    Ok(())
}
