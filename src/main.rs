//! Page-Sieve main entry point
//!
//! This is the command-line interface over the content pipeline.

use anyhow::{bail, Context};
use clap::Parser;
use page_sieve::config::{load_config, Config};
use page_sieve::output::{export_json, load_statistics, print_statistics};
use page_sieve::storage::open_storage;
use page_sieve::url::{normalize_batch, split_url_list};
use page_sieve::{ContentPipeline, ExtractorKind, FreshnessPolicy, PageContent};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Page-Sieve: cache-first page text extraction
///
/// Page-Sieve fetches every given URL at most once, keeps the outcome in a
/// local cache, and reduces each page to a short text made of its URL,
/// title, meta tags and main content.
#[derive(Parser, Debug)]
#[command(name = "page-sieve")]
#[command(version = "1.0.0")]
#[command(about = "Cache-first page text extraction", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// URLs to process
    #[arg(value_name = "URLS")]
    urls: Vec<String>,

    /// Comma-separated list of URLs to process
    #[arg(long = "urls", value_name = "LIST")]
    urls_list: Option<String>,

    /// File with one URL per line
    #[arg(short, long, value_name = "FILE")]
    input: Option<PathBuf>,

    /// Write results as JSON to this file instead of printing them
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Extraction strategy (boilerplate, readability, metadata, hybrid)
    #[arg(short, long, value_name = "KIND")]
    strategy: Option<ExtractorKind>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be processed without fetching
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics from the cache database and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let mut config = load_config(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    if let Some(strategy) = cli.strategy {
        config.extractor.strategy = strategy;
    }

    if cli.stats {
        return handle_stats(&config);
    }

    let urls = collect_urls(&cli)?;

    if cli.dry_run {
        handle_dry_run(&config, &urls);
        return Ok(());
    }

    if urls.is_empty() {
        bail!("no URLs given: pass them as arguments, with --urls or with --input");
    }

    handle_process(&config, &urls, cli.output.as_deref()).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("page_sieve=info,warn"),
            1 => EnvFilter::new("page_sieve=debug,info"),
            2 => EnvFilter::new("page_sieve=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Gathers URLs from arguments, the comma list and the input file
fn collect_urls(cli: &Cli) -> anyhow::Result<Vec<String>> {
    let mut urls = cli.urls.clone();

    if let Some(list) = &cli.urls_list {
        urls.extend(split_url_list(list));
    }

    if let Some(path) = &cli.input {
        urls.extend(read_url_file(path)?);
    }

    Ok(urls)
}

/// Reads one URL per line, skipping blank lines and `#` comments
fn read_url_file(path: &Path) -> anyhow::Result<Vec<String>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read URL file {}", path.display()))?;

    Ok(text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect())
}

/// Handles the --dry-run mode: shows configuration and the normalized batch
fn handle_dry_run(config: &Config, urls: &[String]) {
    println!("=== Page-Sieve Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Request timeout: {}ms", config.crawler.request_timeout_ms);
    println!("  Workers per CPU: {}", config.crawler.workers_per_cpu);
    println!("  Max workers: {}", config.crawler.max_workers);
    println!(
        "  Sequential threshold: {}",
        config.crawler.sequential_threshold
    );
    println!(
        "  Failure retry after: {}",
        match config.crawler.failure_ttl_hours {
            0 => "never".to_string(),
            hours => format!("{}h", hours),
        }
    );

    println!("\nUser Agent:");
    println!("  Name: {}", config.user_agent.crawler_name);
    println!("  Version: {}", config.user_agent.crawler_version);
    println!("  Contact URL: {}", config.user_agent.contact_url);
    println!("  Contact Email: {}", config.user_agent.contact_email);

    println!("\nExtractor:");
    println!("  Strategy: {}", config.extractor.strategy);
    println!(
        "  Metadata timeout: {}ms",
        config.extractor.metadata_timeout_ms
    );
    println!("  Page timeout: {}ms", config.extractor.page_timeout_ms);
    println!("  Delimiter: {:?}", config.extractor.delimiter);

    println!("\nStorage:");
    println!("  Database: {}", config.storage.database_path);

    let batch = normalize_batch(urls);
    println!("\nBatch ({} distinct URLs):", batch.len());
    for url in &batch {
        if url.is_empty() {
            println!("  - (empty)");
        } else {
            println!("  - {}", url);
        }
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the --stats mode: shows statistics from the cache database
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    println!("Database: {}\n", config.storage.database_path);

    let storage = open_storage(Path::new(&config.storage.database_path))
        .context("failed to open cache database")?;

    let freshness = FreshnessPolicy::from_hours(config.crawler.failure_ttl_hours);
    let stats = load_statistics(&storage, &freshness, chrono::Utc::now())?;

    print_statistics(&stats);

    Ok(())
}

/// Handles the main operation: runs the pipeline over the batch
async fn handle_process(
    config: &Config,
    urls: &[String],
    output: Option<&Path>,
) -> anyhow::Result<()> {
    let storage = open_storage(Path::new(&config.storage.database_path))
        .context("failed to open cache database")?;
    let pipeline = ContentPipeline::from_config(config, Arc::new(storage))?;

    tracing::info!(
        "Processing {} URLs with the {} strategy",
        urls.len(),
        pipeline.kind()
    );

    let results = pipeline.process(urls).await;

    match output {
        Some(path) => {
            export_json(&results, path)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("✓ Results exported to: {}", path.display());
        }
        None => {
            let mut contents: Vec<PageContent> =
                results.values().map(PageContent::from).collect();
            contents.sort_by(|a, b| a.url.cmp(&b.url));

            for content in contents {
                if content.error {
                    println!(
                        "{}\t[error: {}]\t{}",
                        content.url, content.message, content.content
                    );
                } else {
                    println!("{}\t{}", content.url, content.content);
                }
            }
        }
    }

    let errors = results.values().filter(|page| page.fetch_error).count();
    tracing::info!(
        "Done: {} pages, {} fetch errors, {} extraction failures",
        results.len(),
        errors,
        results.values().filter(|page| page.extraction_failed).count()
    );

    Ok(())
}
