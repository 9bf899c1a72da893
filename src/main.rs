//! Catalog-Crawl main entry point
//!
//! This is the command-line interface for the Catalog-Crawl product crawler.

use catalog_crawl::config::{load_config_with_hash, Config};
use catalog_crawl::crawler::run_crawl;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Catalog-Crawl: a resumable product catalog crawler
///
/// Catalog-Crawl walks every category of a product catalog in a headless
/// browser, records each newly seen product and the size/price table of each
/// of its providers to a CSV file, and resumes from that file when restarted.
#[derive(Parser, Debug)]
#[command(name = "catalog-crawl")]
#[command(version = "1.0.0")]
#[command(about = "A resumable product catalog crawler", long_about = None)]
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

    /// Run the discovery pass only
    #[arg(long, conflicts_with_all = ["dry_run", "stats"])]
    skip_revisit: bool,

    /// Validate config and show what would be crawled without launching a browser
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics from the CSV store and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let mut config = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            cfg
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if cli.skip_revisit {
        config.revisit.enabled = false;
    }

    // Handle different modes
    if cli.dry_run {
        handle_dry_run(&config)?;
    } else if cli.stats {
        handle_stats(&config)?;
    } else {
        handle_crawl(config).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("catalog_crawl=info,warn"),
            1 => EnvFilter::new("catalog_crawl=debug,info"),
            2 => EnvFilter::new("catalog_crawl=trace,debug"),
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

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    use catalog_crawl::storage::{CsvRecordStore, RecordStore};
    use std::path::Path;

    println!("=== Catalog-Crawl Dry Run ===\n");

    println!("Site:");
    println!("  Base URL: {}", config.site.base_url);
    println!("  Catalog URL: {}", config.site.catalog_url);

    println!("\nBrowser:");
    println!("  Headless: {}", config.browser.headless);
    println!(
        "  Window: {}x{}",
        config.browser.window_width, config.browser.window_height
    );
    if let Some(executable) = &config.browser.chrome_executable {
        println!("  Executable: {}", executable);
    }

    println!("\nTiming:");
    println!(
        "  Navigation timeout: {}ms",
        config.timing.navigation_timeout
    );
    println!("  Settle strategy: {:?}", config.timing.settle_strategy);
    println!(
        "  Settle after navigate/scroll/click: {}ms / {}ms / {}ms",
        config.timing.settle_after_navigate,
        config.timing.settle_after_scroll,
        config.timing.settle_after_click
    );

    println!("\nRevisit pass:");
    println!("  Enabled: {}", config.revisit.enabled);
    println!("  Record variants: {}", config.revisit.record_variants);
    println!("  Dedupe: {}", config.revisit.dedupe);

    println!("\nOutput:");
    println!("  CSV: {}", config.output.csv_path);

    // Read-only: a missing store is not created here
    let store = CsvRecordStore::new(Path::new(&config.output.csv_path));
    let seen = store.load_seen_urls()?;

    println!("\n✓ Configuration is valid");
    println!(
        "✓ {} product URL(s) already recorded and would be skipped",
        seen.len()
    );

    Ok(())
}

/// Handles the --stats mode: shows statistics from the CSV store
fn handle_stats(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    use catalog_crawl::output::{load_statistics, print_statistics};
    use catalog_crawl::storage::CsvRecordStore;
    use std::path::Path;

    println!("Store: {}\n", config.output.csv_path);

    let store = CsvRecordStore::new(Path::new(&config.output.csv_path));
    let stats = load_statistics(&store)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    if config.revisit.enabled {
        tracing::info!("Starting crawl (discovery and revisit passes)");
    } else {
        tracing::info!("Starting crawl (discovery pass only)");
    }
    tracing::info!("Recording to {}", config.output.csv_path);

    match run_crawl(config).await {
        Ok(report) => {
            tracing::info!(
                "Crawl completed successfully: {} new product(s), {} variant row(s)",
                report.new_products,
                report.variants_recorded
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}
