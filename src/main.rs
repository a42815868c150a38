//! Site-Mirror main entry point
//!
//! This is the command-line interface for the Site-Mirror domain crawler.

use clap::{CommandFactory, Parser};
use site_mirror::config::{load_config_with_hash, validate, CliOverrides, Config};
use site_mirror::crawler::{run_crawl, CrawlStatus};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Site-Mirror: a resumable domain mirror
///
/// Site-Mirror downloads every page of one domain into a local directory,
/// optionally with PDFs, documents and media. Progress is saved to
/// toDownload.tmp, alreadyDownloaded.tmp and errors.tmp, so running the
/// same command again resumes where it stopped. Pages the live site no
/// longer serves are recovered from the Wayback Machine.
#[derive(Parser, Debug)]
#[command(name = "site-mirror")]
#[command(version)]
#[command(about = "A resumable domain mirror crawler", long_about = None)]
struct Cli {
    /// The starting URL to crawl (https:// is assumed when no scheme is given)
    #[arg(value_name = "URL")]
    url: Option<String>,

    /// Local directory to save the mirror [default: mirror_site]
    #[arg(short, long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// File to save the list of all downloaded URLs [default: links.txt]
    #[arg(short = 'l', long, value_name = "FILE")]
    output_list: Option<PathBuf>,

    /// Timeout in seconds for page loading [default: 60]
    #[arg(short, long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Download HTML pages (the default when no content flag is given)
    #[arg(long)]
    web: bool,

    /// Also save the readable text of each page
    #[arg(long)]
    text: bool,

    /// Download PDF files
    #[arg(long)]
    pdf: bool,

    /// Download office documents and drawings
    #[arg(long)]
    docs: bool,

    /// Download images, audio and video
    #[arg(long)]
    media: bool,

    /// Respect robots.txt rules during the crawl
    #[arg(long)]
    robots: bool,

    /// Discover URLs via sitemaps
    #[arg(long)]
    sitemap: bool,

    /// Discover URLs from the Wayback Machine index
    #[arg(long)]
    wayback: bool,

    /// Preferred Wayback snapshot date (YYYYMMDD)
    #[arg(long, value_name = "YYYYMMDD")]
    date: Option<String>,

    /// Base delay in seconds between requests, randomized ×0.5–1.5 [default: 1.0]
    #[arg(long, value_name = "SECS")]
    delay: Option<f64>,

    /// Run the browser in visible mode
    #[arg(long)]
    visible: bool,

    /// Path to an optional TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Directory holding the resume files [default: .]
    #[arg(long, value_name = "DIR")]
    state_dir: Option<PathBuf>,

    /// Validate settings and show what would be crawled without crawling
    #[arg(long)]
    dry_run: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

impl Cli {
    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            output_dir: self.output_dir.clone(),
            output_list: self.output_list.clone(),
            state_dir: self.state_dir.clone(),
            timeout_secs: self.timeout,
            delay_secs: self.delay,
            archive_date: self.date.clone(),
            web: self.web,
            text: self.text,
            pdf: self.pdf,
            docs: self.docs,
            media: self.media,
            robots: self.robots,
            sitemap: self.sitemap,
            wayback: self.wayback,
            visible: self.visible,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let Some(start_url) = cli.url.clone() else {
        Cli::command().print_help()?;
        return Ok(());
    };

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load configuration, then layer the command line on top
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
    config.apply_cli(cli.overrides());

    if let Err(e) = validate(&config) {
        tracing::error!("Invalid settings: {}", e);
        return Err(e.into());
    }

    if !config.crawler.headless {
        tracing::warn!("Visible mode has no effect: pages are fetched over HTTP without a browser");
    }

    if cli.dry_run {
        handle_dry_run(&config, &start_url);
        return Ok(());
    }

    handle_crawl(config, &start_url).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("site_mirror=info,warn"),
            1 => EnvFilter::new("site_mirror=debug,info"),
            2 => EnvFilter::new("site_mirror=trace,debug"),
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

/// Handles the --dry-run mode: shows the effective settings
fn handle_dry_run(config: &Config, start_url: &str) {
    println!("=== Site-Mirror Dry Run ===\n");

    println!("Start URL: {}", start_url);

    println!("\nCrawler:");
    println!("  Delay: {}s (randomized)", config.crawler.delay_secs);
    println!("  Timeout: {}s", config.crawler.timeout_secs);
    println!("  Checkpoint every: {} URLs", config.crawler.checkpoint_interval);
    println!("  Respect robots.txt: {}", config.crawler.respect_robots);
    match &config.crawler.archive_date {
        Some(date) => println!("  Archive date: {}", date),
        None => println!("  Archive date: latest"),
    }

    let filter = site_mirror::content::ContentFilter::from_config(&config.content);
    println!("\nContent:");
    println!("  Web: {}", filter.web);
    println!("  Text: {} ({})", config.content.text, config.content.text_extension);
    println!("  PDF: {}", filter.pdf);
    println!("  Docs: {}", filter.docs);
    println!("  Media: {}", filter.media);

    println!("\nDiscovery:");
    println!("  Sitemap: {}", config.discovery.sitemap);
    println!("  Wayback index: {}", config.discovery.wayback);

    println!("\nOutput:");
    println!("  Mirror: {}", config.output.output_dir.display());
    println!("  URL list: {}", config.output.output_list.display());
    println!("  State directory: {}", config.output.state_dir.display());

    println!("\nUser Agent: {}", config.user_agent.header_value());

    println!("\n✓ Settings are valid");
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config, start_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    let cancel = CancellationToken::new();

    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, saving progress...");
            interrupt.cancel();
        }
    });

    tracing::info!(
        "Mirroring {} into {}",
        start_url,
        config.output.output_dir.display()
    );

    match run_crawl(&config, start_url, cancel).await {
        Ok(report) => {
            match report.status {
                CrawlStatus::Completed => tracing::info!("Crawl completed successfully"),
                CrawlStatus::Interrupted => tracing::info!("Stopped. Progress saved."),
            }
            tracing::info!(
                "Downloaded list written to {}",
                config.output.output_list.display()
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}
