//! Crawler module for mirroring a site
//!
//! This module contains the core crawling logic, including:
//! - Fetching collaborators (pages, binaries, archived snapshots)
//! - HTML parsing and link extraction
//! - Frontier seeding from sitemaps and the web archive
//! - Politeness delays and checkpointing
//! - Overall crawl coordination

mod checkpoint;
mod coordinator;
mod discovery;
mod fetcher;
mod parser;
mod scheduler;

pub use checkpoint::CheckpointManager;
pub use coordinator::{Collaborators, Coordinator, CrawlReport, CrawlStatus, UrlOutcome};
pub use discovery::{
    parse_sitemap, seed_frontier, ArchiveIndexSource, DiscoveryError, SitemapDiscovery,
    SitemapDocument, SitemapSource, MAX_INDEX_DEPTH,
};
pub use fetcher::{
    build_http_client, BinaryFetcher, FetchFailure, FetchedPage, HttpBinaryFetcher,
    HttpPageFetcher, PageFetcher, PageLinks, PageRequest, SnapshotLookup,
};
pub use parser::{extract_text, parse_html, ParsedPage};
pub use scheduler::Politeness;

use crate::archive::WaybackClient;
use crate::config::Config;
use crate::storage::FileStateStore;
use crate::MirrorError;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

impl Collaborators {
    /// Builds the HTTP-backed collaborators described by `config`
    ///
    /// Sitemap and archive-index discovery are only wired in when enabled.
    /// The archive snapshot lookup is always present since it backs the
    /// per-URL fallback.
    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        let timeout = Duration::from_secs(config.crawler.timeout_secs);
        let client = build_http_client(&config.user_agent, timeout)?;
        let wayback = Arc::new(WaybackClient::new(client.clone()));

        let pages = HttpPageFetcher::new(client.clone(), config.user_agent.crawler_name.clone())
            .with_text(config.content.text);

        Ok(Self {
            pages: Arc::new(pages),
            binaries: Arc::new(HttpBinaryFetcher::new(client.clone(), timeout)),
            snapshots: wayback.clone(),
            sitemap: config
                .discovery
                .sitemap
                .then(|| Arc::new(SitemapDiscovery::new(client)) as Arc<dyn SitemapSource>),
            archive_index: config
                .discovery
                .wayback
                .then(|| wayback as Arc<dyn ArchiveIndexSource>),
        })
    }
}

/// Runs a complete crawl operation with the default collaborators
///
/// This is the main entry point for mirroring a site. It will:
/// 1. Build the HTTP collaborators
/// 2. Open the checkpoint files in the state directory
/// 3. Resume or seed the frontier
/// 4. Fetch and store pages until done or cancelled
/// 5. Write the final checkpoint and output list
pub async fn run_crawl(
    config: &Config,
    start_url: &str,
    cancel: CancellationToken,
) -> Result<CrawlReport, MirrorError> {
    let collaborators = Collaborators::from_config(config)?;
    let store = FileStateStore::new(&config.output.state_dir, &config.output.output_list);
    let coordinator = Coordinator::new(config, start_url, collaborators, Box::new(store))?;
    Ok(coordinator.run(cancel).await?)
}
