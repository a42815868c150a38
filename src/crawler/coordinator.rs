//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the main crawl loop, which:
//! - Restores state from the last checkpoint, or seeds a fresh frontier
//! - Classifies, filters, fetches and stores each dequeued URL
//! - Falls back to archived copies when the live site fails
//! - Checkpoints in batches and on every exit path
//!
//! A single task owns the `CrawlState`. Every network wait is raced against
//! a cancellation token; on cancellation the in-flight URL goes back to the
//! head of the frontier before the final checkpoint.

use crate::config::Config;
use crate::content::{local_path, sidecar_path, ContentClass, ContentFilter, TEXT_SUBFOLDER};
use crate::crawler::checkpoint::CheckpointManager;
use crate::crawler::discovery::{seed_frontier, ArchiveIndexSource, SitemapSource};
use crate::crawler::fetcher::{BinaryFetcher, FetchFailure, PageFetcher, PageRequest, SnapshotLookup};
use crate::crawler::scheduler::Politeness;
use crate::state::CrawlState;
use crate::storage::{StateStore, StorageError};
use crate::url::{resolve_url, with_default_scheme, CrawlScope};
use crate::UrlError;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// The services a crawl talks to
#[derive(Clone)]
pub struct Collaborators {
    pub pages: Arc<dyn PageFetcher>,
    pub binaries: Arc<dyn BinaryFetcher>,
    pub snapshots: Arc<dyn SnapshotLookup>,

    /// Consulted on a fresh crawl when set
    pub sitemap: Option<Arc<dyn SitemapSource>>,

    /// Consulted on a fresh crawl when set
    pub archive_index: Option<Arc<dyn ArchiveIndexSource>>,
}

/// How a crawl ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlStatus {
    /// The frontier was drained
    Completed,

    /// Cancellation was requested; pending work remains in the frontier
    Interrupted,
}

impl fmt::Display for CrawlStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed => write!(f, "completed"),
            Self::Interrupted => write!(f, "interrupted"),
        }
    }
}

/// Summary of a crawl run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlReport {
    pub status: CrawlStatus,

    /// Size of the visited set at exit, including earlier runs
    pub visited: usize,

    /// Size of the error set at exit, including earlier runs
    pub errors: usize,

    /// URLs left in the frontier
    pub pending: usize,

    /// URLs processed by this run
    pub processed: usize,
}

/// What became of one dequeued URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UrlOutcome {
    /// Downloaded from the live site
    Visited,

    /// Downloaded from an archived copy after the live fetch failed
    Recovered,

    /// Not wanted by this crawl; recorded as visited without fetching
    Skipped,

    /// Live fetch failed and no archived copy could be fetched
    Failed {
        live: FetchFailure,
        fallback: Option<FetchFailure>,
    },
}

impl UrlOutcome {
    /// Returns true if the URL ends up in the visited set
    pub fn is_visited(&self) -> bool {
        !matches!(self, Self::Failed { .. })
    }
}

/// Result of processing one URL, before it is applied to the crawl state
struct Processed {
    outcome: UrlOutcome,
    links: Vec<String>,
}

/// Main crawler coordinator structure
pub struct Coordinator {
    start_url: String,
    scope: CrawlScope,
    collaborators: Collaborators,
    store: Arc<dyn StateStore>,
    filter: ContentFilter,
    output_dir: PathBuf,
    text_extension: Option<String>,
    timeout: Duration,
    respect_robots: bool,
    archive_date: Option<String>,
    checkpoint_interval: usize,
    politeness: Politeness,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// # Arguments
    ///
    /// * `config` - The effective configuration
    /// * `start_url` - Seed address; `https://` is assumed when no scheme is given
    /// * `collaborators` - Fetchers and discovery sources
    /// * `store` - Where checkpoints are read from and written to
    ///
    /// # Errors
    ///
    /// Fails if the start URL has no usable host.
    pub fn new(
        config: &Config,
        start_url: &str,
        collaborators: Collaborators,
        store: Box<dyn StateStore>,
    ) -> Result<Self, UrlError> {
        let start_url = with_default_scheme(start_url);
        let scope = CrawlScope::from_url(&start_url)?;

        Ok(Self {
            start_url,
            scope,
            collaborators,
            store: Arc::from(store),
            filter: ContentFilter::from_config(&config.content),
            output_dir: config.output.output_dir.clone(),
            text_extension: config
                .content
                .text
                .then(|| config.content.text_extension.clone()),
            timeout: Duration::from_secs(config.crawler.timeout_secs),
            respect_robots: config.crawler.respect_robots,
            archive_date: config.crawler.archive_date.clone(),
            checkpoint_interval: config.crawler.checkpoint_interval,
            politeness: Politeness::from_secs(config.crawler.delay_secs),
        })
    }

    pub fn scope(&self) -> &CrawlScope {
        &self.scope
    }

    /// Runs the crawl until the frontier drains or `cancel` fires
    ///
    /// Per-URL failures are recorded in the error set and never abort the
    /// crawl. The only error returned is a failed checkpoint write; the final
    /// checkpoint is still attempted in that case.
    pub async fn run(&self, cancel: CancellationToken) -> Result<CrawlReport, StorageError> {
        let persisted = self.store.load()?;
        let mut state = CrawlState::restore(self.scope.clone(), persisted);

        let mut processed = 0usize;
        let mut status = CrawlStatus::Completed;

        if state.frontier_len() == 0 {
            tracing::info!("Discovery mode: seeding frontier from {}", self.start_url);

            // Seeding works on a copy so an interrupted discovery leaves the
            // frontier empty and the next run discovers again
            let mut seeding = state.clone();
            let seeded = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                added = seed_frontier(
                    &mut seeding,
                    &self.start_url,
                    self.collaborators.sitemap.as_deref(),
                    self.collaborators.archive_index.as_deref(),
                ) => Some(added),
            };
            match seeded {
                Some(added) => {
                    tracing::info!("Frontier seeded with {} URLs", added);
                    state = seeding;
                }
                None => {
                    tracing::info!("Interrupted during discovery; it will run again on resume");
                    status = CrawlStatus::Interrupted;
                }
            }
        } else {
            tracing::info!(
                "Resume mode: {} URLs pending, {} visited, {} errors",
                state.frontier_len(),
                state.visited_len(),
                state.error_len()
            );
        }

        let mut checkpoints = CheckpointManager::new(
            Arc::clone(&self.store),
            self.checkpoint_interval,
            state.visited_len(),
        );

        let result = if status == CrawlStatus::Interrupted {
            Ok(status)
        } else {
            self.crawl_loop(&mut state, &mut checkpoints, &cancel, &mut processed)
                .await
        };

        // Every exit path ends here
        let finalized = checkpoints.finalize(&state);

        let status = result?;
        finalized?;

        let report = CrawlReport {
            status,
            visited: state.visited_len(),
            errors: state.error_len(),
            pending: state.frontier_len(),
            processed,
        };
        tracing::info!(
            "Crawl {}: {} visited, {} errors, {} pending, {} processed this run",
            report.status,
            report.visited,
            report.errors,
            report.pending,
            report.processed
        );
        Ok(report)
    }

    async fn crawl_loop(
        &self,
        state: &mut CrawlState,
        checkpoints: &mut CheckpointManager,
        cancel: &CancellationToken,
        processed: &mut usize,
    ) -> Result<CrawlStatus, StorageError> {
        loop {
            if cancel.is_cancelled() {
                return Ok(CrawlStatus::Interrupted);
            }

            let Some(url) = state.dequeue() else {
                tracing::info!("Frontier is empty, crawl complete");
                return Ok(CrawlStatus::Completed);
            };

            tracing::info!(
                "[{} ✅ | {} ⏳] -> {}",
                state.visited_len(),
                state.frontier_len(),
                url
            );

            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                processed = self.process_url(&url) => Some(processed),
            };

            let Some(Processed { outcome, links }) = result else {
                state.requeue_in_flight();
                tracing::info!("Interrupted while processing {}", url);
                return Ok(CrawlStatus::Interrupted);
            };

            *processed += 1;
            let fetched = outcome != UrlOutcome::Skipped;

            match &outcome {
                UrlOutcome::Failed { live, fallback } => {
                    match fallback {
                        Some(fallback) => tracing::warn!(
                            "Giving up on {}: live fetch failed ({}), archived copy failed ({})",
                            url,
                            live,
                            fallback
                        ),
                        None => tracing::warn!(
                            "Giving up on {}: live fetch failed ({}), no archived copy",
                            url,
                            live
                        ),
                    }
                    state.mark_error(&url);
                }
                UrlOutcome::Recovered => {
                    tracing::info!("Recovered {} from archive", url);
                    state.mark_visited(&url);
                }
                UrlOutcome::Visited | UrlOutcome::Skipped => state.mark_visited(&url),
            }

            if !links.is_empty() {
                let queued = links
                    .iter()
                    .filter_map(|link| resolve_url(&url, link))
                    .filter(|link| state.enqueue(link))
                    .count();
                tracing::debug!("{}: {} links, {} queued", url, links.len(), queued);
            }

            checkpoints.maybe_checkpoint(state)?;

            if fetched && !self.politeness.pause(cancel).await {
                return Ok(CrawlStatus::Interrupted);
            }
        }
    }

    /// Fetches one URL, falling back to the archive on failure
    async fn process_url(&self, url: &str) -> Processed {
        let class = ContentClass::from_url(url);
        if !self.filter.accepts(class) {
            tracing::debug!("Skipping {} ({} downloads disabled)", url, class);
            return Processed {
                outcome: UrlOutcome::Skipped,
                links: Vec::new(),
            };
        }

        let live = match self.fetch_and_store(url, url, class, true).await {
            Ok(links) => {
                return Processed {
                    outcome: UrlOutcome::Visited,
                    links,
                }
            }
            Err(e) => e,
        };

        tracing::warn!("Live fetch of {} failed: {}; trying archive", url, live);

        let snapshot = self
            .collaborators
            .snapshots
            .lookup_snapshot(url, self.archive_date.as_deref())
            .await;

        let outcome = match snapshot {
            None => UrlOutcome::Failed {
                live,
                fallback: None,
            },
            Some(snapshot) => {
                tracing::debug!("Fetching archived copy {}", snapshot);
                match self.fetch_and_store(&snapshot, url, class, false).await {
                    Ok(_) => UrlOutcome::Recovered,
                    Err(fallback) => UrlOutcome::Failed {
                        live,
                        fallback: Some(fallback),
                    },
                }
            }
        };

        Processed {
            outcome,
            links: Vec::new(),
        }
    }

    /// Fetches `source` and writes it at the local path of `target`
    ///
    /// `live` fetches honour the robots setting and report the page's links;
    /// archive fetches do neither.
    async fn fetch_and_store(
        &self,
        source: &str,
        target: &str,
        class: ContentClass,
        live: bool,
    ) -> Result<Vec<String>, FetchFailure> {
        let path = local_path(&self.output_dir, class.subfolder(), target)
            .map_err(|e| FetchFailure::Write(e.to_string()))?;

        if !class.is_web() {
            let bytes = self.collaborators.binaries.fetch_binary(source).await?;
            write_file(&path, &bytes).await?;
            return Ok(Vec::new());
        }

        let request = PageRequest {
            url: source.to_string(),
            timeout: self.timeout,
            respect_robots: live && self.respect_robots,
        };
        let page = self.collaborators.pages.fetch_page(&request).await?;
        write_file(&path, page.html.as_bytes()).await?;

        if let (Some(ext), Some(text)) = (&self.text_extension, &page.text) {
            match sidecar_path(&self.output_dir, TEXT_SUBFOLDER, target, ext) {
                Ok(text_path) => {
                    if let Err(e) = write_file(&text_path, text.as_bytes()).await {
                        tracing::warn!("Could not write text for {}: {}", target, e);
                    }
                }
                Err(e) => tracing::warn!("No text path for {}: {}", target, e),
            }
        }

        if live {
            Ok(page.links.all().map(str::to_string).collect())
        } else {
            Ok(Vec::new())
        }
    }
}

async fn write_file(path: &Path, bytes: &[u8]) -> Result<(), FetchFailure> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| FetchFailure::Write(format!("{}: {}", parent.display(), e)))?;
    }
    tokio::fs::write(path, bytes)
        .await
        .map_err(|e| FetchFailure::Write(format!("{}: {}", path.display(), e)))
}
