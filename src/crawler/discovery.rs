//! URL discovery for a fresh crawl
//!
//! When there is nothing to resume, the frontier is seeded with the start URL
//! and, optionally, with URLs announced by the site's sitemaps and URLs the
//! web archive has captured for the domain.
//!
//! Sitemaps are located through `Sitemap:` lines in robots.txt, falling back
//! to `/sitemap.xml`. Sitemap index files are followed up to
//! [`MAX_INDEX_DEPTH`] levels.

use crate::archive::clean_archive_url;
use crate::robots::{fetch_robots, origin_of};
use crate::state::CrawlState;
use crate::url::{domain_of, with_default_scheme};
use async_trait::async_trait;
use quick_xml::events::Event;
use quick_xml::Reader;
use reqwest::Client;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Maximum recursion depth for sitemap index files
pub const MAX_INDEX_DEPTH: u8 = 2;

/// Errors raised by discovery sources
///
/// Discovery is best effort: the crawl logs these and carries on with
/// whatever was found.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("malformed XML: {0}")]
    Xml(String),

    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("sitemap index nesting exceeds {0} levels")]
    TooDeep(u8),

    #[error("invalid start URL: {0}")]
    InvalidUrl(String),
}

/// Lists URLs announced by a site's sitemaps
#[async_trait]
pub trait SitemapSource: Send + Sync {
    async fn discover_sitemap(&self, start_url: &str) -> Result<Vec<String>, DiscoveryError>;
}

/// Lists URLs an archive has captured for a domain
#[async_trait]
pub trait ArchiveIndexSource: Send + Sync {
    async fn discover_archive_index(&self, domain: &str) -> Result<Vec<String>, DiscoveryError>;
}

/// Seeds an empty frontier
///
/// Enqueues the start URL (with `https://` added when it has no scheme), then
/// sitemap URLs, then archive URLs. Everything passes through
/// [`CrawlState::enqueue`], so out-of-scope and duplicate URLs are dropped.
/// Source failures are logged and count as no URLs.
///
/// # Returns
///
/// The number of URLs added to the frontier
pub async fn seed_frontier(
    state: &mut CrawlState,
    start_url: &str,
    sitemap: Option<&dyn SitemapSource>,
    archive: Option<&dyn ArchiveIndexSource>,
) -> usize {
    let start = with_default_scheme(start_url);
    let mut added = usize::from(state.enqueue(&start));

    if let Some(source) = sitemap {
        match source.discover_sitemap(&start).await {
            Ok(urls) => {
                let count = enqueue_all(state, &urls);
                tracing::info!("Sitemap discovery: {} URLs found, {} queued", urls.len(), count);
                added += count;
            }
            Err(e) => tracing::warn!("Sitemap discovery failed: {}", e),
        }
    }

    if let Some(source) = archive {
        match domain_of(&start) {
            Some(domain) => match source.discover_archive_index(&domain).await {
                Ok(urls) => {
                    // The index occasionally lists captures of captures
                    let urls: Vec<String> = urls
                        .into_iter()
                        .map(|url| clean_archive_url(&url).unwrap_or(url))
                        .collect();
                    let count = enqueue_all(state, &urls);
                    tracing::info!("Archive discovery: {} URLs found, {} queued", urls.len(), count);
                    added += count;
                }
                Err(e) => tracing::warn!("Archive discovery failed: {}", e),
            },
            None => tracing::warn!("Archive discovery skipped: no domain in {}", start),
        }
    }

    added
}

fn enqueue_all(state: &mut CrawlState, urls: &[String]) -> usize {
    urls.iter().filter(|url| state.enqueue(url)).count()
}

/// Sitemap source that reads robots.txt and sitemap XML over HTTP
#[derive(Debug, Clone)]
pub struct SitemapDiscovery {
    client: Client,
}

impl SitemapDiscovery {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Fetches one sitemap, following index files
    fn fetch_recursive<'a>(
        &'a self,
        url: String,
        depth: u8,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<String>, DiscoveryError>> + Send + 'a>> {
        Box::pin(async move {
            if depth > MAX_INDEX_DEPTH {
                return Err(DiscoveryError::TooDeep(MAX_INDEX_DEPTH));
            }

            tracing::debug!("Fetching sitemap {} (depth {})", url, depth);

            let response = self.client.get(&url).send().await?;
            let status = response.status();
            if !status.is_success() {
                return Err(DiscoveryError::Status {
                    url,
                    status: status.as_u16(),
                });
            }
            let xml = response.text().await?;

            match parse_sitemap(&xml)? {
                SitemapDocument::UrlSet(urls) => Ok(urls),
                SitemapDocument::Index(children) => {
                    let mut urls = Vec::new();
                    for child in children {
                        match self.fetch_recursive(child.clone(), depth + 1).await {
                            Ok(found) => urls.extend(found),
                            Err(e) => tracing::warn!("Skipping child sitemap {}: {}", child, e),
                        }
                    }
                    Ok(urls)
                }
            }
        })
    }
}

#[async_trait]
impl SitemapSource for SitemapDiscovery {
    async fn discover_sitemap(&self, start_url: &str) -> Result<Vec<String>, DiscoveryError> {
        let origin = origin_of(&with_default_scheme(start_url))
            .ok_or_else(|| DiscoveryError::InvalidUrl(start_url.to_string()))?;

        let mut sitemaps = fetch_robots(&self.client, &origin).await.sitemaps();
        if sitemaps.is_empty() {
            sitemaps.push(format!("{}/sitemap.xml", origin));
        }

        let mut urls = Vec::new();
        let mut last_error = None;
        for sitemap in sitemaps {
            match self.fetch_recursive(sitemap.clone(), 0).await {
                Ok(found) => urls.extend(found),
                Err(e) => {
                    tracing::debug!("Sitemap {} unavailable: {}", sitemap, e);
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) if urls.is_empty() => Err(e),
            _ => Ok(urls),
        }
    }
}

/// A parsed sitemap file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SitemapDocument {
    /// A `<urlset>` listing page URLs
    UrlSet(Vec<String>),

    /// A `<sitemapindex>` listing child sitemaps
    Index(Vec<String>),
}

/// Parses sitemap XML into its `<loc>` entries
pub fn parse_sitemap(xml: &str) -> Result<SitemapDocument, DiscoveryError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut is_index = None;
    let mut in_loc = false;
    let mut locs = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let name = e.local_name();
                let name = name.as_ref();
                if is_index.is_none() {
                    is_index = match name {
                        b"sitemapindex" => Some(true),
                        b"urlset" => Some(false),
                        other => {
                            return Err(DiscoveryError::Xml(format!(
                                "unexpected root element <{}>",
                                String::from_utf8_lossy(other)
                            )))
                        }
                    };
                }
                in_loc = name == b"loc";
            }
            Ok(Event::End(_)) => in_loc = false,
            Ok(Event::Text(e)) if in_loc => {
                let text = e.unescape().map_err(|e| DiscoveryError::Xml(e.to_string()))?;
                push_loc(&mut locs, &text);
            }
            Ok(Event::CData(e)) if in_loc => {
                push_loc(&mut locs, &String::from_utf8_lossy(&e));
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(DiscoveryError::Xml(e.to_string())),
            _ => {}
        }
        buf.clear();
    }

    match is_index {
        Some(true) => Ok(SitemapDocument::Index(locs)),
        Some(false) => Ok(SitemapDocument::UrlSet(locs)),
        None => Err(DiscoveryError::Xml("document has no root element".to_string())),
    }
}

fn push_loc(locs: &mut Vec<String>, text: &str) {
    let text = text.trim();
    if !text.is_empty() {
        locs.push(text.to_string());
    }
}
