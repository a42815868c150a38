//! Fetching collaborators and their HTTP implementations
//!
//! This module defines the seams between the crawl loop and the network:
//! - `PageFetcher` renders a web page and reports its links
//! - `BinaryFetcher` transfers raw bytes (PDFs, documents, media)
//! - `SnapshotLookup` finds an archived copy of a URL
//!
//! It also provides the default reqwest-backed implementations and the
//! shared HTTP client builder.

use crate::config::UserAgentConfig;
use crate::crawler::parser::{extract_text, parse_html};
use crate::robots::{origin_of, RobotsCache};
use async_trait::async_trait;
use reqwest::{redirect::Policy, Client};
use std::time::Duration;
use thiserror::Error;

/// Why a single fetch attempt failed
///
/// Failures are values: the crawl loop records them and moves on to the
/// archive fallback rather than aborting.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchFailure {
    #[error("request timed out")]
    Timeout,

    #[error("HTTP status {0}")]
    Http(u16),

    #[error("network error: {0}")]
    Network(String),

    #[error("disallowed by robots.txt")]
    RobotsDenied,

    #[error("could not write file: {0}")]
    Write(String),
}

impl From<reqwest::Error> for FetchFailure {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if let Some(status) = e.status() {
            Self::Http(status.as_u16())
        } else {
            Self::Network(e.to_string())
        }
    }
}

/// A request to render one web page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub url: String,
    pub timeout: Duration,
    pub respect_robots: bool,
}

/// Links reported by a page fetcher
///
/// Entries may be absolute or relative to the page; the crawl loop resolves
/// them against the page URL before enqueueing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageLinks {
    /// Links on the same host as the page
    pub internal: Vec<String>,

    /// Links on other hosts
    pub external: Vec<String>,
}

impl PageLinks {
    /// Internal links followed by external links
    pub fn all(&self) -> impl Iterator<Item = &str> {
        self.internal
            .iter()
            .chain(self.external.iter())
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.internal.len() + self.external.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A successfully fetched page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchedPage {
    pub html: String,

    /// Readable text, when the fetcher extracts it
    pub text: Option<String>,

    pub links: PageLinks,
}

/// Renders web pages
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch_page(&self, request: &PageRequest) -> Result<FetchedPage, FetchFailure>;
}

/// Transfers non-HTML resources
#[async_trait]
pub trait BinaryFetcher: Send + Sync {
    async fn fetch_binary(&self, url: &str) -> Result<Vec<u8>, FetchFailure>;
}

/// Finds archived copies of URLs
#[async_trait]
pub trait SnapshotLookup: Send + Sync {
    /// Returns the address of the archived copy closest to `date` (`YYYYMMDD`),
    /// or the most recent one when no date is given
    async fn lookup_snapshot(&self, url: &str, date: Option<&str>) -> Option<String>;
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The user agent configuration
/// * `timeout` - Default per-request timeout
///
/// # Example
///
/// ```no_run
/// use site_mirror::config::UserAgentConfig;
/// use site_mirror::crawler::build_http_client;
/// use std::time::Duration;
///
/// let client = build_http_client(&UserAgentConfig::default(), Duration::from_secs(60)).unwrap();
/// ```
pub fn build_http_client(
    config: &UserAgentConfig,
    timeout: Duration,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Page fetcher backed by reqwest and scraper
///
/// Pages are fetched as served; no script is executed.
#[derive(Debug)]
pub struct HttpPageFetcher {
    client: Client,
    robots: RobotsCache,
    agent_token: String,
    extract_text: bool,
}

impl HttpPageFetcher {
    /// Creates a fetcher that matches robots.txt groups against `agent_token`
    pub fn new(client: Client, agent_token: impl Into<String>) -> Self {
        Self {
            client,
            robots: RobotsCache::new(),
            agent_token: agent_token.into(),
            extract_text: false,
        }
    }

    /// Also extract readable text from every page
    pub fn with_text(mut self, extract_text: bool) -> Self {
        self.extract_text = extract_text;
        self
    }

    async fn allowed_by_robots(&self, url: &str) -> bool {
        let Some(origin) = origin_of(url) else {
            return true;
        };
        let robots = self.robots.get_or_fetch(&self.client, &origin).await;
        robots.is_allowed(url, &self.agent_token)
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch_page(&self, request: &PageRequest) -> Result<FetchedPage, FetchFailure> {
        if request.respect_robots && !self.allowed_by_robots(&request.url).await {
            return Err(FetchFailure::RobotsDenied);
        }

        let response = self
            .client
            .get(&request.url)
            .timeout(request.timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchFailure::Http(status.as_u16()));
        }

        let final_url = response.url().clone();
        let html = response.text().await?;

        let parsed = parse_html(&html, &final_url);
        let text = self.extract_text.then(|| extract_text(&html));

        tracing::debug!(
            "Fetched {} ({} bytes, {} internal / {} external links)",
            final_url,
            html.len(),
            parsed.internal.len(),
            parsed.external.len()
        );

        Ok(FetchedPage {
            html,
            text,
            links: PageLinks {
                internal: parsed.internal,
                external: parsed.external,
            },
        })
    }
}

/// Binary fetcher backed by reqwest
#[derive(Debug, Clone)]
pub struct HttpBinaryFetcher {
    client: Client,
    timeout: Duration,
}

impl HttpBinaryFetcher {
    pub fn new(client: Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }
}

#[async_trait]
impl BinaryFetcher for HttpBinaryFetcher {
    async fn fetch_binary(&self, url: &str) -> Result<Vec<u8>, FetchFailure> {
        let response = self
            .client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchFailure::Http(status.as_u16()));
        }

        Ok(response.bytes().await?.to_vec())
    }
}
