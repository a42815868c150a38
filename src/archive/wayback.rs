//! Wayback Machine client
//!
//! Two endpoints are used:
//! - the CDX index, listing every original URL captured under a domain
//! - the availability API, returning the capture closest to a timestamp

use crate::crawler::{ArchiveIndexSource, DiscoveryError, SnapshotLookup};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

/// CDX search endpoint
pub const CDX_ENDPOINT: &str = "http://web.archive.org/cdx/search/cdx";

/// Availability API endpoint
pub const AVAILABILITY_ENDPOINT: &str = "http://archive.org/wayback/available";

/// Maximum number of rows requested from the CDX index
pub const CDX_LIMIT: usize = 15000;

const CDX_TIMEOUT: Duration = Duration::from_secs(60);
const AVAILABILITY_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Default, Deserialize)]
struct AvailabilityResponse {
    #[serde(default)]
    archived_snapshots: ArchivedSnapshots,
}

#[derive(Debug, Default, Deserialize)]
struct ArchivedSnapshots {
    closest: Option<ClosestSnapshot>,
}

#[derive(Debug, Deserialize)]
struct ClosestSnapshot {
    url: String,
    available: Option<bool>,
}

/// Client for the Wayback Machine APIs
#[derive(Debug, Clone)]
pub struct WaybackClient {
    client: Client,
    cdx_endpoint: String,
    availability_endpoint: String,
}

impl WaybackClient {
    /// Creates a client against the public Wayback Machine
    pub fn new(client: Client) -> Self {
        Self::with_endpoints(client, CDX_ENDPOINT, AVAILABILITY_ENDPOINT)
    }

    /// Creates a client against other endpoints, such as a local mirror
    pub fn with_endpoints(
        client: Client,
        cdx_endpoint: impl Into<String>,
        availability_endpoint: impl Into<String>,
    ) -> Self {
        Self {
            client,
            cdx_endpoint: cdx_endpoint.into(),
            availability_endpoint: availability_endpoint.into(),
        }
    }

    /// Lists the distinct original URLs captured under `domain`
    pub async fn captured_urls(&self, domain: &str) -> Result<Vec<String>, DiscoveryError> {
        let pattern = format!("{}/*", domain);
        let limit = CDX_LIMIT.to_string();
        let response = self
            .client
            .get(&self.cdx_endpoint)
            .query(&[
                ("url", pattern.as_str()),
                ("output", "json"),
                ("fl", "original"),
                ("collapse", "urlkey"),
                ("limit", limit.as_str()),
            ])
            .timeout(CDX_TIMEOUT)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DiscoveryError::Status {
                url: self.cdx_endpoint.clone(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        parse_cdx_rows(&body)
    }

    /// Finds the capture of `url` closest to `date`
    ///
    /// The returned address points at the raw capture, without the archive's
    /// navigation toolbar.
    pub async fn closest_snapshot(
        &self,
        url: &str,
        date: Option<&str>,
    ) -> Result<Option<String>, DiscoveryError> {
        let mut query = vec![("url", url)];
        if let Some(date) = date {
            query.push(("timestamp", date));
        }

        let response = self
            .client
            .get(&self.availability_endpoint)
            .query(&query)
            .timeout(AVAILABILITY_TIMEOUT)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DiscoveryError::Status {
                url: self.availability_endpoint.clone(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        let parsed: AvailabilityResponse = serde_json::from_str(&body)?;

        Ok(parsed
            .archived_snapshots
            .closest
            .filter(|snapshot| snapshot.available != Some(false))
            .map(|snapshot| raw_capture_url(&snapshot.url)))
    }
}

#[async_trait]
impl ArchiveIndexSource for WaybackClient {
    async fn discover_archive_index(&self, domain: &str) -> Result<Vec<String>, DiscoveryError> {
        self.captured_urls(domain).await
    }
}

#[async_trait]
impl SnapshotLookup for WaybackClient {
    async fn lookup_snapshot(&self, url: &str, date: Option<&str>) -> Option<String> {
        match self.closest_snapshot(url, date).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::debug!("Snapshot lookup for {} failed: {}", url, e);
                None
            }
        }
    }
}

/// Parses a CDX JSON response with a single `original` field
///
/// The first row is the header. An empty body means no captures.
fn parse_cdx_rows(body: &str) -> Result<Vec<String>, DiscoveryError> {
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }

    let rows: Vec<Vec<String>> = serde_json::from_str(body)?;
    Ok(rows
        .into_iter()
        .skip(1)
        .filter_map(|row| row.into_iter().next())
        .collect())
}

/// Rewrites a capture address to its raw form
///
/// `/web/<timestamp>/` becomes `/web/<timestamp>id_/`. Addresses that already
/// carry a modifier, or that are not capture addresses, are returned as is.
pub fn raw_capture_url(address: &str) -> String {
    const MARKER: &str = "/web/";

    let Some(start) = address.find(MARKER).map(|i| i + MARKER.len()) else {
        return address.to_string();
    };
    let Some(len) = address[start..].find('/') else {
        return address.to_string();
    };

    let timestamp = &address[start..start + len];
    if timestamp.is_empty() || !timestamp.chars().all(|c| c.is_ascii_digit()) {
        return address.to_string();
    }

    format!(
        "{}id_{}",
        &address[..start + len],
        &address[start + len..]
    )
}
