//! Crawl scope checks
//!
//! Links are only followed when their host falls inside the domain of the
//! start URL.

use crate::url::domain::domain_of;
use crate::UrlError;

/// The authority boundary a crawl may not leave
///
/// A URL is in scope when its host contains the scope domain as a substring,
/// so `blog.example.com` is in the scope of `example.com`. A leading `www.` on
/// the seed host is dropped first so the bare domain is in scope too.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlScope {
    domain: String,
}

impl CrawlScope {
    /// Creates a scope from a bare domain such as `example.com`
    pub fn new(domain: &str) -> Self {
        let domain = domain.trim().to_lowercase();
        let domain = domain.strip_prefix("www.").unwrap_or(&domain).to_string();
        Self { domain }
    }

    /// Derives the scope from the crawl's start URL
    pub fn from_url(start_url: &str) -> Result<Self, UrlError> {
        let domain = domain_of(start_url).ok_or(UrlError::MissingDomain)?;
        Ok(Self::new(&domain))
    }

    /// The scope domain
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Returns true if `url` falls inside this scope
    pub fn contains(&self, url: &str) -> bool {
        domain_of(url).is_some_and(|host| host.contains(&self.domain))
    }
}
