//! URL handling module for Site-Mirror
//!
//! This module provides URL normalization, link resolution, domain extraction
//! and crawl scope checks.

mod domain;
mod normalize;
mod scope;

// Re-export main functions
pub use domain::{domain_of, extract_domain};
pub use normalize::{normalize_url, resolve_url, with_default_scheme};
pub use scope::CrawlScope;
