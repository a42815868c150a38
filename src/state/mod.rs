//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `UrlState`: which of the crawl's URL sets a URL currently belongs to
//! - `CrawlState`: the frontier, visited set and error set owned by the crawl task

mod frontier;
mod url_state;

// Re-export main types
pub use frontier::CrawlState;
pub use url_state::UrlState;
