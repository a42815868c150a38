//! Web archive integration
//!
//! Provides the Wayback Machine client used for archive-index discovery and
//! for recovering URLs the live site no longer serves.

mod clean;
mod wayback;

pub use clean::clean_archive_url;
pub use wayback::{raw_capture_url, WaybackClient, AVAILABILITY_ENDPOINT, CDX_ENDPOINT, CDX_LIMIT};
