//! Content classification and local storage layout
//!
//! This module decides what a URL is (web page, PDF, document, media), whether
//! the current crawl wants it, and where it is written on disk.

mod class;
mod path;

pub use class::ContentClass;
pub use path::{local_path, sidecar_path, INDEX_FILE};

use crate::config::ContentConfig;

/// Subfolder holding extracted page text
pub const TEXT_SUBFOLDER: &str = "text";

/// Which content classes a crawl downloads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentFilter {
    pub web: bool,
    pub pdf: bool,
    pub docs: bool,
    pub media: bool,
}

impl ContentFilter {
    /// Builds a filter from the content configuration
    ///
    /// With no class enabled the crawl falls back to web pages only. The text
    /// sidecar toggle counts as a request for web pages, since text is only
    /// extracted from fetched pages.
    pub fn from_config(config: &ContentConfig) -> Self {
        let filter = Self {
            web: config.web || config.text,
            pdf: config.pdf,
            docs: config.docs,
            media: config.media,
        };

        if filter.is_empty() {
            Self::web_only()
        } else {
            filter
        }
    }

    /// A filter accepting only web pages
    pub fn web_only() -> Self {
        Self {
            web: true,
            pdf: false,
            docs: false,
            media: false,
        }
    }

    /// Returns true if the class should be downloaded
    pub fn accepts(&self, class: ContentClass) -> bool {
        match class {
            ContentClass::Web => self.web,
            ContentClass::Pdf => self.pdf,
            ContentClass::Docs => self.docs,
            ContentClass::Media => self.media,
        }
    }

    fn is_empty(&self) -> bool {
        !(self.web || self.pdf || self.docs || self.media)
    }
}
