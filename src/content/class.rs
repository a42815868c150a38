//! Content class definitions
//!
//! A URL's content class is derived from its path suffix and decides both how the
//! resource is fetched and which output subfolder it lands in.

use std::fmt;
use url::Url;

const PDF_EXTENSIONS: &[&str] = &[".pdf"];

const DOCS_EXTENSIONS: &[&str] = &[
    ".doc", ".docx", ".xls", ".xlsx", ".ppt", ".pptx", ".txt", ".rfa", ".ifc", ".dwg",
];

const MEDIA_EXTENSIONS: &[&str] = &[
    ".jpg", ".jpeg", ".png", ".gif", ".svg", ".mp4", ".avi", ".mov", ".mp3",
];

/// Routing category of a URL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentClass {
    /// HTML-like pages, the default for anything without a known binary suffix
    Web,
    /// PDF documents
    Pdf,
    /// Office documents, plain text and CAD files
    Docs,
    /// Images, audio and video
    Media,
}

impl ContentClass {
    /// Classifies a URL by the suffix of its path
    ///
    /// Matching is case-insensitive. Query strings and fragments are ignored when
    /// the URL parses; unparsable input is matched as-is.
    ///
    /// # Examples
    ///
    /// ```
    /// use site_mirror::ContentClass;
    ///
    /// assert_eq!(ContentClass::from_url("https://example.com/a.PDF"), ContentClass::Pdf);
    /// assert_eq!(ContentClass::from_url("https://example.com/about"), ContentClass::Web);
    /// ```
    pub fn from_url(url: &str) -> Self {
        let path = Url::parse(url)
            .map(|u| u.path().to_string())
            .unwrap_or_else(|_| url.to_string())
            .to_lowercase();

        let has_suffix = |exts: &[&str]| exts.iter().any(|ext| path.ends_with(ext));

        if has_suffix(PDF_EXTENSIONS) {
            Self::Pdf
        } else if has_suffix(DOCS_EXTENSIONS) {
            Self::Docs
        } else if has_suffix(MEDIA_EXTENSIONS) {
            Self::Media
        } else {
            Self::Web
        }
    }

    /// Returns true for classes fetched by the page fetcher
    pub fn is_web(&self) -> bool {
        matches!(self, Self::Web)
    }

    /// Output subfolder for this class
    pub fn subfolder(&self) -> &'static str {
        match self {
            Self::Web => "web",
            Self::Pdf => "pdf",
            Self::Docs => "docs",
            Self::Media => "media",
        }
    }

    /// Returns all content classes
    pub fn all() -> [Self; 4] {
        [Self::Web, Self::Pdf, Self::Docs, Self::Media]
    }
}

impl fmt::Display for ContentClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.subfolder())
    }
}
