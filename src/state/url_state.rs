/// URL state definitions for tracking crawl progress
///
/// Every URL the crawl has produced is in exactly one of these states.
use std::fmt;

/// Represents the current state of a URL in the crawl process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UrlState {
    // ===== Active States =====
    /// URL is in the frontier waiting to be fetched
    Pending,

    /// URL has been dequeued and is being processed
    InFlight,

    // ===== Terminal States =====
    /// URL was downloaded, or skipped on purpose by the content filter
    Visited,

    /// URL failed both the live fetch and the archive fallback
    Error,
}

impl UrlState {
    /// Returns true if this is a terminal state (never re-enters the frontier)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Visited | Self::Error)
    }

    /// Returns true if this is an active state (URL may still be processed)
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Pending | Self::InFlight)
    }

    /// Short lowercase label used in logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InFlight => "in_flight",
            Self::Visited => "visited",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for UrlState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
