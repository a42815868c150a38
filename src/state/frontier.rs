//! Frontier and visitation store
//!
//! `CrawlState` owns the three URL sets of a crawl: the FIFO frontier, the
//! visited set and the error set. It is exclusively owned by the crawl task, so
//! none of it needs locking. The sets stay pairwise disjoint after every call.

use crate::state::UrlState;
use crate::storage::PersistedState;
use crate::url::{normalize_url, CrawlScope};
use std::collections::{BTreeSet, HashSet, VecDeque};

/// Frontier, visited set and error set of one crawl
#[derive(Debug, Clone)]
pub struct CrawlState {
    scope: CrawlScope,

    /// Pending URLs in insertion order
    frontier: VecDeque<String>,

    /// Membership index over `frontier`
    pending: HashSet<String>,

    visited: BTreeSet<String>,

    errors: BTreeSet<String>,

    /// The URL currently being processed, if any
    in_flight: Option<String>,
}

impl CrawlState {
    /// Creates an empty state bounded by `scope`
    pub fn new(scope: CrawlScope) -> Self {
        Self {
            scope,
            frontier: VecDeque::new(),
            pending: HashSet::new(),
            visited: BTreeSet::new(),
            errors: BTreeSet::new(),
            in_flight: None,
        }
    }

    /// Rebuilds a crawl state from persisted checkpoint files
    ///
    /// Terminal sets are restored first, so any persisted frontier entry that was
    /// already visited or failed is dropped. Frontier entries also go through the
    /// normal enqueue path, which removes duplicates and out-of-scope URLs. A URL
    /// listed as both visited and failed counts as visited.
    ///
    /// # Arguments
    ///
    /// * `scope` - The crawl scope persisted frontier entries are checked against
    /// * `persisted` - The sets read from the checkpoint files
    pub fn restore(scope: CrawlScope, persisted: PersistedState) -> Self {
        let mut state = Self::new(scope);

        for url in persisted.visited {
            if let Some(key) = restore_key(&url) {
                state.visited.insert(key);
            }
        }

        for url in persisted.errors {
            if let Some(key) = restore_key(&url) {
                if !state.visited.contains(&key) {
                    state.errors.insert(key);
                }
            }
        }

        let mut dropped = 0usize;
        for url in persisted.frontier {
            if !state.enqueue(&url) {
                dropped += 1;
            }
        }

        tracing::debug!(
            "Restored state: {} pending ({} dropped), {} visited, {} errors",
            state.frontier.len(),
            dropped,
            state.visited.len(),
            state.errors.len()
        );

        state
    }

    /// The scope this crawl is bounded by
    pub fn scope(&self) -> &CrawlScope {
        &self.scope
    }

    /// Returns true if the URL is pending, in flight, visited or failed
    pub fn contains(&self, url: &str) -> bool {
        self.status(url).is_some()
    }

    /// Returns which set the URL belongs to, if any
    pub fn status(&self, url: &str) -> Option<UrlState> {
        let key = key(url);

        if self.in_flight.as_deref() == Some(key.as_str()) {
            Some(UrlState::InFlight)
        } else if self.pending.contains(&key) {
            Some(UrlState::Pending)
        } else if self.visited.contains(&key) {
            Some(UrlState::Visited)
        } else if self.errors.contains(&key) {
            Some(UrlState::Error)
        } else {
            None
        }
    }

    /// Appends a URL to the frontier
    ///
    /// The URL is normalized first. It is added only if it parses, lies inside
    /// the crawl scope and is not already known in any state.
    ///
    /// # Arguments
    ///
    /// * `url` - An absolute URL; relative links must be resolved first
    ///
    /// # Returns
    ///
    /// `true` if the URL was added
    pub fn enqueue(&mut self, url: &str) -> bool {
        let normalized = match normalize_url(url) {
            Ok(n) => n,
            Err(e) => {
                tracing::trace!("Not enqueueing {}: {}", url, e);
                return false;
            }
        };

        if !self.scope.contains(&normalized) || self.contains(&normalized) {
            return false;
        }

        self.pending.insert(normalized.clone());
        self.frontier.push_back(normalized);
        true
    }

    /// Pops the oldest pending URL and marks it in flight
    pub fn dequeue(&mut self) -> Option<String> {
        if let Some(previous) = self.in_flight.take() {
            // Never settled; keep it rather than lose it
            tracing::warn!("Re-queueing unsettled URL {}", previous);
            self.pending.insert(previous.clone());
            self.frontier.push_back(previous);
        }

        let url = self.frontier.pop_front()?;
        self.pending.remove(&url);
        self.in_flight = Some(url.clone());
        Some(url)
    }

    /// Moves a URL into the visited set
    ///
    /// Safe to call twice, or for a URL that is not in flight.
    pub fn mark_visited(&mut self, url: &str) {
        let key = key(url);
        self.forget_active(&key);
        self.errors.remove(&key);
        self.visited.insert(key);
    }

    /// Moves a URL into the error set
    ///
    /// A URL that is already visited stays visited.
    pub fn mark_error(&mut self, url: &str) {
        let key = key(url);
        self.forget_active(&key);
        if !self.visited.contains(&key) {
            self.errors.insert(key);
        }
    }

    /// Puts the in-flight URL back at the head of the frontier
    ///
    /// Used when processing is interrupted before the URL was settled.
    pub fn requeue_in_flight(&mut self) -> Option<String> {
        let url = self.in_flight.take()?;
        self.pending.insert(url.clone());
        self.frontier.push_front(url.clone());
        Some(url)
    }

    /// The URL currently being processed
    pub fn in_flight(&self) -> Option<&str> {
        self.in_flight.as_deref()
    }

    /// Number of pending URLs, excluding the one in flight
    pub fn frontier_len(&self) -> usize {
        self.frontier.len()
    }

    /// Returns whether nothing is pending or in flight
    pub fn is_drained(&self) -> bool {
        self.frontier.is_empty() && self.in_flight.is_none()
    }

    pub fn visited_len(&self) -> usize {
        self.visited.len()
    }

    pub fn error_len(&self) -> usize {
        self.errors.len()
    }

    /// Visited URLs in lexicographic order
    pub fn visited(&self) -> impl Iterator<Item = &str> {
        self.visited.iter().map(String::as_str)
    }

    /// Failed URLs in lexicographic order
    pub fn errors(&self) -> impl Iterator<Item = &str> {
        self.errors.iter().map(String::as_str)
    }

    /// Pending URLs in frontier order
    pub fn pending(&self) -> impl Iterator<Item = &str> {
        self.frontier.iter().map(String::as_str)
    }

    /// Copies the state for checkpointing
    ///
    /// The in-flight URL is written as pending so an interrupted URL is retried
    /// on resume.
    pub fn snapshot(&self) -> PersistedState {
        let frontier = self
            .in_flight
            .iter()
            .chain(self.frontier.iter())
            .cloned()
            .collect();

        PersistedState {
            frontier,
            visited: self.visited.iter().cloned().collect(),
            errors: self.errors.iter().cloned().collect(),
        }
    }

    fn forget_active(&mut self, key: &str) {
        if self.in_flight.as_deref() == Some(key) {
            self.in_flight = None;
        }
        if self.pending.remove(key) {
            self.frontier.retain(|u| u != key);
        }
    }
}

/// Lookup key for a URL: its normalized form, or the trimmed input if unparsable
fn key(url: &str) -> String {
    normalize_url(url).unwrap_or_else(|_| url.trim().to_string())
}

fn restore_key(url: &str) -> Option<String> {
    match normalize_url(url) {
        Ok(n) => Some(n),
        Err(e) => {
            tracing::warn!("Ignoring unreadable state entry {:?}: {}", url, e);
            None
        }
    }
}
