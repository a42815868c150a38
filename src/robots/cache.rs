//! Robots.txt caching implementation
//!
//! Parsed robots.txt files are kept per origin and refetched after 24 hours.

use crate::robots::{fetch_robots, ParsedRobots};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Mutex;

/// Cached robots.txt data for one origin
#[derive(Debug, Clone)]
pub struct CachedRobots {
    /// The parsed robots.txt content
    pub content: ParsedRobots,

    /// When the robots.txt was fetched
    pub fetched_at: DateTime<Utc>,
}

impl CachedRobots {
    /// Creates a new entry stamped with the current time
    pub fn new(content: ParsedRobots) -> Self {
        Self {
            content,
            fetched_at: Utc::now(),
        }
    }

    /// Checks if the entry is older than 24 hours
    pub fn is_stale(&self) -> bool {
        self.age() > Duration::hours(24)
    }

    /// Returns how long ago the robots.txt was fetched
    pub fn age(&self) -> Duration {
        Utc::now() - self.fetched_at
    }
}

/// Per-origin robots.txt cache shared by a fetcher
#[derive(Debug, Default)]
pub struct RobotsCache {
    entries: Mutex<HashMap<String, CachedRobots>>,
}

impl RobotsCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached rules for `origin`, if present and fresh
    pub fn get(&self, origin: &str) -> Option<ParsedRobots> {
        let entries = self.entries.lock().ok()?;
        entries
            .get(origin)
            .filter(|cached| !cached.is_stale())
            .map(|cached| cached.content.clone())
    }

    /// Stores rules for `origin`
    pub fn insert(&self, origin: &str, robots: ParsedRobots) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(origin.to_string(), CachedRobots::new(robots));
        }
    }

    /// Returns the rules for `origin`, fetching them when absent or stale
    ///
    /// # Arguments
    ///
    /// * `client` - HTTP client used for the robots.txt request
    /// * `origin` - Scheme, host and port, e.g. `https://example.com`
    ///
    /// # Returns
    ///
    /// The parsed rules. A robots.txt that cannot be fetched allows everything
    /// and is cached like any other.
    pub async fn get_or_fetch(&self, client: &reqwest::Client, origin: &str) -> ParsedRobots {
        if let Some(robots) = self.get(origin) {
            return robots;
        }

        let robots = fetch_robots(client, origin).await;
        self.insert(origin, robots.clone());
        robots
    }

    #[cfg(test)]
    fn backdate(&self, origin: &str, hours: i64) {
        let mut entries = self.entries.lock().unwrap();
        if let Some(entry) = entries.get_mut(origin) {
            entry.fetched_at = Utc::now() - Duration::hours(hours);
        }
    }
}
