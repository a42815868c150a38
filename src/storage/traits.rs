//! Storage traits and error types
//!
//! This module defines the trait interface for checkpoint backends and
//! associated error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error on {path}: {source}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl StorageError {
    /// Wraps an IO error with the file it happened on
    pub fn file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::File {
            path: path.into(),
            source,
        }
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// The three URL sets of a crawl as they are written to disk
///
/// Entries carry no ordering guarantee on read; on write each list is sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersistedState {
    pub frontier: Vec<String>,
    pub visited: Vec<String>,
    pub errors: Vec<String>,
}

impl PersistedState {
    /// Returns true when no set holds any URL
    pub fn is_empty(&self) -> bool {
        self.frontier.is_empty() && self.visited.is_empty() && self.errors.is_empty()
    }
}

/// Trait for checkpoint backends
///
/// A backend persists crawl state between runs and writes the final
/// list of visited URLs.
pub trait StateStore: Send + Sync {
    /// Loads the persisted crawl state
    ///
    /// Missing files load as empty sets. A store that has never been written
    /// returns an empty `PersistedState`.
    fn load(&self) -> StorageResult<PersistedState>;

    /// Persists all three sets
    ///
    /// Each file is replaced as a whole, so a crash mid-save leaves either the
    /// previous or the new content.
    fn save(&self, state: &PersistedState) -> StorageResult<()>;

    /// Writes the visited URLs, one per line, to the output list
    fn write_output_list(&self, visited: &[String]) -> StorageResult<()>;
}
