//! Checkpointing of crawl state
//!
//! State is written in batches while the crawl runs and once more on every
//! exit path. The final write also produces the output list.

use crate::state::CrawlState;
use crate::storage::{StateStore, StorageResult};
use std::sync::Arc;

/// Decides when to persist crawl state and writes it
pub struct CheckpointManager {
    store: Arc<dyn StateStore>,
    interval: usize,

    /// `visited / interval` at the last batch write
    last_batch: usize,
}

impl CheckpointManager {
    /// Creates a manager that writes a batch checkpoint whenever the visited
    /// count crosses a multiple of `interval`
    ///
    /// `visited` is the count the crawl starts from, so a resumed crawl does not
    /// rewrite state it just loaded.
    pub fn new(store: Arc<dyn StateStore>, interval: usize, visited: usize) -> Self {
        let interval = interval.max(1);
        Self {
            store,
            interval,
            last_batch: visited / interval,
        }
    }

    pub fn interval(&self) -> usize {
        self.interval
    }

    /// Writes a checkpoint if a batch boundary was crossed
    ///
    /// # Returns
    ///
    /// `true` if state was written
    pub fn maybe_checkpoint(&mut self, state: &CrawlState) -> StorageResult<bool> {
        let batch = state.visited_len() / self.interval;
        if batch <= self.last_batch {
            return Ok(false);
        }

        self.checkpoint(state)?;
        self.last_batch = batch;
        Ok(true)
    }

    /// Writes the three state files
    pub fn checkpoint(&self, state: &CrawlState) -> StorageResult<()> {
        let snapshot = state.snapshot();
        self.store.save(&snapshot)?;
        tracing::debug!(
            "Checkpoint written: {} pending, {} visited, {} errors",
            snapshot.frontier.len(),
            snapshot.visited.len(),
            snapshot.errors.len()
        );
        Ok(())
    }

    /// Writes the state files and the output list
    pub fn finalize(&self, state: &CrawlState) -> StorageResult<()> {
        self.checkpoint(state)?;
        let visited: Vec<String> = state.visited().map(str::to_string).collect();
        self.store.write_output_list(&visited)
    }
}
