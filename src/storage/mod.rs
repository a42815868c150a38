//! Storage module for persisting crawl state
//!
//! This module handles the checkpoint files that make a crawl resumable:
//! - the pending frontier, the visited set and the error set
//! - atomic replacement of each file on save
//! - the final output list of visited URLs

mod files;
mod traits;

pub use files::{
    load_url_set, save_url_set, FileStateStore, ALREADY_DOWNLOADED_FILE, ERRORS_FILE,
    TO_DOWNLOAD_FILE,
};
pub use traits::{PersistedState, StateStore, StorageError, StorageResult};
