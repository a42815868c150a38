//! Plain-text checkpoint files
//!
//! Each URL set lives in its own UTF-8 file with one URL per line. The file
//! names are fixed so that a crawl interrupted by one run can be resumed by
//! the next.

use crate::storage::{PersistedState, StateStore, StorageError, StorageResult};
use std::collections::BTreeSet;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Pending URLs
pub const TO_DOWNLOAD_FILE: &str = "toDownload.tmp";

/// Visited URLs
pub const ALREADY_DOWNLOADED_FILE: &str = "alreadyDownloaded.tmp";

/// URLs that failed live and archived retrieval
pub const ERRORS_FILE: &str = "errors.tmp";

/// File-backed state store
#[derive(Debug, Clone)]
pub struct FileStateStore {
    state_dir: PathBuf,
    output_list: PathBuf,
}

impl FileStateStore {
    /// Creates a store that keeps checkpoint files in `state_dir`
    pub fn new(state_dir: impl Into<PathBuf>, output_list: impl Into<PathBuf>) -> Self {
        Self {
            state_dir: state_dir.into(),
            output_list: output_list.into(),
        }
    }

    pub fn state_dir(&self) -> &Path {
        &self.state_dir
    }

    pub fn output_list(&self) -> &Path {
        &self.output_list
    }

    /// Path of one of the checkpoint files
    pub fn state_file(&self, name: &str) -> PathBuf {
        self.state_dir.join(name)
    }
}

impl StateStore for FileStateStore {
    fn load(&self) -> StorageResult<PersistedState> {
        Ok(PersistedState {
            frontier: load_url_set(&self.state_file(TO_DOWNLOAD_FILE))?
                .into_iter()
                .collect(),
            visited: load_url_set(&self.state_file(ALREADY_DOWNLOADED_FILE))?
                .into_iter()
                .collect(),
            errors: load_url_set(&self.state_file(ERRORS_FILE))?
                .into_iter()
                .collect(),
        })
    }

    fn save(&self, state: &PersistedState) -> StorageResult<()> {
        if !self.state_dir.as_os_str().is_empty() {
            fs::create_dir_all(&self.state_dir)
                .map_err(|e| StorageError::file(&self.state_dir, e))?;
        }

        save_url_set(&self.state_file(TO_DOWNLOAD_FILE), &state.frontier)?;
        save_url_set(&self.state_file(ALREADY_DOWNLOADED_FILE), &state.visited)?;
        save_url_set(&self.state_file(ERRORS_FILE), &state.errors)?;
        Ok(())
    }

    fn write_output_list(&self, visited: &[String]) -> StorageResult<()> {
        if let Some(parent) = self.output_list.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| StorageError::file(parent, e))?;
            }
        }
        write_lines(&self.output_list, visited.iter().map(String::as_str))
    }
}

/// Reads a URL set file
///
/// Lines are trimmed and blank lines dropped. A missing file is an empty set.
pub fn load_url_set(path: &Path) -> StorageResult<BTreeSet<String>> {
    let content = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeSet::new()),
        Err(e) => return Err(StorageError::file(path, e)),
    };

    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

/// Writes a URL set file, sorted, one URL per line
///
/// The content goes to a sibling `.part` file first and is then renamed over
/// the target.
pub fn save_url_set(path: &Path, urls: &[String]) -> StorageResult<()> {
    let sorted: BTreeSet<&str> = urls.iter().map(String::as_str).collect();
    write_lines(path, sorted.into_iter())
}

fn write_lines<'a>(path: &Path, lines: impl Iterator<Item = &'a str>) -> StorageResult<()> {
    let mut part = path.as_os_str().to_owned();
    part.push(".part");
    let part = PathBuf::from(part);

    let file = fs::File::create(&part).map_err(|e| StorageError::file(&part, e))?;
    let mut writer = BufWriter::new(file);
    for line in lines {
        writeln!(writer, "{}", line).map_err(|e| StorageError::file(&part, e))?;
    }
    writer
        .into_inner()
        .map_err(|e| StorageError::file(&part, e.into_error()))?
        .sync_all()
        .map_err(|e| StorageError::file(&part, e))?;

    fs::rename(&part, path).map_err(|e| StorageError::file(path, e))?;
    Ok(())
}
