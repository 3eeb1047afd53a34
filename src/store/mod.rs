//! History store
//!
//! Append-only, commit-keyed, per-branch benchmark history on the local
//! filesystem. `append` is the only mutator: it takes the branch lock, reads
//! the current document, appends, and atomically replaces the file. Loads
//! never take the lock; the rename in [`lock::write_atomic`] guarantees they
//! see a complete document.

pub mod codec;
mod lock;

pub use codec::HistoryFormat;

use std::io;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::constants::defaults::{LOCK_TIMEOUT_MS, SUITE};
use crate::constants::format::DATA_JS_FILE;
use crate::model::{BenchmarkRun, HistoryDocument, HistorySeries, MetricKey, SeriesPoint};
use crate::normalize::validate_results;

/// Errors that can occur when reading or writing history
#[derive(Error, Debug)]
pub enum StoreError {
    /// The persisted series is unreadable; it is never repaired or truncated
    #[error("history for branch '{branch}' at {} is corrupt: {reason}", path.display())]
    CorruptHistory {
        branch: String,
        path: PathBuf,
        reason: String,
    },

    /// Replacing the file failed; the previous content is still in place
    #[error("failed to write history for branch '{branch}' to {}: {source}", path.display())]
    Write {
        branch: String,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("timed out waiting for the history lock of branch '{branch}' ({})", path.display())]
    LockTimeout { branch: String, path: PathBuf },

    #[error("invalid branch name '{0}'")]
    InvalidBranch(String),

    #[error("refusing to append to branch '{branch}': {reason}")]
    InvalidRun { branch: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl StoreError {
    /// Whether the caller may retry the same append unchanged
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::Write { .. } | StoreError::LockTimeout { .. })
    }
}

/// Result of an append
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
    /// The run was recorded; `len` is the new series length
    Appended { len: usize },
    /// An identical run was already recorded (retried delivery)
    Duplicate { len: usize },
}

impl AppendOutcome {
    pub fn is_appended(&self) -> bool {
        matches!(self, AppendOutcome::Appended { .. })
    }

    pub fn len(&self) -> usize {
        match self {
            AppendOutcome::Appended { len } | AppendOutcome::Duplicate { len } => *len,
        }
    }
}

/// Where branch histories live
#[derive(Debug, Clone, PartialEq, Eq)]
enum Layout {
    /// `<root>/<branch>/data.js`
    PerBranch { root: PathBuf },
    /// One explicit file, whatever the branch
    Single { path: PathBuf },
}

/// Handle to the persisted histories
///
/// Passed explicitly to whoever needs history; holds no open files between
/// calls.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    layout: Layout,
    suite: String,
    repo_url: String,
    lock_timeout: Duration,
}

impl HistoryStore {
    /// One `data.js` per branch under `root`
    pub fn per_branch(root: impl Into<PathBuf>) -> Self {
        Self::with_layout(Layout::PerBranch { root: root.into() })
    }

    /// A single history file (the CLI's `--history <path>`)
    pub fn single(path: impl Into<PathBuf>) -> Self {
        Self::with_layout(Layout::Single { path: path.into() })
    }

    fn with_layout(layout: Layout) -> Self {
        Self {
            layout,
            suite: SUITE.to_string(),
            repo_url: String::new(),
            lock_timeout: Duration::from_millis(LOCK_TIMEOUT_MS),
        }
    }

    /// Name of the `entries` key runs are appended under
    pub fn with_suite(mut self, suite: impl Into<String>) -> Self {
        self.suite = suite.into();
        self
    }

    /// Repository URL recorded when a history file is first created
    pub fn with_repo_url(mut self, repo_url: impl Into<String>) -> Self {
        self.repo_url = repo_url.into();
        self
    }

    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    pub fn suite(&self) -> &str {
        &self.suite
    }

    /// History file of `branch`
    pub fn path_for(&self, branch: &str) -> Result<PathBuf, StoreError> {
        validate_branch(branch)?;
        Ok(match &self.layout {
            Layout::PerBranch { root } => root.join(branch).join(DATA_JS_FILE),
            Layout::Single { path } => path.clone(),
        })
    }

    /// Read the whole series of `branch`
    ///
    /// A missing file is an empty series. An unreadable one fails as a whole
    /// with [`StoreError::CorruptHistory`]; nothing is partially returned.
    pub fn load(&self, branch: &str) -> Result<HistorySeries, StoreError> {
        let path = self.path_for(branch)?;
        let document = read_document(branch, &path)?;
        Ok(HistorySeries::new(branch, &self.suite, document))
    }

    /// Last `n` observations of a metric on `branch`, most recent last
    pub fn last_n(
        &self,
        branch: &str,
        key: &MetricKey,
        n: usize,
    ) -> Result<Vec<SeriesPoint>, StoreError> {
        Ok(self.load(branch)?.last_n(key, n))
    }

    /// Append `run` to the series of `branch`
    ///
    /// Serialized per branch through a lock file. A retried delivery of a run
    /// that is already recorded is a no-op. If the write fails the previous
    /// file is left in place.
    pub fn append(&self, branch: &str, run: BenchmarkRun) -> Result<AppendOutcome, StoreError> {
        let path = self.path_for(branch)?;
        validate_run(branch, &run)?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let lock_path = lock::lock_path_for(&path);
        let Some(_lock) = lock::acquire(&lock_path, self.lock_timeout)? else {
            return Err(StoreError::LockTimeout {
                branch: branch.to_string(),
                path: lock_path,
            });
        };

        let mut series = HistorySeries::new(branch, &self.suite, read_document(branch, &path)?);

        if series.contains_retry_of(&run) {
            info!(
                branch,
                commit = %run.commit.id,
                date = run.date,
                "identical run already recorded; skipping append"
            );
            return Ok(AppendOutcome::Duplicate { len: series.len() });
        }

        if run.date < series.last_update() {
            warn!(
                branch,
                date = run.date,
                last_update = series.last_update(),
                "appending a run older than the last update"
            );
        }

        let commit_id = run.commit.id.clone();
        series.set_repo_url_if_empty(&self.repo_url);
        series.push(run);

        let write_error = |source: io::Error| StoreError::Write {
            branch: branch.to_string(),
            path: path.clone(),
            source,
        };
        let bytes = codec::encode(series.document(), HistoryFormat::for_path(&path))
            .map_err(|e| write_error(io::Error::new(io::ErrorKind::InvalidData, e)))?;
        lock::write_atomic(&path, &bytes).map_err(write_error)?;

        info!(
            branch,
            commit = %commit_id,
            len = series.len(),
            path = %path.display(),
            "run appended"
        );
        Ok(AppendOutcome::Appended { len: series.len() })
    }
}

fn read_document(branch: &str, path: &Path) -> Result<HistoryDocument, StoreError> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!(branch, path = %path.display(), "no history yet");
            return Ok(HistoryDocument::default());
        }
        Err(e) => return Err(StoreError::Io(e)),
    };

    let corrupt = |reason: String| StoreError::CorruptHistory {
        branch: branch.to_string(),
        path: path.to_path_buf(),
        reason,
    };

    let text = String::from_utf8(bytes).map_err(|e| corrupt(format!("not UTF-8: {e}")))?;
    codec::decode(&text, HistoryFormat::for_path(path)).map_err(corrupt)
}

/// Branch names become path segments; reject anything that could escape the root
fn validate_branch(branch: &str) -> Result<(), StoreError> {
    let invalid = || StoreError::InvalidBranch(branch.to_string());

    if branch.trim().is_empty() || branch.contains('\\') || branch.contains('\0') {
        return Err(invalid());
    }
    for component in Path::new(branch).components() {
        if !matches!(component, Component::Normal(_)) {
            return Err(invalid());
        }
    }
    Ok(())
}

fn validate_run(branch: &str, run: &BenchmarkRun) -> Result<(), StoreError> {
    let reason = if run.commit.id.trim().is_empty() {
        Some("commit id is empty".to_string())
    } else if run.commit.parsed_timestamp().is_none() {
        Some(format!(
            "commit timestamp '{}' is not a valid point in time",
            run.commit.timestamp
        ))
    } else if run.tool.trim().is_empty() {
        Some("tool is empty".to_string())
    } else {
        None
    };

    if let Some(reason) = reason {
        return Err(StoreError::InvalidRun {
            branch: branch.to_string(),
            reason,
        });
    }

    // A non-finite value would serialize as `null` and poison every later load
    validate_results(&run.tool, &run.benches).map_err(|e| StoreError::InvalidRun {
        branch: branch.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_branch_accepts_nested_names() {
        assert!(validate_branch("main").is_ok());
        assert!(validate_branch("feature/csv-reader").is_ok());
    }

    #[test]
    fn test_validate_branch_rejects_escapes() {
        for bad in ["", "  ", "..", "../main", "/etc", "a/../../b", "a\\b"] {
            assert!(
                matches!(validate_branch(bad), Err(StoreError::InvalidBranch(_))),
                "accepted {bad:?}"
            );
        }
    }

    #[test]
    fn test_per_branch_path() {
        let store = HistoryStore::per_branch("/srv/bench");
        assert_eq!(
            store.path_for("beta").unwrap(),
            PathBuf::from("/srv/bench/beta/data.js")
        );
    }

    #[test]
    fn test_single_path_ignores_branch() {
        let store = HistoryStore::single("out/data.json");
        assert_eq!(store.path_for("main").unwrap(), PathBuf::from("out/data.json"));
        assert_eq!(store.path_for("test").unwrap(), PathBuf::from("out/data.json"));
    }

    #[test]
    fn test_retryable_errors() {
        let timeout = StoreError::LockTimeout {
            branch: "main".to_string(),
            path: PathBuf::from("x.lock"),
        };
        assert!(timeout.is_retryable());
        assert!(!StoreError::InvalidBranch("..".to_string()).is_retryable());
    }

    #[test]
    fn test_append_outcome_len() {
        assert_eq!(AppendOutcome::Appended { len: 3 }.len(), 3);
        assert!(!AppendOutcome::Duplicate { len: 3 }.is_appended());
    }
}
