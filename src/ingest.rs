//! Ingestion pipeline
//!
//! raw tool output → normalize → append → load → evaluate → notify.
//!
//! Normalization and store failures abort the ingestion and name the branch
//! and tool. Regression findings never do: the run is always appended before
//! it is evaluated, and notifier failures are only logged.

use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::ConfigError;
use crate::detect::{Detector, Evaluation};
use crate::model::{BenchmarkRun, Commit};
use crate::normalize::{NormalizationError, Normalizer, Tool};
use crate::publish::Notifier;
use crate::store::{AppendOutcome, HistoryStore, StoreError};

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("failed to read {tool} output for branch '{branch}' from {}: {source}", path.display())]
    ReadInput {
        branch: String,
        tool: Tool,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to normalize {tool} output for branch '{branch}': {source}")]
    Normalize {
        branch: String,
        tool: Tool,
        #[source]
        source: NormalizationError,
    },

    #[error("failed to store {tool} run for branch '{branch}': {source}")]
    Store {
        branch: String,
        tool: Tool,
        #[source]
        source: StoreError,
    },

    #[error("cannot determine the benchmarked commit: {0}")]
    Commit(String),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl IngestError {
    /// Whether re-running the same ingestion may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            IngestError::Store { source, .. } => source.is_retryable(),
            _ => false,
        }
    }
}

/// How the process should exit after a successful ingestion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    Success,
    /// A hard regression was found and alerting is enabled
    Regression,
}

impl ExitStatus {
    pub fn code(&self) -> i32 {
        match self {
            ExitStatus::Success => 0,
            ExitStatus::Regression => 1,
        }
    }
}

#[derive(Debug, Clone)]
pub struct IngestReport {
    pub run: BenchmarkRun,
    pub outcome: AppendOutcome,
    pub evaluation: Evaluation,
    pub exit: ExitStatus,
}

impl IngestReport {
    pub fn appended(&self) -> bool {
        self.outcome.is_appended()
    }
}

/// One configured ingestion target
pub struct Ingest {
    store: HistoryStore,
    normalizer: Normalizer,
    detector: Detector,
    alert_on_regression: bool,
    notifiers: Vec<Box<dyn Notifier>>,
}

impl Ingest {
    pub fn new(store: HistoryStore, tool: Tool, detector: Detector) -> Self {
        Self {
            store,
            normalizer: Normalizer::new(tool),
            detector,
            alert_on_regression: false,
            notifiers: Vec::new(),
        }
    }

    pub fn alert_on_regression(mut self, enabled: bool) -> Self {
        self.alert_on_regression = enabled;
        self
    }

    pub fn with_notifier(mut self, notifier: Box<dyn Notifier>) -> Self {
        self.notifiers.push(notifier);
        self
    }

    pub fn tool(&self) -> Tool {
        self.normalizer.tool()
    }

    /// Ingest the output file at `input`
    pub fn run_file(
        &mut self,
        branch: &str,
        input: &Path,
        commit: Commit,
        date: i64,
    ) -> Result<IngestReport, IngestError> {
        let raw = std::fs::read_to_string(input).map_err(|source| IngestError::ReadInput {
            branch: branch.to_string(),
            tool: self.tool(),
            path: input.to_path_buf(),
            source,
        })?;
        self.run(branch, &raw, commit, date)
    }

    /// Ingest raw tool output for `commit`, recorded at `date` (epoch ms)
    pub fn run(
        &mut self,
        branch: &str,
        raw: &str,
        commit: Commit,
        date: i64,
    ) -> Result<IngestReport, IngestError> {
        let tool = self.tool();
        let store_error = |source| IngestError::Store {
            branch: branch.to_string(),
            tool,
            source,
        };

        let run = self
            .normalizer
            .normalize(raw, commit, date)
            .map_err(|source| IngestError::Normalize {
                branch: branch.to_string(),
                tool,
                source,
            })?;
        info!(
            branch,
            %tool,
            commit = %run.commit.id,
            benches = run.benches.len(),
            "benchmark output normalized"
        );

        let outcome = self.store.append(branch, run.clone()).map_err(store_error)?;
        let series = self.store.load(branch).map_err(store_error)?;
        let evaluation = self.detector.evaluate(&series, &run);

        for notifier in &mut self.notifiers {
            if let Err(err) = notifier.notify(branch, &evaluation.findings) {
                warn!(branch, error = %err, "failed to deliver regression alert");
            }
        }

        let exit = if self.alert_on_regression && evaluation.has_hard_regression() {
            ExitStatus::Regression
        } else {
            ExitStatus::Success
        };
        info!(
            branch,
            findings = evaluation.findings.len(),
            notes = evaluation.notes.len(),
            exit = exit.code(),
            "ingestion finished"
        );

        Ok(IngestReport {
            run,
            outcome,
            evaluation,
            exit,
        })
    }
}

/// Read a commit from a JSON file
///
/// Accepts either a commit object in the persisted shape or a GitHub event
/// payload, in which case its `head_commit` is used.
pub fn load_commit(path: &Path) -> Result<Commit, IngestError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| IngestError::Commit(format!("failed to read {}: {e}", path.display())))?;
    let value: Value = serde_json::from_str(&text)
        .map_err(|e| IngestError::Commit(format!("{} is not valid JSON: {e}", path.display())))?;

    let commit = match value.get("head_commit") {
        Some(Value::Null) => {
            return Err(IngestError::Commit(format!(
                "event payload {} has no head commit",
                path.display()
            )));
        }
        Some(head) => head.clone(),
        None => value,
    };

    serde_json::from_value(commit)
        .map_err(|e| IngestError::Commit(format!("malformed commit in {}: {e}", path.display())))
}

/// Commit from the `--commit` file
///
/// The flag falls back to `GITHUB_EVENT_PATH`, so inside a workflow `path` is
/// the event payload.
pub fn resolve_commit(path: Option<&Path>) -> Result<Commit, IngestError> {
    match path {
        Some(path) => load_commit(path),
        None => Err(IngestError::Commit(
            "pass --commit or run inside a GitHub workflow (GITHUB_EVENT_PATH)".to_string(),
        )),
    }
}

/// `https://github.com` + `acme/reader` → `https://github.com/acme/reader`
pub fn repo_url_from_parts(server_url: Option<&str>, repository: Option<&str>) -> Option<String> {
    let repository = repository.filter(|r| !r.is_empty())?;
    let server_url = server_url
        .filter(|s| !s.is_empty())
        .unwrap_or("https://github.com");
    Some(format!("{}/{}", server_url.trim_end_matches('/'), repository))
}

/// Ingestion timestamp
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
