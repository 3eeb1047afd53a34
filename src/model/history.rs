//! History document and per-branch series
//!
//! [`HistoryDocument`] mirrors the persisted file one-to-one. [`HistorySeries`]
//! is the branch-scoped view the store hands out: it owns the document and
//! exposes the runs of one suite in append order.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{BenchmarkRun, Commit, MetricKey, Uncertainty};

/// Persisted history of one branch
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryDocument {
    /// Ingestion date (epoch ms) of the most recent append
    pub last_update: i64,

    pub repo_url: String,

    /// Runs per benchmark suite, in insertion order
    pub entries: BTreeMap<String, Vec<BenchmarkRun>>,
}

impl HistoryDocument {
    pub fn new(repo_url: impl Into<String>) -> Self {
        Self {
            last_update: 0,
            repo_url: repo_url.into(),
            entries: BTreeMap::new(),
        }
    }

    /// Total number of runs across all suites
    pub fn run_count(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }
}

/// One point of a metric's history
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesPoint {
    pub commit: Commit,
    pub date: i64,
    pub value: f64,
    pub uncertainty: Uncertainty,
    pub unit: String,
}

/// Append-ordered runs of one branch and suite
#[derive(Debug, Clone, PartialEq)]
pub struct HistorySeries {
    branch: String,
    suite: String,
    document: HistoryDocument,
}

impl HistorySeries {
    pub fn new(
        branch: impl Into<String>,
        suite: impl Into<String>,
        document: HistoryDocument,
    ) -> Self {
        Self {
            branch: branch.into(),
            suite: suite.into(),
            document,
        }
    }

    pub fn branch(&self) -> &str {
        &self.branch
    }

    pub fn suite(&self) -> &str {
        &self.suite
    }

    pub fn document(&self) -> &HistoryDocument {
        &self.document
    }

    pub fn into_document(self) -> HistoryDocument {
        self.document
    }

    pub fn last_update(&self) -> i64 {
        self.document.last_update
    }

    /// Runs in append order (not sorted by date)
    pub fn runs(&self) -> &[BenchmarkRun] {
        self.document
            .entries
            .get(&self.suite)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.runs().len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs().is_empty()
    }

    pub fn latest(&self) -> Option<&BenchmarkRun> {
        self.runs().last()
    }

    /// Whether a run identical to `run` is already recorded
    pub fn contains_retry_of(&self, run: &BenchmarkRun) -> bool {
        self.runs().iter().any(|existing| run.is_retry_of(existing))
    }

    /// Last `n` observations of a metric, most recent last
    pub fn last_n(&self, key: &MetricKey, n: usize) -> Vec<SeriesPoint> {
        let mut points: Vec<SeriesPoint> = self
            .runs()
            .iter()
            .rev()
            .filter_map(|run| {
                run.result(key).map(|result| SeriesPoint {
                    commit: run.commit.clone(),
                    date: run.date,
                    value: result.value,
                    uncertainty: result.uncertainty(),
                    unit: result.unit.clone(),
                })
            })
            .take(n)
            .collect();
        points.reverse();
        points
    }

    /// Record a run at the end of the series
    ///
    /// The only mutator; runs are never removed or rewritten.
    pub(crate) fn push(&mut self, run: BenchmarkRun) {
        self.document.last_update = run.date;
        self.document
            .entries
            .entry(self.suite.clone())
            .or_default()
            .push(run);
    }

    pub(crate) fn set_repo_url_if_empty(&mut self, repo_url: &str) {
        if self.document.repo_url.is_empty() {
            self.document.repo_url = repo_url.to_string();
        }
    }
}
