//! Benchmark run data model

use serde::{Deserialize, Serialize};

use super::{BenchmarkResult, Commit, MetricKey};

/// One ingestion event: a commit and the measurements taken for it
///
/// Runs are created once by the normalizer and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkRun {
    pub commit: Commit,

    /// Ingestion time (epoch milliseconds), distinct from the commit timestamp
    pub date: i64,

    /// Harness that produced the numbers (see [`crate::constants::tools`])
    pub tool: String,

    pub benches: Vec<BenchmarkResult>,
}

impl BenchmarkRun {
    /// Find a result by canonical name
    pub fn result(&self, key: &MetricKey) -> Option<&BenchmarkResult> {
        self.benches.iter().find(|b| &b.key() == key)
    }

    /// Whether this run is a retried delivery of `other`
    ///
    /// Same commit, tool and ingestion date with identical content. A re-run of
    /// the same commit under a different date is a distinct event.
    pub fn is_retry_of(&self, other: &BenchmarkRun) -> bool {
        self.commit.id == other.commit.id
            && self.tool == other.tool
            && self.date == other.date
            && self == other
    }
}
