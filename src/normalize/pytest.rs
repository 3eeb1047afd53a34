//! pytest-benchmark JSON parser (`pytest --benchmark-json=<file>`)

use serde::Deserialize;

use super::{NormalizationError, json_error};
use crate::constants::tools;
use crate::model::BenchmarkResult;

#[derive(Debug, Deserialize)]
struct PytestReport {
    benchmarks: Vec<PytestBenchResult>,
}

/// One entry of the `benchmarks` array
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PytestBenchResult {
    pub name: String,

    /// Fully qualified test id (`tests/test_io.py::test_read_csv`), preferred
    /// over `name` when present
    #[serde(default)]
    pub fullname: Option<String>,

    pub stats: PytestStats,
}

/// Timing statistics, in seconds
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PytestStats {
    pub mean: f64,

    pub stddev: f64,

    #[serde(default)]
    pub rounds: u64,
}

impl From<PytestBenchResult> for BenchmarkResult {
    fn from(r: PytestBenchResult) -> Self {
        let name = r.fullname.unwrap_or(r.name);
        BenchmarkResult::new(name, r.stats.mean, "sec")
            .with_margin(r.stats.stddev)
            .with_extra(format!("rounds: {}", r.stats.rounds))
    }
}

/// Parse a pytest-benchmark JSON report
pub fn parse_pytest_output(output: &str) -> Result<Vec<PytestBenchResult>, NormalizationError> {
    let report: PytestReport =
        serde_json::from_str(output).map_err(|e| json_error(tools::PYTEST, &e))?;
    Ok(report.benchmarks)
}
