//! Regression detector
//!
//! Compares a run against the last prior observation of each metric on the
//! same branch. Detection never fails as a whole: problems with one metric
//! become notes on the [`Evaluation`] and the remaining metrics are still
//! evaluated.

mod direction;

pub use direction::{DirectionRule, DirectionRules};

use std::fmt;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::constants::defaults::{CONFIDENCE_MULTIPLIER, THRESHOLD};
use crate::model::{BenchmarkResult, BenchmarkRun, Direction, HistorySeries};

/// Per-metric detection problem
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DetectionError {
    #[error("direction of '{name}' is ambiguous: rules {} disagree", patterns.join(", "))]
    AmbiguousDirection { name: String, patterns: Vec<String> },

    /// A unit change is a data integrity problem, not a regression
    #[error("unit of '{name}' changed from '{baseline}' to '{current}'")]
    UnitMismatch {
        name: String,
        baseline: String,
        current: String,
    },

    #[error("'{name}' has unusable value {value}")]
    InvalidValue { name: String, value: f64 },
}

/// How seriously a finding should be taken
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Hard,
    /// The uncertainty intervals overlap; likely noise
    Informational,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Hard => write!(f, "hard"),
            Severity::Informational => write!(f, "informational"),
        }
    }
}

/// A metric that worsened beyond the threshold
#[derive(Debug, Clone, PartialEq)]
pub struct RegressionFinding {
    /// Name as reported in the evaluated run
    pub name: String,
    pub baseline_commit: String,
    pub baseline: f64,
    pub current: f64,
    pub unit: String,
    pub direction: Direction,
    /// How many times worse than the baseline; `None` when the denominator is zero
    pub ratio: Option<f64>,
    pub threshold: f64,
    pub severity: Severity,
}

impl RegressionFinding {
    pub fn is_hard(&self) -> bool {
        self.severity == Severity::Hard
    }
}

/// Non-finding outcome for one metric
#[derive(Debug, Clone, PartialEq)]
pub enum Note {
    /// First observation of a name on this branch; nothing to compare against
    NewMetricObserved(String),
    DetectionFailed(DetectionError),
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Note::NewMetricObserved(name) => write!(f, "new metric observed: {name}"),
            Note::DetectionFailed(err) => write!(f, "detection failed: {err}"),
        }
    }
}

/// Result of evaluating one run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Evaluation {
    pub findings: Vec<RegressionFinding>,
    pub notes: Vec<Note>,
}

impl Evaluation {
    pub fn has_hard_regression(&self) -> bool {
        self.findings.iter().any(RegressionFinding::is_hard)
    }

    pub fn hard_findings(&self) -> impl Iterator<Item = &RegressionFinding> {
        self.findings.iter().filter(|f| f.is_hard())
    }

    pub fn new_metrics(&self) -> impl Iterator<Item = &str> {
        self.notes.iter().filter_map(|note| match note {
            Note::NewMetricObserved(name) => Some(name.as_str()),
            Note::DetectionFailed(_) => None,
        })
    }
}

/// Detector settings
#[derive(Debug, Clone)]
pub struct DetectorConfig {
    /// Relative worsening that counts as a regression (0.5 = 50%)
    pub threshold: f64,
    /// Multiplier applied to each range before testing overlap
    pub confidence_multiplier: f64,
    pub directions: DirectionRules,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            threshold: THRESHOLD,
            confidence_multiplier: CONFIDENCE_MULTIPLIER,
            directions: DirectionRules::default(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Detector {
    config: DetectorConfig,
}

impl Detector {
    pub fn new(config: DetectorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Evaluate `run` against the history of its branch
    ///
    /// The baseline of each metric is its value in the most recent earlier
    /// run that has it. If `run` is already part of `series` (the usual case,
    /// since runs are appended before evaluation) only the entries before it
    /// are considered.
    pub fn evaluate(&self, series: &HistorySeries, run: &BenchmarkRun) -> Evaluation {
        let runs = series.runs();
        let prior = match runs.iter().rposition(|existing| existing == run) {
            Some(position) => &runs[..position],
            None => runs,
        };

        let mut evaluation = Evaluation::default();
        for bench in &run.benches {
            match self.evaluate_bench(prior, bench) {
                Ok(Some(finding)) => {
                    info!(
                        branch = series.branch(),
                        name = %finding.name,
                        baseline = finding.baseline,
                        current = finding.current,
                        severity = %finding.severity,
                        "regression detected"
                    );
                    evaluation.findings.push(finding);
                }
                Ok(None) => {}
                Err(note) => {
                    match &note {
                        Note::NewMetricObserved(name) => {
                            debug!(branch = series.branch(), name = %name, "no baseline yet")
                        }
                        Note::DetectionFailed(err) => {
                            warn!(branch = series.branch(), "{err}")
                        }
                    }
                    evaluation.notes.push(note);
                }
            }
        }
        evaluation
    }

    fn evaluate_bench(
        &self,
        prior: &[BenchmarkRun],
        bench: &BenchmarkResult,
    ) -> Result<Option<RegressionFinding>, Note> {
        let key = bench.key();
        let failed = |err| Note::DetectionFailed(err);

        if !bench.value.is_finite() || bench.value < 0.0 {
            return Err(failed(DetectionError::InvalidValue {
                name: bench.name.clone(),
                value: bench.value,
            }));
        }

        let Some((base_run, base)) = prior
            .iter()
            .rev()
            .find_map(|run| run.result(&key).map(|result| (run, result)))
        else {
            return Err(Note::NewMetricObserved(bench.name.clone()));
        };
        debug!(
            name = %key,
            baseline_commit = %base_run.commit.id,
            baseline = base.value,
            "baseline selected"
        );

        let direction = self.config.directions.resolve(&key).map_err(failed)?;

        if base.unit != bench.unit {
            return Err(failed(DetectionError::UnitMismatch {
                name: bench.name.clone(),
                baseline: base.unit.clone(),
                current: bench.unit.clone(),
            }));
        }
        if !base.value.is_finite() || base.value < 0.0 {
            return Err(failed(DetectionError::InvalidValue {
                name: base.name.clone(),
                value: base.value,
            }));
        }

        let threshold = self.config.threshold;
        let (regressed, ratio) = match direction {
            Direction::SmallerIsBetter => (
                bench.value > base.value * (1.0 + threshold),
                ratio(bench.value, base.value),
            ),
            Direction::BiggerIsBetter => (
                bench.value * (1.0 + threshold) < base.value,
                ratio(base.value, bench.value),
            ),
        };
        if !regressed {
            return Ok(None);
        }

        Ok(Some(RegressionFinding {
            name: bench.name.clone(),
            baseline_commit: base_run.commit.id.clone(),
            baseline: base.value,
            current: bench.value,
            unit: bench.unit.clone(),
            direction,
            ratio,
            threshold,
            severity: self.severity(base, bench),
        }))
    }

    /// Hard unless both sides carry a range and the widened intervals overlap
    fn severity(&self, base: &BenchmarkResult, current: &BenchmarkResult) -> Severity {
        let (base_u, current_u) = (base.uncertainty(), current.uncertainty());
        if !(base_u.bounded && current_u.bounded) {
            return Severity::Hard;
        }

        let k = self.config.confidence_multiplier;
        let (base_lo, base_hi) = base_u.interval(base.value, k);
        let (cur_lo, cur_hi) = current_u.interval(current.value, k);
        if base_lo <= cur_hi && cur_lo <= base_hi {
            Severity::Informational
        } else {
            Severity::Hard
        }
    }
}

fn ratio(numerator: f64, denominator: f64) -> Option<f64> {
    (denominator > 0.0).then(|| numerator / denominator)
}
