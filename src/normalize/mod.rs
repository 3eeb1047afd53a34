//! Benchmark output normalizer
//!
//! Parses raw, tool-specific benchmark output into a [`BenchmarkRun`].
//! Each tool first parses into its own typed record; the records are then
//! unified into [`BenchmarkResult`] and validated as a run. Pure transform:
//! nothing here touches the history store.

mod cargo;
mod custom;
mod go;
mod pytest;

pub use cargo::{CargoBenchResult, parse_cargo_output};
pub use custom::{CustomBenchResult, CustomRange, parse_custom_output};
pub use go::{GoBenchResult, parse_go_output};
pub use pytest::{PytestBenchResult, PytestStats, parse_pytest_output};


use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::constants::tools;
use crate::model::{BenchmarkResult, BenchmarkRun, Commit, Direction, MetricKey};

/// Raw tool output could not be turned into a run
///
/// Names the tool and the malformed section (a line number, a JSON position
/// or a result index) so the CI log points at the offending input.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{tool}: malformed {section}: {reason}")]
pub struct NormalizationError {
    pub tool: String,
    pub section: String,
    pub reason: String,
}

impl NormalizationError {
    pub fn new(
        tool: impl Into<String>,
        section: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            tool: tool.into(),
            section: section.into(),
            reason: reason.into(),
        }
    }
}

/// Supported benchmark harnesses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tool {
    Cargo,
    Go,
    Pytest,
    CustomSmallerIsBetter,
    CustomBiggerIsBetter,
}

impl Tool {
    pub const ALL: [Tool; 5] = [
        Tool::Cargo,
        Tool::Go,
        Tool::Pytest,
        Tool::CustomSmallerIsBetter,
        Tool::CustomBiggerIsBetter,
    ];

    /// Identifier written into the `tool` field of a run
    pub fn id(&self) -> &'static str {
        match self {
            Tool::Cargo => tools::CARGO,
            Tool::Go => tools::GO,
            Tool::Pytest => tools::PYTEST,
            Tool::CustomSmallerIsBetter => tools::CUSTOM_SMALLER_IS_BETTER,
            Tool::CustomBiggerIsBetter => tools::CUSTOM_BIGGER_IS_BETTER,
        }
    }

    /// Direction assumed for this tool's metrics when nothing more specific
    /// is configured
    pub fn default_direction(&self) -> Direction {
        match self {
            Tool::CustomBiggerIsBetter => Direction::BiggerIsBetter,
            _ => Direction::SmallerIsBetter,
        }
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Tool {
    type Err = NormalizationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Tool::ALL
            .into_iter()
            .find(|tool| tool.id() == s)
            .ok_or_else(|| {
                let known: Vec<&str> = Tool::ALL.iter().map(Tool::id).collect();
                NormalizationError::new(
                    s,
                    "tool",
                    format!("unsupported tool (expected one of: {})", known.join(", ")),
                )
            })
    }
}

/// A parsed record, tagged by the tool that produced it
#[derive(Debug, Clone, PartialEq)]
pub enum ToolResult {
    Cargo(CargoBenchResult),
    Go(GoBenchResult),
    Pytest(PytestBenchResult),
    Custom(CustomBenchResult),
}

impl From<ToolResult> for BenchmarkResult {
    fn from(result: ToolResult) -> Self {
        match result {
            ToolResult::Cargo(r) => r.into(),
            ToolResult::Go(r) => r.into(),
            ToolResult::Pytest(r) => r.into(),
            ToolResult::Custom(r) => r.into(),
        }
    }
}

/// Turns one tool's raw output into runs
#[derive(Debug, Clone, Copy)]
pub struct Normalizer {
    tool: Tool,
}

impl Normalizer {
    pub fn new(tool: Tool) -> Self {
        Self { tool }
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    /// Parse raw output into tool-specific records
    pub fn parse(&self, raw: &str) -> Result<Vec<ToolResult>, NormalizationError> {
        let records = match self.tool {
            Tool::Cargo => parse_cargo_output(raw)?
                .into_iter()
                .map(ToolResult::Cargo)
                .collect(),
            Tool::Go => parse_go_output(raw)?
                .into_iter()
                .map(ToolResult::Go)
                .collect(),
            Tool::Pytest => parse_pytest_output(raw)?
                .into_iter()
                .map(ToolResult::Pytest)
                .collect(),
            Tool::CustomSmallerIsBetter | Tool::CustomBiggerIsBetter => {
                parse_custom_output(self.tool, raw)?
                    .into_iter()
                    .map(ToolResult::Custom)
                    .collect()
            }
        };
        Ok(records)
    }

    /// Parse, unify and validate raw output into a run for `commit`
    ///
    /// `date` is the ingestion time in epoch milliseconds.
    pub fn normalize(
        &self,
        raw: &str,
        commit: Commit,
        date: i64,
    ) -> Result<BenchmarkRun, NormalizationError> {
        validate_commit(self.tool, &commit)?;

        let benches: Vec<BenchmarkResult> = self
            .parse(raw)?
            .into_iter()
            .map(BenchmarkResult::from)
            .collect();
        validate_results(self.tool.id(), &benches)?;

        Ok(BenchmarkRun {
            commit,
            date,
            tool: self.tool.id().to_string(),
            benches,
        })
    }
}

/// Map a JSON syntax/shape error to the position it points at
fn json_error(tool: &str, err: &serde_json::Error) -> NormalizationError {
    NormalizationError::new(
        tool,
        format!("JSON at line {} column {}", err.line(), err.column()),
        err.to_string(),
    )
}

fn validate_commit(tool: Tool, commit: &Commit) -> Result<(), NormalizationError> {
    if commit.id.trim().is_empty() {
        return Err(NormalizationError::new(
            tool.id(),
            "commit.id",
            "commit id is empty",
        ));
    }
    if commit.parsed_timestamp().is_none() {
        return Err(NormalizationError::new(
            tool.id(),
            "commit.timestamp",
            format!("'{}' is not a valid RFC 3339 timestamp", commit.timestamp),
        ));
    }
    Ok(())
}

/// Run-level checks shared by every tool and by the store
///
/// At least one result; finite, non-negative values; names unique after
/// canonicalization; one unit per name.
pub fn validate_results(tool: &str, benches: &[BenchmarkResult]) -> Result<(), NormalizationError> {
    if benches.is_empty() {
        return Err(NormalizationError::new(
            tool,
            "output",
            "no benchmark results found",
        ));
    }

    let mut seen: HashMap<MetricKey, (usize, &str)> = HashMap::new();
    for (index, bench) in benches.iter().enumerate() {
        let section = format!("benches[{index}] ({})", bench.name);

        if bench.name.trim().is_empty() {
            return Err(NormalizationError::new(tool, section, "empty name"));
        }
        if !bench.value.is_finite() || bench.value < 0.0 {
            return Err(NormalizationError::new(
                tool,
                section,
                format!("value {} is not a finite non-negative number", bench.value),
            ));
        }

        match seen.get(&bench.key()) {
            Some((_, unit)) if *unit != bench.unit => {
                return Err(NormalizationError::new(
                    tool,
                    section,
                    format!("mixed units '{}' and '{}' for the same name", unit, bench.unit),
                ));
            }
            Some((first, _)) => {
                return Err(NormalizationError::new(
                    tool,
                    section,
                    format!("duplicate name (first seen at benches[{first}])"),
                ));
            }
            None => {
                seen.insert(bench.key(), (index, bench.unit.as_str()));
            }
        }
    }

    Ok(())
}
