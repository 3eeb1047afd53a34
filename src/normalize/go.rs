//! `go test -bench` output parser
//!
//! Format: `Benchmark<Name>[-<procs>] <iterations> <value> <unit> [<value> <unit>]...`
//!
//! Example: `BenchmarkReadCSV-8   	   58207	     20412 ns/op	    4096 B/op	      12 allocs/op`
//!
//! The first metric keeps the benchmark name; every further metric becomes its
//! own result named `<name> - <unit>`.

use std::sync::LazyLock;

use regex::Regex;

use super::NormalizationError;
use crate::constants::tools;
use crate::model::{BenchmarkResult, parse_decimal};

/// Benchmark name with optional `-<procs>` suffix
static NAME_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(Benchmark\S*?)(?:-(\d+))?$").expect("Invalid go benchmark name regex")
});

/// One metric of a `go test -bench` result line
#[derive(Debug, Clone, PartialEq)]
pub struct GoBenchResult {
    pub name: String,
    pub procs: Option<u32>,
    pub iterations: u64,
    pub value: f64,
    pub unit: String,
}

impl GoBenchResult {
    fn extra(&self) -> String {
        match self.procs {
            Some(procs) => format!("{} times\n{} procs", self.iterations, procs),
            None => format!("{} times", self.iterations),
        }
    }
}

impl From<GoBenchResult> for BenchmarkResult {
    fn from(r: GoBenchResult) -> Self {
        let extra = r.extra();
        BenchmarkResult::new(r.name, r.value, r.unit).with_extra(extra)
    }
}

/// Parse `go test -bench` output
///
/// `Benchmark…` lines carrying only a name (printed by `-v` before the
/// result) are skipped, as are `goos:`/`PASS`/`ok` lines.
pub fn parse_go_output(output: &str) -> Result<Vec<GoBenchResult>, NormalizationError> {
    let mut results = Vec::new();

    for (index, line) in output.lines().enumerate() {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let Some(first) = tokens.first() else {
            continue;
        };
        if !first.starts_with("Benchmark") || tokens.len() < 2 {
            continue;
        }

        let malformed =
            |reason: String| NormalizationError::new(tools::GO, format!("line {}", index + 1), reason);

        let caps = NAME_REGEX
            .captures(first)
            .ok_or_else(|| malformed(format!("invalid benchmark name '{first}'")))?;
        let name = caps[1].to_string();
        let procs = match caps.get(2) {
            Some(m) => Some(
                m.as_str()
                    .parse::<u32>()
                    .map_err(|_| malformed(format!("invalid processor count '{}'", m.as_str())))?,
            ),
            None => None,
        };

        let iterations: u64 = tokens[1]
            .parse()
            .map_err(|_| malformed(format!("invalid iteration count '{}'", tokens[1])))?;

        let metrics = &tokens[2..];
        if metrics.is_empty() || metrics.len() % 2 != 0 {
            return Err(malformed(format!(
                "expected <value> <unit> pairs, got {} tokens",
                metrics.len()
            )));
        }

        for (position, pair) in metrics.chunks(2).enumerate() {
            let value = parse_decimal(pair[0])
                .ok_or_else(|| malformed(format!("invalid value '{}'", pair[0])))?;
            let unit = pair[1].to_string();
            let metric_name = if position == 0 {
                name.clone()
            } else {
                format!("{name} - {unit}")
            };
            results.push(GoBenchResult {
                name: metric_name,
                procs,
                iterations,
                value,
                unit,
            });
        }
    }

    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_metric() {
        let results = parse_go_output("BenchmarkReadCSV-8   \t   58207\t     20412 ns/op").unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].name, "BenchmarkReadCSV");
        assert_eq!(results[0].procs, Some(8));
        assert_eq!(results[0].iterations, 58207);
        assert_eq!(results[0].value, 20412.0);
        assert_eq!(results[0].unit, "ns/op");
    }

    #[test]
    fn test_extra_lists_iterations_and_procs() {
        let results = parse_go_output("BenchmarkReadCSV-8 100 5 ns/op").unwrap();
        let result: BenchmarkResult = results[0].clone().into();
        assert_eq!(result.extra.as_deref(), Some("100 times\n8 procs"));
        assert!(result.range.is_none());
    }

    #[test]
    fn test_name_without_procs() {
        let results = parse_go_output("BenchmarkFib 300 4100.5 ns/op").unwrap();
        assert_eq!(results[0].name, "BenchmarkFib");
        assert_eq!(results[0].procs, None);
    }

    #[test]
    fn test_name_only_line_is_skipped() {
        assert!(parse_go_output("BenchmarkReadCSV\n").unwrap().is_empty());
    }

    #[test]
    fn test_odd_metric_tokens_is_error() {
        let err = parse_go_output("goos: linux\nBenchmarkFib-4 300 4100 ns/op 12").unwrap_err();
        assert_eq!(err.tool, "go");
        assert_eq!(err.section, "line 2");
    }
}
