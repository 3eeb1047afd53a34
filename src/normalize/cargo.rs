//! libtest / criterion "bencher" output parser
//!
//! Format: `test <name> ... bench: <value> <unit> (+/- <range>)`
//!
//! Example: `test read_csv ... bench:      20,412 ns/iter (+/- 1,337)`

use std::sync::LazyLock;

use regex::Regex;

use super::NormalizationError;
use crate::constants::tools;
use crate::model::{BenchmarkResult, parse_decimal};

/// Groups:
/// 1. name
/// 2. value (may contain thousands separators)
/// 3. unit (e.g. `ns/iter`)
/// 4. range after `+/-`
static BENCH_LINE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^test\s+(.+?)\s+\.\.\.\s+bench:\s+([0-9][0-9,]*(?:\.[0-9]+)?)\s+(\S+)\s+\(\+/-\s+([0-9][0-9,]*(?:\.[0-9]+)?)\)\s*$",
    )
    .expect("Invalid cargo bench line regex")
});

/// One `cargo bench` result line
#[derive(Debug, Clone, PartialEq)]
pub struct CargoBenchResult {
    pub name: String,
    pub value: f64,
    pub unit: String,
    pub margin: f64,
}

impl From<CargoBenchResult> for BenchmarkResult {
    fn from(r: CargoBenchResult) -> Self {
        BenchmarkResult::new(r.name, r.value, r.unit).with_margin(r.margin)
    }
}

/// Parse `cargo bench` output
///
/// Lines that are not benchmark results (`running 3 tests`, `test x ... ok`,
/// compiler noise) are skipped. A line that claims to be a benchmark result
/// (`test … bench:`) but does not match the grammar is an error.
pub fn parse_cargo_output(output: &str) -> Result<Vec<CargoBenchResult>, NormalizationError> {
    let mut results = Vec::new();

    for (index, line) in output.lines().enumerate() {
        let line = line.trim();
        if !is_bench_line(line) {
            continue;
        }

        let malformed =
            |reason: &str| NormalizationError::new(tools::CARGO, format!("line {}", index + 1), reason);

        let caps = BENCH_LINE_REGEX
            .captures(line)
            .ok_or_else(|| malformed(&format!("unrecognized bench line '{line}'")))?;

        let value = parse_decimal(&caps[2]).ok_or_else(|| malformed("invalid value"))?;
        let margin = parse_decimal(&caps[4]).ok_or_else(|| malformed("invalid range"))?;

        results.push(CargoBenchResult {
            name: caps[1].to_string(),
            value,
            unit: caps[3].to_string(),
            margin,
        });
    }

    Ok(results)
}

fn is_bench_line(line: &str) -> bool {
    line.starts_with("test ") && line.contains(" bench:")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_line() {
        let results =
            parse_cargo_output("test read_csv ... bench:      20,412 ns/iter (+/- 1,337)").unwrap();
        assert_eq!(
            results,
            vec![CargoBenchResult {
                name: "read_csv".to_string(),
                value: 20412.0,
                unit: "ns/iter".to_string(),
                margin: 1337.0,
            }]
        );
    }

    #[test]
    fn test_conversion_renders_range() {
        let result: BenchmarkResult = CargoBenchResult {
            name: "read_csv".to_string(),
            value: 20412.0,
            unit: "ns/iter".to_string(),
            margin: 1337.0,
        }
        .into();
        assert_eq!(result.range.as_deref(), Some("± 1337"));
        assert_eq!(result.unit, "ns/iter");
    }

    #[test]
    fn test_non_bench_lines_are_skipped() {
        let output = "running 2 tests\ntest tests::it_works ... ok\n\ntest result: ok. 1 passed";
        assert!(parse_cargo_output(output).unwrap().is_empty());
    }

    #[test]
    fn test_malformed_bench_line_names_the_line() {
        let output = "running 1 test\ntest read_csv ... bench: fast";
        let err = parse_cargo_output(output).unwrap_err();
        assert_eq!(err.tool, "cargo");
        assert_eq!(err.section, "line 2");
    }
}
