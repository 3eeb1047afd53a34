//! Custom JSON results (`customSmallerIsBetter` / `customBiggerIsBetter`)
//!
//! Format: a JSON array of `{"name", "value", "unit", "range"?, "extra"?}`.
//! `range` may be a display string (`"± 3"`, `"+/- 3"`) or a bare number;
//! either way it is stored as `"± <margin>"`.

use serde::Deserialize;

use super::{NormalizationError, Tool, json_error};
use crate::model::{BenchmarkResult, Uncertainty, format_range};

/// Range as written by a custom producer
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum CustomRange {
    Number(f64),
    Text(String),
}

/// One element of the custom results array
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CustomBenchResult {
    pub name: String,

    pub value: f64,

    pub unit: String,

    #[serde(default)]
    pub range: Option<CustomRange>,

    #[serde(default)]
    pub extra: Option<String>,
}

impl From<CustomBenchResult> for BenchmarkResult {
    fn from(r: CustomBenchResult) -> Self {
        let mut result = BenchmarkResult::new(r.name, r.value, r.unit);
        let uncertainty = match r.range {
            Some(CustomRange::Number(margin)) if margin.is_finite() && margin >= 0.0 => {
                Uncertainty::bounded(margin)
            }
            Some(CustomRange::Text(text)) => Uncertainty::parse(&text),
            _ => Uncertainty::UNBOUNDED,
        };
        // stored canonically; a range that is not a margin is dropped
        result.range = uncertainty.bounded.then(|| format_range(uncertainty.margin));
        result.extra = r.extra;
        result
    }
}

/// Parse a custom results array
pub fn parse_custom_output(
    tool: Tool,
    output: &str,
) -> Result<Vec<CustomBenchResult>, NormalizationError> {
    serde_json::from_str(output).map_err(|e| json_error(tool.id(), &e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_with_and_without_range() {
        let output = r#"[
            {"name": "throughput", "value": 5120.5, "unit": "ops/sec", "range": "± 40"},
            {"name": "startup", "value": 12, "unit": "ms", "range": 1.5, "extra": "cold cache"},
            {"name": "rss", "value": 48, "unit": "MiB"}
        ]"#;
        let results: Vec<BenchmarkResult> = parse_custom_output(Tool::CustomBiggerIsBetter, output)
            .unwrap()
            .into_iter()
            .map(BenchmarkResult::from)
            .collect();

        assert_eq!(results[0].range.as_deref(), Some("± 40"));
        assert_eq!(results[1].range.as_deref(), Some("± 1.5"));
        assert_eq!(results[1].extra.as_deref(), Some("cold cache"));
        assert!(results[2].range.is_none());
        assert!(!results[2].uncertainty().bounded);
    }

    #[test]
    fn test_text_range_is_canonicalized() {
        let output = r#"[
            {"name": "parse", "value": 40, "unit": "ms", "range": "+/- 3"},
            {"name": "render", "value": 90, "unit": "ms", "range": "±1,200"},
            {"name": "encode", "value": 7, "unit": "ms", "range": "stddev: n/a"},
            {"name": "decode", "value": 8, "unit": "ms", "range": -2}
        ]"#;
        let results: Vec<BenchmarkResult> = parse_custom_output(Tool::CustomSmallerIsBetter, output)
            .unwrap()
            .into_iter()
            .map(BenchmarkResult::from)
            .collect();

        assert_eq!(results[0].range.as_deref(), Some("± 3"));
        assert_eq!(results[0].uncertainty(), Uncertainty::bounded(3.0));
        assert_eq!(results[1].range.as_deref(), Some("± 1200"));
        assert!(results[2].range.is_none());
        assert!(results[3].range.is_none());
    }

    #[test]
    fn test_not_an_array_is_error() {
        let err = parse_custom_output(Tool::CustomSmallerIsBetter, r#"{"name": "x"}"#).unwrap_err();
        assert_eq!(err.tool, "customSmallerIsBetter");
    }
}
