//! Named measurement data model

use serde::{Deserialize, Serialize};

use super::MetricKey;
use crate::constants::format::RANGE_PREFIX;

/// One named measurement inside a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkResult {
    /// Display name, kept as the tool reported it (see [`MetricKey`] for lookups)
    pub name: String,

    #[serde(with = "js_number")]
    pub value: f64,

    /// Uncertainty as a display string (`"± 1234"`); absent when the tool
    /// reports no error bound
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<String>,

    pub unit: String,

    /// Free-form tool detail (iteration counts, processor count, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<String>,
}

impl BenchmarkResult {
    pub fn new(name: impl Into<String>, value: f64, unit: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value,
            range: None,
            unit: unit.into(),
            extra: None,
        }
    }

    /// Attach a numeric error margin, rendered as `"± <margin>"`
    pub fn with_margin(mut self, margin: f64) -> Self {
        self.range = Some(format_range(margin));
        self
    }

    pub fn with_extra(mut self, extra: impl Into<String>) -> Self {
        self.extra = Some(extra.into());
        self
    }

    /// Canonical lookup key for joining against history
    pub fn key(&self) -> MetricKey {
        MetricKey::new(&self.name)
    }

    pub fn uncertainty(&self) -> Uncertainty {
        self.range
            .as_deref()
            .map_or(Uncertainty::UNBOUNDED, Uncertainty::parse)
    }
}

/// Numeric error margin derived from a result's range string
///
/// A missing or unparseable range yields a zero margin with `bounded == false`,
/// so callers can tell "no error bound" apart from "exact measurement".
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Uncertainty {
    pub margin: f64,
    pub bounded: bool,
}

impl Uncertainty {
    pub const UNBOUNDED: Uncertainty = Uncertainty {
        margin: 0.0,
        bounded: false,
    };

    pub fn bounded(margin: f64) -> Self {
        Self {
            margin,
            bounded: true,
        }
    }

    /// Parse a display range such as `"± 1,234"` or `"+/- 5.5"`
    pub fn parse(range: &str) -> Self {
        let range = range.trim();
        let number = range
            .strip_prefix('±')
            .or_else(|| range.strip_prefix("+/-"))
            .unwrap_or(range);

        match parse_decimal(number) {
            Some(margin) if margin.is_finite() && margin >= 0.0 => Self::bounded(margin),
            _ => Self::UNBOUNDED,
        }
    }

    /// Interval `[value - k·margin, value + k·margin]`
    pub fn interval(&self, value: f64, multiplier: f64) -> (f64, f64) {
        let half = self.margin * multiplier;
        (value - half, value + half)
    }
}

/// Render a margin the way the history document stores it
pub fn format_range(margin: f64) -> String {
    format!("{}{}", RANGE_PREFIX, format_number(margin))
}

/// Format a number like the JavaScript producer: integral values carry no
/// fractional part
pub fn format_number(value: f64) -> String {
    if is_exact_integer(value) {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

/// Parse a decimal that may carry thousands separators (`"1,234.5"`)
pub(crate) fn parse_decimal(text: &str) -> Option<f64> {
    let cleaned: String = text.trim().chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse().ok()
}

const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

fn is_exact_integer(value: f64) -> bool {
    value.is_finite() && value.fract() == 0.0 && value.abs() <= MAX_SAFE_INTEGER
}

/// Serialize `f64` values without a trailing `.0` when they are integral
mod js_number {
    use serde::ser::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    /// JSON has no NaN or infinity; serde_json would write `null`, which no
    /// longer reads back as a number
    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if !value.is_finite() {
            return Err(S::Error::custom(format!("value {value} has no JSON form")));
        }
        if super::is_exact_integer(*value) {
            serializer.serialize_i64(*value as i64)
        } else {
            serializer.serialize_f64(*value)
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        f64::deserialize(deserializer)
    }
}
