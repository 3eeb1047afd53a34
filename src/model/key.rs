//! Canonical metric names
//!
//! Producers are inconsistent about a trailing `/` on grouped benchmark names
//! (`read_json/` vs `read_json`). Lookups across history go through
//! [`MetricKey`] so both spellings resolve to the same series.

use std::fmt;

/// Canonical lookup key for a benchmark name
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MetricKey(String);

impl MetricKey {
    pub fn new(name: &str) -> Self {
        let trimmed = name.trim();
        let stripped = trimmed.trim_end_matches('/');
        if stripped.is_empty() {
            Self(trimmed.to_string())
        } else {
            Self(stripped.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MetricKey {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}
