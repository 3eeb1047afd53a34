//! Metric directionality

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Which way a metric gets worse
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Direction {
    /// Latency / duration style: higher is worse
    SmallerIsBetter,
    /// Throughput style: lower is worse
    BiggerIsBetter,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::SmallerIsBetter => "smallerIsBetter",
            Direction::BiggerIsBetter => "biggerIsBetter",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "smallerIsBetter" | "smaller" | "lower" => Ok(Direction::SmallerIsBetter),
            "biggerIsBetter" | "bigger" | "higher" => Ok(Direction::BiggerIsBetter),
            other => Err(format!("unknown direction '{other}'")),
        }
    }
}
