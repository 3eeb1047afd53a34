//! Configuration loading
//!
//! Layers, later wins: built-in defaults, an optional JSON config file, then
//! command-line flags. Every field is optional so layers merge with `or`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::defaults;
use crate::detect::{DetectorConfig, DirectionRule, DirectionRules};
use crate::model::Direction;
use crate::normalize::Tool;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid direction pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("invalid threshold '{0}': expected a non-negative ratio (0.5) or a percentage of at least 100% (150%)")]
    InvalidThreshold(String),

    #[error("invalid {key}: {reason}")]
    InvalidValue { key: &'static str, reason: String },
}

/// Threshold as written in a config file: a ratio or a percentage string
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ThresholdSetting {
    Ratio(f64),
    Text(String),
}

impl ThresholdSetting {
    pub fn ratio(&self) -> Result<f64, ConfigError> {
        match self {
            ThresholdSetting::Ratio(ratio) => validate_ratio(*ratio, &ratio.to_string()),
            ThresholdSetting::Text(text) => parse_threshold(text),
        }
    }
}

/// Name pattern → direction entry of the `directions` list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectionSetting {
    pub pattern: String,
    pub direction: Direction,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    pub threshold: Option<ThresholdSetting>,
    pub confidence_multiplier: Option<f64>,
    /// Falls back to the tool's default direction
    pub default_direction: Option<Direction>,
    pub directions: Option<Vec<DirectionSetting>>,
    pub suite: Option<String>,
    pub repo_url: Option<String>,
    pub lock_timeout_ms: Option<u64>,
}

impl Config {
    /// Load a config file; a blank file is an empty layer
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Merge two layers, with `other` taking precedence
    pub fn merge(base: Self, other: Self) -> Self {
        Self {
            threshold: other.threshold.or(base.threshold),
            confidence_multiplier: other.confidence_multiplier.or(base.confidence_multiplier),
            default_direction: other.default_direction.or(base.default_direction),
            directions: other.directions.or(base.directions),
            suite: other.suite.or(base.suite),
            repo_url: other.repo_url.or(base.repo_url),
            lock_timeout_ms: other.lock_timeout_ms.or(base.lock_timeout_ms),
        }
    }

    pub fn threshold(&self) -> Result<f64, ConfigError> {
        self.threshold
            .as_ref()
            .map_or(Ok(defaults::THRESHOLD), ThresholdSetting::ratio)
    }

    pub fn confidence_multiplier(&self) -> Result<f64, ConfigError> {
        let k = self
            .confidence_multiplier
            .unwrap_or(defaults::CONFIDENCE_MULTIPLIER);
        if k.is_finite() && k >= 0.0 {
            Ok(k)
        } else {
            Err(ConfigError::InvalidValue {
                key: "confidenceMultiplier",
                reason: format!("{k} is not a non-negative number"),
            })
        }
    }

    pub fn suite(&self) -> &str {
        self.suite
            .as_deref()
            .filter(|suite| !suite.is_empty())
            .unwrap_or(defaults::SUITE)
    }

    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms.unwrap_or(defaults::LOCK_TIMEOUT_MS))
    }

    /// Detector settings for metrics produced by `tool`
    pub fn detector_config(&self, tool: Tool) -> Result<DetectorConfig, ConfigError> {
        let default = self
            .default_direction
            .unwrap_or_else(|| tool.default_direction());

        let mut rules = DirectionRules::new(default);
        for setting in self.directions.iter().flatten() {
            let rule = DirectionRule::new(&setting.pattern, setting.direction).map_err(|source| {
                ConfigError::InvalidPattern {
                    pattern: setting.pattern.clone(),
                    source,
                }
            })?;
            rules = rules.with_rule(rule);
        }

        Ok(DetectorConfig {
            threshold: self.threshold()?,
            confidence_multiplier: self.confidence_multiplier()?,
            directions: rules,
        })
    }
}

/// Parse a threshold as a ratio (`"0.5"`) or a percentage of the baseline
/// (`"150%"`, meaning alert above 150% of the baseline, i.e. ratio 0.5)
pub fn parse_threshold(text: &str) -> Result<f64, ConfigError> {
    let trimmed = text.trim();
    let invalid = || ConfigError::InvalidThreshold(text.to_string());

    let ratio = match trimmed.strip_suffix('%') {
        Some(percent) => {
            let percent: f64 = percent.trim().parse().map_err(|_| invalid())?;
            percent / 100.0 - 1.0
        }
        None => trimmed.parse().map_err(|_| invalid())?,
    };
    validate_ratio(ratio, text)
}

fn validate_ratio(ratio: f64, text: &str) -> Result<f64, ConfigError> {
    if ratio.is_finite() && ratio >= 0.0 {
        Ok(ratio)
    } else {
        Err(ConfigError::InvalidThreshold(text.to_string()))
    }
}
