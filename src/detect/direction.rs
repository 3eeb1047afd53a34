//! Per-name direction rules

use regex::Regex;

use super::DetectionError;
use crate::model::{Direction, MetricKey};

/// A name pattern and the direction it assigns
#[derive(Debug, Clone)]
pub struct DirectionRule {
    pattern: Regex,
    direction: Direction,
}

impl DirectionRule {
    pub fn new(pattern: &str, direction: Direction) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
            direction,
        })
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }
}

/// Resolves the direction of each metric
///
/// Directions are configuration, never inferred from values. Rules are
/// matched against the canonical name; when none match the default applies.
#[derive(Debug, Clone)]
pub struct DirectionRules {
    default: Direction,
    rules: Vec<DirectionRule>,
}

impl DirectionRules {
    pub fn new(default: Direction) -> Self {
        Self {
            default,
            rules: Vec::new(),
        }
    }

    pub fn with_rule(mut self, rule: DirectionRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn default_direction(&self) -> Direction {
        self.default
    }

    pub fn rules(&self) -> &[DirectionRule] {
        &self.rules
    }

    /// Direction of `key`, or an error when matching rules disagree
    pub fn resolve(&self, key: &MetricKey) -> Result<Direction, DetectionError> {
        let matching: Vec<&DirectionRule> = self
            .rules
            .iter()
            .filter(|rule| rule.pattern.is_match(key.as_str()))
            .collect();

        let Some(first) = matching.first() else {
            return Ok(self.default);
        };

        if matching.iter().all(|rule| rule.direction == first.direction) {
            Ok(first.direction)
        } else {
            Err(DetectionError::AmbiguousDirection {
                name: key.to_string(),
                patterns: matching
                    .iter()
                    .map(|rule| format!("{} => {}", rule.pattern(), rule.direction))
                    .collect(),
            })
        }
    }
}

impl Default for DirectionRules {
    fn default() -> Self {
        Self::new(Direction::SmallerIsBetter)
    }
}
