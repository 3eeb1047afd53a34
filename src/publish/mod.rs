//! Publisher and alert sinks
//!
//! [`publish`] produces the canonical bytes of a branch's history (the same
//! bytes the store writes). [`Notifier`] implementations hand findings to the
//! calling environment; what they do with them is up to the sink.

mod annotation;
mod summary;

pub use annotation::AnnotationNotifier;
pub use summary::{SummaryNotifier, render_summary};

use std::io;

use tracing::{info, warn};

use crate::detect::RegressionFinding;
use crate::model::{HistorySeries, format_number};
use crate::store::{HistoryFormat, codec};

/// Canonical serialized form of a branch's history
pub fn publish(series: &HistorySeries, format: HistoryFormat) -> serde_json::Result<Vec<u8>> {
    codec::encode(series.document(), format)
}

/// Sink for regression findings
pub trait Notifier {
    fn notify(&mut self, branch: &str, findings: &[RegressionFinding]) -> io::Result<()>;
}

/// Reports findings through `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&mut self, branch: &str, findings: &[RegressionFinding]) -> io::Result<()> {
        if findings.is_empty() {
            info!(branch, "no regressions");
            return Ok(());
        }
        for finding in findings {
            if finding.is_hard() {
                warn!(branch, "{}", describe(finding));
            } else {
                info!(branch, "{} (within noise)", describe(finding));
            }
        }
        Ok(())
    }
}

/// One-line description shared by the sinks
pub(crate) fn describe(finding: &RegressionFinding) -> String {
    let ratio = finding
        .ratio
        .map(|r| format!("{r:.2}x worse"))
        .unwrap_or_else(|| "worse than a zero baseline".to_string());
    format!(
        "{} regressed {}: {} -> {} {} (baseline {}, threshold {}%)",
        finding.name,
        ratio,
        format_number(finding.baseline),
        format_number(finding.current),
        finding.unit,
        short_id(&finding.baseline_commit),
        format_number(finding.threshold * 100.0),
    )
}

pub(crate) fn short_id(id: &str) -> &str {
    match id.char_indices().nth(7) {
        Some((end, _)) => &id[..end],
        None => id,
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::detect::{RegressionFinding, Severity};
    use crate::model::Direction;

    pub fn finding(name: &str, severity: Severity) -> RegressionFinding {
        RegressionFinding {
            name: name.to_string(),
            baseline_commit: "4b825dc642cb6eb9a060e54bf8d69288fbee4904".to_string(),
            baseline: 20000.0,
            current: 35000.0,
            unit: "ns/iter".to_string(),
            direction: Direction::SmallerIsBetter,
            ratio: Some(1.75),
            threshold: 0.5,
            severity,
        }
    }
}
