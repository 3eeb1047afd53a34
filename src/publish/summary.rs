//! Markdown summary (job summary / issue comment body)

use std::fmt::Write as _;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use super::{Notifier, short_id};
use crate::detect::RegressionFinding;
use crate::model::format_number;

/// Appends a markdown table of findings to a file
#[derive(Debug, Clone)]
pub struct SummaryNotifier {
    path: PathBuf,
}

impl SummaryNotifier {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Notifier for SummaryNotifier {
    fn notify(&mut self, branch: &str, findings: &[RegressionFinding]) -> io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(render_summary(branch, findings).as_bytes())
    }
}

/// Render findings as a markdown section
pub fn render_summary(branch: &str, findings: &[RegressionFinding]) -> String {
    let mut out = String::new();
    if findings.is_empty() {
        let _ = writeln!(out, "No benchmark regressions on `{branch}`.");
        return out;
    }

    let _ = writeln!(out, "## Benchmark regressions on `{branch}`");
    let _ = writeln!(out);
    let _ = writeln!(out, "| Benchmark | Baseline | Current | Ratio | Severity |");
    let _ = writeln!(out, "|-----------|---------:|--------:|------:|----------|");
    for finding in findings {
        let ratio = finding
            .ratio
            .map_or_else(|| "n/a".to_string(), |r| format!("{r:.2}x"));
        let _ = writeln!(
            out,
            "| `{}` | {} {} (`{}`) | {} {} | {} | {} |",
            finding.name,
            format_number(finding.baseline),
            finding.unit,
            short_id(&finding.baseline_commit),
            format_number(finding.current),
            finding.unit,
            ratio,
            finding.severity,
        );
    }
    out
}
