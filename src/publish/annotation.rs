//! GitHub Actions workflow-command annotations

use std::io::{self, Write};

use super::{Notifier, describe};
use crate::detect::RegressionFinding;

/// Writes `::error` / `::warning` workflow commands
///
/// Hard regressions become errors, informational ones warnings. The writer is
/// normally stdout, which the Actions runner scans for commands.
#[derive(Debug)]
pub struct AnnotationNotifier<W: Write> {
    out: W,
}

impl<W: Write> AnnotationNotifier<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Notifier for AnnotationNotifier<W> {
    fn notify(&mut self, branch: &str, findings: &[RegressionFinding]) -> io::Result<()> {
        for finding in findings {
            let level = if finding.is_hard() { "error" } else { "warning" };
            let title = format!("Benchmark regression on {branch}");
            writeln!(
                self.out,
                "::{level} title={}::{}",
                escape_property(&title),
                escape_data(&describe(finding))
            )?;
        }
        self.out.flush()
    }
}

fn escape_data(text: &str) -> String {
    text.replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

fn escape_property(text: &str) -> String {
    escape_data(text).replace(':', "%3A").replace(',', "%2C")
}
