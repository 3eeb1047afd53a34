//! HistoryDir helper for integration tests.
//!
//! Provides a temporary directory holding history files and raw tool output.

use std::path::PathBuf;

use tempfile::TempDir;

use benchtrail::model::{BenchmarkResult, BenchmarkRun, Commit, Identity};
use benchtrail::store::HistoryStore;

/// A temporary directory for history files.
///
/// Cleaned up when dropped.
pub struct HistoryDir {
    dir: TempDir,
}

impl HistoryDir {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp directory"),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.path().to_path_buf()
    }

    /// Store with one `data.js` per branch under this directory.
    pub fn store(&self) -> HistoryStore {
        HistoryStore::per_branch(self.path()).with_repo_url("https://github.com/acme/reader")
    }

    /// Path of a branch's history file in the per-branch layout.
    pub fn data_js(&self, branch: &str) -> PathBuf {
        self.path().join(branch).join("data.js")
    }

    pub fn write_file(&self, name: &str, content: &str) -> PathBuf {
        let path = self.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        std::fs::write(&path, content).expect("Failed to write file");
        path
    }

    pub fn read_file(&self, name: &str) -> String {
        std::fs::read_to_string(self.path().join(name)).expect("Failed to read file")
    }
}

/// A commit with a valid timestamp.
pub fn commit(id: &str) -> Commit {
    Commit {
        author: Identity::new("Alice", "alice@example.com").with_username("alice"),
        committer: Identity::new("GitHub", "noreply@github.com").with_username("web-flow"),
        distinct: Some(true),
        id: id.to_string(),
        message: format!("Commit {id}"),
        timestamp: "2024-05-01T12:00:00+09:00".to_string(),
        tree_id: None,
        url: format!("https://github.com/acme/reader/commit/{id}"),
    }
}

/// A cargo run with the given `(name, value)` results in ns/iter.
pub fn run(id: &str, date: i64, benches: &[(&str, f64)]) -> BenchmarkRun {
    BenchmarkRun {
        commit: commit(id),
        date,
        tool: "cargo".to_string(),
        benches: benches
            .iter()
            .map(|(name, value)| BenchmarkResult::new(*name, *value, "ns/iter"))
            .collect(),
    }
}

/// libtest bench output for the given `(name, value, range)` triples.
pub fn cargo_output(benches: &[(&str, u64, u64)]) -> String {
    let mut out = format!("\nrunning {} tests\n", benches.len());
    for (name, value, range) in benches {
        out.push_str(&format!(
            "test {name} ... bench: {value:>12} ns/iter (+/- {range})\n"
        ));
    }
    out.push_str("\ntest result: ok. 0 passed; 0 failed; 0 ignored; 0 measured\n");
    out
}
