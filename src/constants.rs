//! benchtrail constants
//!
//! Centralized definitions for tool identifiers, persisted-format markers,
//! environment variable names and defaults.

/// Benchmark tool identifiers (as written into the `tool` field of a run)
pub mod tools {
    /// libtest / criterion "bencher" output
    pub const CARGO: &str = "cargo";
    /// `go test -bench` output
    pub const GO: &str = "go";
    /// pytest-benchmark JSON (`--benchmark-json`)
    pub const PYTEST: &str = "pytest";
    /// JSON array of results where lower values are better
    pub const CUSTOM_SMALLER_IS_BETTER: &str = "customSmallerIsBetter";
    /// JSON array of results where higher values are better
    pub const CUSTOM_BIGGER_IS_BETTER: &str = "customBiggerIsBetter";
}

/// Persisted history format
pub mod format {
    /// Prefix of the `data.js` script form
    pub const DATA_JS_PREFIX: &str = "window.BENCHMARK_DATA = ";
    /// File name used for each branch in the per-branch layout
    pub const DATA_JS_FILE: &str = "data.js";
    /// Extension that selects the script form
    pub const DATA_JS_EXTENSION: &str = "js";
    /// Suffix appended to a history path to form its lock file
    pub const LOCK_SUFFIX: &str = ".lock";
    /// Display prefix of a serialized uncertainty (`"± 1234"`)
    pub const RANGE_PREFIX: &str = "± ";
}

/// Environment variables consulted by the CLI
pub mod env {
    /// GitHub event payload (commit fallback)
    pub const GITHUB_EVENT_PATH: &str = "GITHUB_EVENT_PATH";
    /// e.g. `https://github.com`
    pub const GITHUB_SERVER_URL: &str = "GITHUB_SERVER_URL";
    /// e.g. `owner/repo`
    pub const GITHUB_REPOSITORY: &str = "GITHUB_REPOSITORY";
    /// Job summary file (markdown sink fallback)
    pub const GITHUB_STEP_SUMMARY: &str = "GITHUB_STEP_SUMMARY";
}

/// Defaults
pub mod defaults {
    /// Name of the benchmark suite inside `entries`
    pub const SUITE: &str = "Benchmark";
    /// Relative increase that counts as a regression (0.5 = 150% of baseline)
    pub const THRESHOLD: f64 = 0.5;
    /// Multiplier applied to each side's range before testing overlap
    pub const CONFIDENCE_MULTIPLIER: f64 = 1.0;
    /// How long an append waits for the per-branch lock
    pub const LOCK_TIMEOUT_MS: u64 = 10_000;
    /// Poll interval while waiting for the lock
    pub const LOCK_POLL_MS: u64 = 50;
}
