//! End-to-end ingestion tests
//!
//! Raw tool output in, history file and findings out, through both the
//! library pipeline and the `benchtrail` binary.

#[path = "common/mod.rs"]
mod common;

use std::path::Path;
use std::process::Command;

use benchtrail::detect::{Detector, DetectorConfig, Note, Severity};
use benchtrail::ingest::{ExitStatus, Ingest, IngestError};
use benchtrail::normalize::Tool;
use benchtrail::publish::SummaryNotifier;
use common::{HistoryDir, cargo_output, commit};

fn ingest(dir: &HistoryDir, alert: bool) -> Ingest {
    Ingest::new(dir.store(), Tool::Cargo, Detector::new(DetectorConfig::default()))
        .alert_on_regression(alert)
}

#[test]
fn regression_beyond_threshold_is_reported() {
    let dir = HistoryDir::new();
    let mut ingest = ingest(&dir, true);

    let first = ingest
        .run("main", &cargo_output(&[("read_csv", 20000, 100)]), commit("c1"), 1)
        .unwrap();
    assert!(first.evaluation.findings.is_empty());
    assert_eq!(first.exit, ExitStatus::Success);

    let second = ingest
        .run("main", &cargo_output(&[("read_csv", 35000, 100)]), commit("c2"), 2)
        .unwrap();
    assert!(second.appended());
    assert_eq!(second.evaluation.findings.len(), 1);
    let finding = &second.evaluation.findings[0];
    assert_eq!(finding.baseline, 20000.0);
    assert_eq!(finding.current, 35000.0);
    assert_eq!(finding.severity, Severity::Hard);
    assert_eq!(second.exit, ExitStatus::Regression);

    // appended even though it regressed
    assert_eq!(dir.store().load("main").unwrap().len(), 2);
}

#[test]
fn increase_within_threshold_is_quiet() {
    let dir = HistoryDir::new();
    let mut ingest = ingest(&dir, true);

    ingest
        .run("main", &cargo_output(&[("read_csv", 20000, 100)]), commit("c1"), 1)
        .unwrap();
    let report = ingest
        .run("main", &cargo_output(&[("read_csv", 22000, 100)]), commit("c2"), 2)
        .unwrap();

    assert!(report.evaluation.findings.is_empty());
    assert_eq!(report.exit, ExitStatus::Success);
}

#[test]
fn new_metric_is_noted_not_flagged() {
    let dir = HistoryDir::new();
    let mut ingest = ingest(&dir, true);

    ingest
        .run("main", &cargo_output(&[("read_csv", 20000, 100)]), commit("c1"), 1)
        .unwrap();
    let report = ingest
        .run(
            "main",
            &cargo_output(&[("read_csv", 20000, 100), ("read_parquet", 90000, 100)]),
            commit("c2"),
            2,
        )
        .unwrap();

    assert!(report.evaluation.findings.is_empty());
    assert_eq!(
        report.evaluation.notes,
        vec![Note::NewMetricObserved("read_parquet".to_string())]
    );
}

#[test]
fn regression_without_alerting_exits_successfully() {
    let dir = HistoryDir::new();
    let mut ingest = ingest(&dir, false);

    ingest
        .run("main", &cargo_output(&[("read_csv", 20000, 100)]), commit("c1"), 1)
        .unwrap();
    let report = ingest
        .run("main", &cargo_output(&[("read_csv", 90000, 100)]), commit("c2"), 2)
        .unwrap();

    assert!(report.evaluation.has_hard_regression());
    assert_eq!(report.exit, ExitStatus::Success);
}

#[test]
fn sequential_ingestions_on_beta() {
    let dir = HistoryDir::new();
    let mut ingest = ingest(&dir, false);

    ingest
        .run("beta", &cargo_output(&[("read_csv", 20000, 100)]), commit("c1"), 1_700_000_000_000)
        .unwrap();
    ingest
        .run("beta", &cargo_output(&[("read_csv", 20500, 100)]), commit("c2"), 1_700_000_060_000)
        .unwrap();

    let series = dir.store().load("beta").unwrap();
    let ids: Vec<&str> = series.runs().iter().map(|r| r.commit.id.as_str()).collect();
    assert_eq!(ids, vec!["c1", "c2"]);
    assert_eq!(series.last_update(), 1_700_000_060_000);
}

#[test]
fn retried_ingestion_is_idempotent() {
    let dir = HistoryDir::new();
    let mut ingest = ingest(&dir, true);
    let output = cargo_output(&[("read_csv", 20000, 100)]);

    ingest.run("main", &output, commit("c1"), 1).unwrap();
    let retry = ingest.run("main", &output, commit("c1"), 1).unwrap();

    assert!(!retry.appended());
    assert!(retry.evaluation.findings.is_empty());
    assert_eq!(dir.store().load("main").unwrap().len(), 1);
}

#[test]
fn malformed_output_leaves_history_untouched() {
    let dir = HistoryDir::new();
    let mut ingest = ingest(&dir, true);
    ingest
        .run("main", &cargo_output(&[("read_csv", 20000, 100)]), commit("c1"), 1)
        .unwrap();
    let before = std::fs::read(dir.data_js("main")).unwrap();

    let err = ingest
        .run("main", "test read_csv ... bench: fast\n", commit("c2"), 2)
        .unwrap_err();
    match err {
        IngestError::Normalize { branch, tool, source } => {
            assert_eq!(branch, "main");
            assert_eq!(tool, Tool::Cargo);
            assert_eq!(source.section, "line 1");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(std::fs::read(dir.data_js("main")).unwrap(), before);
}

#[test]
fn summary_notifier_receives_findings() {
    let dir = HistoryDir::new();
    let summary = dir.path().join("summary.md");
    let mut ingest = ingest(&dir, true).with_notifier(Box::new(SummaryNotifier::new(&summary)));

    ingest
        .run("main", &cargo_output(&[("read_csv", 20000, 100)]), commit("c1"), 1)
        .unwrap();
    ingest
        .run("main", &cargo_output(&[("read_csv", 35000, 100)]), commit("c2"), 2)
        .unwrap();

    let text = std::fs::read_to_string(&summary).unwrap();
    assert!(text.contains("No benchmark regressions on `main`."));
    assert!(text.contains("| `read_csv` | 20000 ns/iter (`c1`) | 35000 ns/iter | 1.75x | hard |"));
}

// =============================================================================
// Binary
// =============================================================================

fn benchtrail(dir: &Path, args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_benchtrail"))
        .args(args)
        .current_dir(dir)
        .env_remove("GITHUB_EVENT_PATH")
        .env_remove("GITHUB_STEP_SUMMARY")
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute benchtrail")
}

fn write_commit(dir: &HistoryDir, id: &str) {
    let json = serde_json::to_string(&commit(id)).unwrap();
    dir.write_file(&format!("{id}.json"), &json);
}

#[test]
fn binary_exit_codes() {
    let dir = HistoryDir::new();
    write_commit(&dir, "c1");
    write_commit(&dir, "c2");
    dir.write_file("base.txt", &cargo_output(&[("read_csv", 20000, 100)]));
    dir.write_file("slow.txt", &cargo_output(&[("read_csv", 35000, 100)]));

    let common = [
        "--branch",
        "main",
        "--tool",
        "cargo",
        "--history",
        "bench/data.js",
        "--alert-on-regression",
    ];
    let with = |input: &'static str, commit: &'static str| -> Vec<&'static str> {
        let mut args = common.to_vec();
        args.extend(["--input", input, "--commit", commit]);
        args
    };

    let out = benchtrail(&dir.path(), &with("base.txt", "c1.json"));
    assert_eq!(out.status.code(), Some(0), "{}", String::from_utf8_lossy(&out.stderr));

    let out = benchtrail(&dir.path(), &with("slow.txt", "c2.json"));
    assert_eq!(out.status.code(), Some(1), "{}", String::from_utf8_lossy(&out.stderr));

    let history = dir.read_file("bench/data.js");
    assert!(history.starts_with("window.BENCHMARK_DATA = {"));
    assert!(history.contains("\"id\": \"c2\""));
}

#[test]
fn binary_reports_normalization_errors_with_status_2() {
    let dir = HistoryDir::new();
    write_commit(&dir, "c1");
    dir.write_file("empty.txt", "running 0 tests\n");

    let out = benchtrail(
        &dir.path(),
        &[
            "--branch",
            "main",
            "--tool",
            "cargo",
            "--input",
            "empty.txt",
            "--history",
            "data.json",
            "--commit",
            "c1.json",
        ],
    );
    assert_eq!(out.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("no benchmark results found"), "{stderr}");
    assert!(!dir.path().join("data.json").exists());
}
