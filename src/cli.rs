//! Command-line surface of the ingestion tool

use std::path::PathBuf;

use clap::Parser;
use tracing::debug;

use crate::config::{Config, ThresholdSetting, parse_threshold};
use crate::constants::env;
use crate::detect::Detector;
use crate::ingest::{self, Ingest, IngestError, IngestReport};
use crate::normalize::Tool;
use crate::publish::{AnnotationNotifier, LogNotifier, SummaryNotifier};
use crate::store::HistoryStore;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Branch whose history receives the run
    #[arg(short, long)]
    pub branch: String,

    /// Harness that produced the output (cargo, go, pytest, customSmallerIsBetter, customBiggerIsBetter)
    #[arg(short, long, value_parser = parse_tool)]
    pub tool: Tool,

    /// Raw benchmark output file
    #[arg(short, long)]
    pub input: PathBuf,

    /// History file (`.js` selects the `window.BENCHMARK_DATA = ...` form)
    #[arg(long)]
    pub history: PathBuf,

    /// Regression threshold as a ratio (0.5) or a percentage of the baseline (150%)
    #[arg(long, value_parser = parse_threshold)]
    pub threshold: Option<f64>,

    /// Exit with status 1 when a hard regression is found
    #[arg(long)]
    pub alert_on_regression: bool,

    /// Suite name inside the history document
    #[arg(long)]
    pub suite: Option<String>,

    /// Commit JSON (or a GitHub event payload); defaults to the workflow's event
    #[arg(long, env = env::GITHUB_EVENT_PATH)]
    pub commit: Option<PathBuf>,

    /// Repository URL recorded in a new history file
    #[arg(long)]
    pub repo_url: Option<String>,

    /// Multiplier applied to ranges before testing them for overlap
    #[arg(long)]
    pub confidence: Option<f64>,

    /// JSON config file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Markdown file findings are appended to
    #[arg(long, env = env::GITHUB_STEP_SUMMARY)]
    pub summary_file: Option<PathBuf>,

    /// Print GitHub workflow-command annotations for findings
    #[arg(long)]
    pub annotations: bool,

    /// Debug logging (when RUST_LOG is unset)
    #[arg(short, long)]
    pub verbose: bool,
}

fn parse_tool(value: &str) -> Result<Tool, String> {
    value.parse().map_err(|e: crate::normalize::NormalizationError| e.reason)
}

impl Args {
    /// Flag layer of the configuration
    pub fn config_layer(&self) -> Config {
        Config {
            threshold: self.threshold.map(ThresholdSetting::Ratio),
            confidence_multiplier: self.confidence,
            suite: self.suite.clone(),
            repo_url: self.repo_url.clone(),
            ..Config::default()
        }
    }

    /// File layer merged under the flag layer
    pub fn resolve_config(&self) -> Result<Config, IngestError> {
        let file = match &self.config {
            Some(path) => Config::load_from_path(path)?,
            None => Config::default(),
        };
        Ok(Config::merge(file, self.config_layer()))
    }
}

/// Run one ingestion as described by `args`
pub fn run(args: &Args) -> Result<IngestReport, IngestError> {
    let config = args.resolve_config()?;
    debug!(?config, "configuration resolved");

    let repo_url = config.repo_url.clone().or_else(|| {
        ingest::repo_url_from_parts(
            std::env::var(env::GITHUB_SERVER_URL).ok().as_deref(),
            std::env::var(env::GITHUB_REPOSITORY).ok().as_deref(),
        )
    });

    let mut store = HistoryStore::single(&args.history)
        .with_suite(config.suite())
        .with_lock_timeout(config.lock_timeout());
    if let Some(repo_url) = repo_url {
        store = store.with_repo_url(repo_url);
    }

    let detector = Detector::new(config.detector_config(args.tool)?);
    let commit = ingest::resolve_commit(args.commit.as_deref())?;

    let mut ingest = Ingest::new(store, args.tool, detector)
        .alert_on_regression(args.alert_on_regression)
        .with_notifier(Box::new(LogNotifier));
    if args.annotations {
        ingest = ingest.with_notifier(Box::new(AnnotationNotifier::new(std::io::stdout())));
    }
    if let Some(path) = &args.summary_file {
        ingest = ingest.with_notifier(Box::new(SummaryNotifier::new(path)));
    }

    ingest.run_file(&args.branch, &args.input, commit, ingest::now_millis())
}
