//! Data models for benchtrail
//!
//! This module contains the storage-independent data structures of the
//! benchmark history: commits, runs, named results and per-branch series.

mod commit;
mod direction;
mod history;
mod key;
mod result;
mod run;

pub use commit::{Commit, Identity};
pub use direction::Direction;
pub use history::{HistoryDocument, HistorySeries, SeriesPoint};
pub use key::MetricKey;
pub use result::{BenchmarkResult, Uncertainty, format_number, format_range};
pub(crate) use result::parse_decimal;
pub use run::BenchmarkRun;
