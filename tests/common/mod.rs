//! Common test utilities for integration and scenario tests.
//!
//! Note: Each integration test file compiles as a separate crate,
//! so not all helpers are used in every test file. We suppress
//! dead_code warnings at the module level.

#![allow(dead_code)]
#![allow(unused_imports)]

pub mod history_dir;

pub use history_dir::{HistoryDir, cargo_output, commit, run};
