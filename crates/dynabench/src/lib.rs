//! dynabench - equivalence checks and latency benchmarks for DynamoDB
//! client adapters.
//!
//! A run seeds one table with a generated dataset, verifies that the
//! [`native`](adapters::native), [`model`](adapters::model) and
//! [`mapper`](adapters::mapper) adapters all return exactly the expected
//! records, then times each of them. Without an endpoint the in-process
//! mock from `dynabench_mock` serves the table.

pub mod adapters;
pub mod cli;
pub mod config;
pub mod error;
pub mod fixture;
pub mod harness;
pub mod output;
pub mod report;
pub mod scenario;

pub use config::Config;
pub use harness::{run, Backend, Harness};
pub use report::{RunReport, ScenarioReport, ScenarioStatus};
