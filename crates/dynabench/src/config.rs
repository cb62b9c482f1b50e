use std::time::Duration;

use dynabench_core::dataset::DEFAULT_RECORD_COUNT;
use dynabench_core::Rounds;

pub const DEFAULT_TABLE_NAME: &str = "LargeItem";
pub const DEFAULT_REGION: &str = "local";
pub const DEFAULT_TIMEOUT_MS: u64 = 1_000_000;

/// Harness configuration.
///
/// Built from command-line flags and their environment variables by
/// [`crate::cli::Cli::config`]; this type never reads the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Backend endpoint. `None` starts the in-process mock.
    pub endpoint: Option<String>,
    /// Table holding the dataset (default: "LargeItem")
    pub table_name: String,
    /// Region handed to the SDK (default: "local")
    pub region: String,
    /// Number of generated records (default: 1,000)
    pub records: usize,
    /// Repetitions per operation kind
    pub rounds: Rounds,
    /// Operation timeout for every SDK call (default: 1,000,000 ms)
    pub timeout: Duration,
}

impl Config {
    /// The default configuration against the in-process mock.
    pub fn local() -> Self {
        Self {
            endpoint: None,
            table_name: DEFAULT_TABLE_NAME.to_string(),
            region: DEFAULT_REGION.to_string(),
            records: DEFAULT_RECORD_COUNT,
            rounds: Rounds::default(),
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }
}
