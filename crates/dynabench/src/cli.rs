//! CLI definition.

use std::time::Duration;

use clap::{Parser, ValueEnum};
use dynabench_core::dataset::DEFAULT_RECORD_COUNT;
use dynabench_core::Rounds;

use crate::config::{Config, DEFAULT_REGION, DEFAULT_TABLE_NAME, DEFAULT_TIMEOUT_MS};

/// Checks that every DynamoDB client adapter returns the same records, then
/// measures their latency.
#[derive(Debug, Parser)]
#[command(name = "dynabench")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Backend endpoint. Starts the in-process mock when unset.
    #[arg(long, env = "MOCK_DYNAMODB_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Table holding the dataset.
    #[arg(long, env = "DYNABENCH_TABLE", default_value = DEFAULT_TABLE_NAME)]
    pub table: String,

    /// Region handed to the SDK.
    #[arg(long, env = "DYNABENCH_REGION", default_value = DEFAULT_REGION)]
    pub region: String,

    /// Number of generated records.
    #[arg(long, env = "DYNABENCH_RECORDS", default_value_t = DEFAULT_RECORD_COUNT)]
    pub records: usize,

    /// Repetitions of the point get.
    #[arg(long, env = "DYNABENCH_GET_ROUNDS", default_value_t = Rounds::default().get)]
    pub get_rounds: u32,

    /// Repetitions of the filtered scan.
    #[arg(long, env = "DYNABENCH_SCAN_ROUNDS", default_value_t = Rounds::default().scan)]
    pub scan_rounds: u32,

    /// Repetitions of the key query.
    #[arg(long, env = "DYNABENCH_QUERY_ROUNDS", default_value_t = Rounds::default().query)]
    pub query_rounds: u32,

    /// Operation timeout of every SDK call, in milliseconds.
    #[arg(long, env = "DYNABENCH_TIMEOUT_MS", default_value_t = DEFAULT_TIMEOUT_MS)]
    pub timeout_ms: u64,

    /// Output format.
    #[arg(long, value_enum, default_value = "pretty")]
    pub format: OutputFormat,

    /// Verify equivalence without timing anything.
    #[arg(long)]
    pub verify_only: bool,
}

/// Output format options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Raw JSON output.
    Json,
    /// Human-readable tables.
    #[default]
    Pretty,
}

impl Cli {
    pub fn config(&self) -> Config {
        Config {
            endpoint: self.endpoint.clone().filter(|e| !e.is_empty()),
            table_name: self.table.clone(),
            region: self.region.clone(),
            records: self.records,
            rounds: Rounds {
                get: self.get_rounds,
                scan: self.scan_rounds,
                query: self.query_rounds,
            },
            timeout: Duration::from_millis(self.timeout_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_defaults() {
        let cli = Cli::try_parse_from([
            "dynabench",
            "--endpoint",
            "http://localhost:4567",
            "--table",
            "Bench",
            "--records",
            "50",
            "--scan-rounds",
            "2",
            "--timeout-ms",
            "500",
            "--format",
            "json",
            "--verify-only",
        ])
        .unwrap();

        let config = cli.config();
        assert_eq!(config.endpoint.as_deref(), Some("http://localhost:4567"));
        assert_eq!(config.table_name, "Bench");
        assert_eq!(config.records, 50);
        assert_eq!(config.rounds.scan, 2);
        assert_eq!(config.timeout, Duration::from_millis(500));
        assert_eq!(cli.format, OutputFormat::Json);
        assert!(cli.verify_only);
    }

    #[test]
    fn test_flag_defaults_match_local_config() {
        use clap::CommandFactory;

        let command = Cli::command();
        let default = |id: &str| -> String {
            let arg = command
                .get_arguments()
                .find(|arg| arg.get_id() == id)
                .unwrap();
            arg.get_default_values()[0].to_string_lossy().into_owned()
        };
        let local = Config::local();

        assert_eq!(default("table"), local.table_name);
        assert_eq!(default("region"), local.region);
        assert_eq!(default("records"), local.records.to_string());
        assert_eq!(default("get_rounds"), local.rounds.get.to_string());
        assert_eq!(default("scan_rounds"), local.rounds.scan.to_string());
        assert_eq!(default("query_rounds"), local.rounds.query.to_string());
        assert_eq!(
            default("timeout_ms"),
            local.timeout.as_millis().to_string()
        );
    }

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
