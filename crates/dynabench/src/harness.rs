//! Run orchestration: backend startup, table preparation and the
//! scenario loop.
//!
//! Every scenario verifies that all adapters agree with the dataset before
//! timing them one adapter at a time. A [`HarnessError::BackendUnavailable`]
//! aborts the run; any other failure only fails its own scenario.

use std::net::SocketAddr;

use dynabench_core::{
    BenchmarkRunner, Dataset, HarnessError, Result, Rounds, SharedAdapter, Timing, Verification,
    Verifier,
};
use dynabench_mock::{MockDynamoServer, MockStore, RunningServer};

use crate::adapters;
use crate::config::Config;
use crate::fixture::{create_client, reset_table, seed_records, TableSpec};
use crate::report::{AdapterTiming, RunReport, ScenarioReport, ScenarioStatus};
use crate::scenario::{reference_scenarios, Scenario};

/// Where the backend lives for the duration of a run.
pub enum Backend {
    /// An endpoint somebody else started.
    External(String),
    /// The in-process mock, stopped on shutdown.
    Mock(RunningServer),
}

impl Backend {
    /// Uses the configured endpoint, or starts the mock on an ephemeral
    /// local port.
    pub async fn start(config: &Config) -> Result<Self> {
        if let Some(endpoint) = &config.endpoint {
            return Ok(Backend::External(endpoint.clone()));
        }

        let addr = SocketAddr::from(([127, 0, 0, 1], 0));
        let server = MockDynamoServer::start(addr, MockStore::new())
            .await
            .map_err(|e| HarnessError::Fixture(format!("Failed to start mock backend: {e}")))?;
        Ok(Backend::Mock(server))
    }

    pub fn endpoint(&self) -> String {
        match self {
            Backend::External(endpoint) => endpoint.clone(),
            Backend::Mock(server) => server.endpoint(),
        }
    }

    pub async fn shutdown(self) -> Result<()> {
        match self {
            Backend::External(_) => Ok(()),
            Backend::Mock(server) => server
                .shutdown()
                .await
                .map_err(|e| HarnessError::Fixture(format!("Failed to stop mock backend: {e}"))),
        }
    }
}

/// A seeded table and the adapters under test.
pub struct Harness {
    endpoint: String,
    table: String,
    dataset: Dataset,
    adapters: Vec<SharedAdapter>,
    runner: BenchmarkRunner,
}

impl Harness {
    /// Resets the table at `endpoint`, seeds a fresh dataset and builds
    /// every adapter.
    pub async fn prepare(config: &Config, endpoint: &str) -> Result<Self> {
        Self::prepare_with_dataset(config, endpoint, Dataset::generate(config.records)).await
    }

    /// Resets the table at `endpoint` and seeds `dataset` into it.
    pub async fn prepare_with_dataset(
        config: &Config,
        endpoint: &str,
        dataset: Dataset,
    ) -> Result<Self> {
        let client = create_client(config, endpoint).await;

        reset_table(&client, &TableSpec::new(&config.table_name)).await?;
        seed_records(&client, &config.table_name, dataset.records()).await?;

        Ok(Self::new(
            endpoint,
            &config.table_name,
            dataset,
            adapters::all(&client, &config.table_name),
            config.rounds,
        ))
    }

    pub fn new(
        endpoint: impl Into<String>,
        table: impl Into<String>,
        dataset: Dataset,
        adapters: Vec<SharedAdapter>,
        rounds: Rounds,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            table: table.into(),
            dataset,
            adapters,
            runner: BenchmarkRunner::new(rounds),
        }
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn adapters(&self) -> &[SharedAdapter] {
        &self.adapters
    }

    /// Runs the reference scenarios in order.
    pub async fn run(&self, verify_only: bool) -> Result<RunReport> {
        let scenarios = reference_scenarios(&self.dataset)?;
        Ok(self.run_scenarios(&scenarios, verify_only).await)
    }

    pub async fn run_scenarios(&self, scenarios: &[Scenario], verify_only: bool) -> RunReport {
        let mut report = RunReport {
            endpoint: self.endpoint.clone(),
            table: self.table.clone(),
            records: self.dataset.len(),
            adapters: self
                .adapters
                .iter()
                .map(|adapter| adapter.name().to_string())
                .collect(),
            verify_only,
            scenarios: Vec::with_capacity(scenarios.len()),
            aborted: None,
        };

        for scenario in scenarios {
            let operation = scenario.operation().to_string();
            if report.aborted.is_some() {
                report
                    .scenarios
                    .push(ScenarioReport::skipped(scenario.kind, operation));
                continue;
            }

            tracing::info!(scenario = scenario.name(), %operation, "Scenario started");

            let scenario_report = match self.run_scenario(scenario, verify_only).await {
                Ok((verification, timings)) => {
                    tracing::info!(scenario = scenario.name(), "Scenario passed");
                    ScenarioReport {
                        name: scenario.kind,
                        operation,
                        status: ScenarioStatus::Passed,
                        verification: Some(verification),
                        timings: timings.iter().map(AdapterTiming::from).collect(),
                        error: None,
                    }
                }
                Err(err) => {
                    if err.is_fatal() {
                        tracing::error!(scenario = scenario.name(), error = %err, "Aborting run");
                        report.aborted = Some(err.to_string());
                    } else {
                        tracing::warn!(scenario = scenario.name(), error = %err, "Scenario failed");
                    }
                    ScenarioReport {
                        name: scenario.kind,
                        operation,
                        status: ScenarioStatus::Failed,
                        verification: None,
                        timings: Vec::new(),
                        error: Some(err.to_string()),
                    }
                }
            };
            report.scenarios.push(scenario_report);
        }

        report
    }

    async fn run_scenario(
        &self,
        scenario: &Scenario,
        verify_only: bool,
    ) -> Result<(Verification, Vec<Timing>)> {
        let verification = Verifier::new(self.adapters.clone())
            .verify(&scenario.expectation)
            .await?;

        if verify_only {
            return Ok((verification, Vec::new()));
        }
        let timings = self
            .runner
            .run_each(&self.adapters, scenario.operation())
            .await?;
        Ok((verification, timings))
    }
}

/// Starts the backend, prepares the table, runs every scenario and stops
/// the backend again.
pub async fn run(config: &Config, verify_only: bool) -> Result<RunReport> {
    let backend = Backend::start(config).await?;
    let endpoint = backend.endpoint();
    tracing::info!(%endpoint, table = %config.table_name, records = config.records, "Preparing backend");

    let result = match Harness::prepare(config, &endpoint).await {
        Ok(harness) => harness.run(verify_only).await,
        Err(err) => Err(err),
    };

    backend.shutdown().await?;
    result
}
