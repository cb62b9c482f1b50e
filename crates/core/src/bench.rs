//! Sequential latency measurement.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::adapter::{Adapter, Operation, OperationKind, SharedAdapter};
use crate::error::Result;

/// Repetition counts per operation kind.
///
/// Point gets are cheap and repeated often; scans walk the whole table and
/// get far fewer rounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rounds {
    pub get: u32,
    pub scan: u32,
    pub query: u32,
}

impl Default for Rounds {
    fn default() -> Self {
        Self {
            get: 10_000,
            scan: 50,
            query: 1_000,
        }
    }
}

impl Rounds {
    /// Same count for every kind.
    pub fn uniform(rounds: u32) -> Self {
        Self {
            get: rounds,
            scan: rounds,
            query: rounds,
        }
    }

    pub fn for_kind(&self, kind: OperationKind) -> u32 {
        match kind {
            OperationKind::Get => self.get,
            OperationKind::Scan => self.scan,
            OperationKind::Query => self.query,
        }
    }
}

/// Elapsed time of one timed run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timing {
    pub adapter: String,
    pub kind: OperationKind,
    pub rounds: u32,
    pub total: Duration,
}

impl Timing {
    /// Mean latency per round; zero when no rounds ran.
    pub fn average(&self) -> Duration {
        if self.rounds == 0 {
            Duration::ZERO
        } else {
            self.total / self.rounds
        }
    }
}

/// Repeats operations and measures wall time.
#[derive(Debug, Clone, Default)]
pub struct BenchmarkRunner {
    rounds: Rounds,
}

impl BenchmarkRunner {
    pub fn new(rounds: Rounds) -> Self {
        Self { rounds }
    }

    pub fn rounds(&self) -> Rounds {
        self.rounds
    }

    /// Invokes `operation` through `adapter` the configured number of
    /// times, one request at a time.
    ///
    /// Returned records are discarded; the first error aborts the run.
    pub async fn run(&self, adapter: &dyn Adapter, operation: &Operation) -> Result<Timing> {
        let kind = operation.kind();
        let rounds = self.rounds.for_kind(kind);

        tracing::debug!(adapter = adapter.name(), %kind, rounds, "Starting timed run");

        let started = Instant::now();
        for _ in 0..rounds {
            let records = operation.invoke(adapter).await?;
            drop(std::hint::black_box(records));
        }
        let total = started.elapsed();

        let timing = Timing {
            adapter: adapter.name().to_string(),
            kind,
            rounds,
            total,
        };

        tracing::info!(
            adapter = adapter.name(),
            %kind,
            rounds,
            total_ms = total.as_millis() as u64,
            avg_us = timing.average().as_micros() as u64,
            "Timed run finished"
        );

        Ok(timing)
    }

    /// Times each adapter in turn. Runs never overlap.
    pub async fn run_each(
        &self,
        adapters: &[SharedAdapter],
        operation: &Operation,
    ) -> Result<Vec<Timing>> {
        let mut timings = Vec::with_capacity(adapters.len());
        for adapter in adapters {
            timings.push(self.run(adapter.as_ref(), operation).await?);
        }
        Ok(timings)
    }
}
