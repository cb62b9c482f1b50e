//! Run results.

use dynabench_core::{OperationKind, Timing, Verification};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ScenarioStatus {
    Passed,
    Failed,
    /// Not attempted because an earlier scenario lost the backend.
    Skipped,
}

/// Latency of one adapter over one scenario.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdapterTiming {
    pub adapter: String,
    pub rounds: u32,
    pub total_ms: f64,
    pub average_us: f64,
}

impl From<&Timing> for AdapterTiming {
    fn from(timing: &Timing) -> Self {
        Self {
            adapter: timing.adapter.clone(),
            rounds: timing.rounds,
            total_ms: timing.total.as_secs_f64() * 1_000.0,
            average_us: timing.average().as_secs_f64() * 1_000_000.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioReport {
    pub name: OperationKind,
    pub operation: String,
    pub status: ScenarioStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification: Option<Verification>,
    pub timings: Vec<AdapterTiming>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ScenarioReport {
    pub fn skipped(name: OperationKind, operation: String) -> Self {
        Self {
            name,
            operation,
            status: ScenarioStatus::Skipped,
            verification: None,
            timings: Vec::new(),
            error: None,
        }
    }
}

/// Everything a run produced, in scenario order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub endpoint: String,
    pub table: String,
    pub records: usize,
    pub adapters: Vec<String>,
    pub verify_only: bool,
    pub scenarios: Vec<ScenarioReport>,
    /// Set when the backend became unreachable mid-run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aborted: Option<String>,
}

impl RunReport {
    pub fn passed(&self) -> bool {
        self.aborted.is_none()
            && self
                .scenarios
                .iter()
                .all(|scenario| scenario.status == ScenarioStatus::Passed)
    }

    pub fn failures(&self) -> usize {
        self.scenarios
            .iter()
            .filter(|scenario| scenario.status == ScenarioStatus::Failed)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn scenario(status: ScenarioStatus) -> ScenarioReport {
        ScenarioReport {
            status,
            ..ScenarioReport::skipped(OperationKind::Get, "getById(abc)".to_string())
        }
    }

    fn report(scenarios: Vec<ScenarioReport>) -> RunReport {
        RunReport {
            endpoint: "http://127.0.0.1:8000".to_string(),
            table: "LargeItem".to_string(),
            records: 10,
            adapters: vec!["native".to_string()],
            verify_only: false,
            scenarios,
            aborted: None,
        }
    }

    #[test]
    fn test_timing_conversion() {
        let timing = Timing {
            adapter: "native".to_string(),
            kind: OperationKind::Get,
            rounds: 4,
            total: Duration::from_millis(2),
        };
        let converted = AdapterTiming::from(&timing);
        assert_eq!(converted.rounds, 4);
        assert!((converted.total_ms - 2.0).abs() < 1e-9);
        assert!((converted.average_us - 500.0).abs() < 1e-9);
    }

    #[test]
    fn test_passed_requires_every_scenario() {
        assert!(report(vec![scenario(ScenarioStatus::Passed)]).passed());

        let mixed = report(vec![
            scenario(ScenarioStatus::Passed),
            scenario(ScenarioStatus::Failed),
        ]);
        assert!(!mixed.passed());
        assert_eq!(mixed.failures(), 1);

        let mut aborted = report(vec![scenario(ScenarioStatus::Passed)]);
        aborted.aborted = Some("Backend unavailable".to_string());
        assert!(!aborted.passed());
    }

    #[test]
    fn test_report_json_shape() {
        let json = serde_json::to_value(report(vec![scenario(ScenarioStatus::Skipped)])).unwrap();
        assert_eq!(json["verifyOnly"], false);
        assert_eq!(json["scenarios"][0]["name"], "get");
        assert_eq!(json["scenarios"][0]["status"], "skipped");
        assert!(json.get("aborted").is_none());
        assert!(json["scenarios"][0].get("error").is_none());
    }
}
