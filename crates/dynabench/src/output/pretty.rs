//! Pretty output formatting.

use crate::report::{AdapterTiming, RunReport, ScenarioReport, ScenarioStatus};

fn status_label(status: ScenarioStatus) -> &'static str {
    match status {
        ScenarioStatus::Passed => "PASS",
        ScenarioStatus::Failed => "FAIL",
        ScenarioStatus::Skipped => "SKIP",
    }
}

/// Format one adapter timing as a table row.
pub fn format_timing(timing: &AdapterTiming) -> String {
    format!(
        "  {:<10} {:>8} {:>14.3} {:>14.3}",
        timing.adapter, timing.rounds, timing.total_ms, timing.average_us
    )
}

/// Format a scenario with its verification and timings.
pub fn format_scenario(scenario: &ScenarioReport) -> String {
    let mut output = format!(
        "[{}] {} {}",
        status_label(scenario.status),
        scenario.name,
        scenario.operation
    );
    if let Some(verification) = &scenario.verification {
        output.push_str(&format!(
            "\n  Verified: {} ({} expected records)",
            verification.adapters.join(", "),
            verification.records
        ));
    }
    if let Some(error) = &scenario.error {
        output.push_str(&format!("\n  Error: {}", error));
    }
    if !scenario.timings.is_empty() {
        output.push_str(&format!(
            "\n  {:<10} {:>8} {:>14} {:>14}",
            "ADAPTER", "ROUNDS", "TOTAL (ms)", "AVG (us)"
        ));
        for timing in &scenario.timings {
            output.push('\n');
            output.push_str(&format_timing(timing));
        }
    }
    output
}

/// Format a run report for display.
pub fn format_report(report: &RunReport) -> String {
    let mut output = format!(
        "RUN {} on {} ({} records, adapters: {})\n",
        report.table,
        report.endpoint,
        report.records,
        report.adapters.join(", ")
    );
    output.push_str(&"-".repeat(60));
    for scenario in &report.scenarios {
        output.push_str(&format!("\n{}\n", format_scenario(scenario)));
    }
    if let Some(reason) = &report.aborted {
        output.push_str(&format!("\nAborted: {}\n", reason));
    }
    output.push_str(&"-".repeat(60));
    output.push_str(if report.passed() {
        "\nAll scenarios passed."
    } else {
        "\nSome scenarios did not pass."
    });
    output
}
