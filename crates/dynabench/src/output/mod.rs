//! Output formatting functions.

pub mod json;
pub mod pretty;

use crate::cli::OutputFormat;
use crate::report::RunReport;

/// Format a run report for output.
pub fn format_report(report: &RunReport, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => json::format_json(report),
        OutputFormat::Pretty => pretty::format_report(report),
    }
}
