use anyhow::{bail, Result};
use clap::Parser;
use dynabench::cli::Cli;
use dynabench::output::format_report;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout carries only the report
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dynabench=info,dynabench_mock=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = cli.config();
    let report = dynabench::run(&config, cli.verify_only).await?;

    println!("{}", format_report(&report, cli.format));

    if !report.passed() {
        bail!(
            "{} of {} scenarios failed{}",
            report.failures(),
            report.scenarios.len(),
            report
                .aborted
                .as_deref()
                .map(|reason| format!(", run aborted: {reason}"))
                .unwrap_or_default()
        );
    }

    tracing::info!("All scenarios passed");
    Ok(())
}
