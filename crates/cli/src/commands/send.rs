//! `send` command implementation.

use anyhow::{Context, Result};
use contracts::Report;
use serde::Serialize;
use tracing::info;

use crate::campaign::{load_blueprint, Campaign, CampaignConfig};
use crate::cli::SendArgs;

/// Report wrapper for JSON output
#[derive(Serialize)]
struct SendResult<'a> {
    config_path: String,
    failed: bool,
    report: &'a Report,
}

/// Execute the `send` command
pub async fn run_send(args: &SendArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading campaign");

    let blueprint = load_blueprint(&args.config)
        .with_context(|| format!("Failed to load campaign from {}", args.config.display()))?;

    let mut config = CampaignConfig::new(blueprint);
    config.reporting = args.reporting_override();
    config.delivery = args.delivery_override();
    config.metrics_file = args.metrics_file.clone();

    let campaign = Campaign::new(config);
    let outcome = campaign.run().await.context("Campaign execution failed")?;

    if args.json {
        let result = SendResult {
            config_path: args.config.display().to_string(),
            failed: outcome.failure.is_some(),
            report: &outcome.report,
        };
        let json = serde_json::to_string_pretty(&result).context("Failed to serialize report")?;
        println!("{}", json);
    } else {
        print_report(&outcome.report);
        outcome.stats.print_summary();
    }

    outcome.into_result()?;
    Ok(())
}

fn print_report(report: &Report) {
    println!("\n=== Report ===\n");

    if !report.success.is_empty() {
        println!("Sent ({}):", report.success.len());
        for line in &report.success {
            println!("  ✓ {}", line);
        }
    }

    if !report.errors.is_empty() {
        println!("\nErrors ({}):", report.errors.len());
        for line in &report.errors {
            println!("  ✗ {}", line);
        }
    }

    println!("\nCost: {:.2}", report.cost);
}
