//! `plan` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::campaign::{load_blueprint, Campaign, CampaignConfig};
use crate::cli::PlanArgs;

/// Routing plan for JSON output
#[derive(Serialize)]
struct PlanInfo {
    title: String,
    reporting: String,
    connections: Vec<ConnectionInfo>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    errors: Vec<String>,
    cost: f64,
}

#[derive(Serialize)]
struct ConnectionInfo {
    target: String,
    channel: String,
    addressee: String,
    cost: f64,
}

/// Execute the `plan` command
pub fn run_plan(args: &PlanArgs) -> Result<()> {
    info!(config = %args.config.display(), "Planning campaign");

    let blueprint = load_blueprint(&args.config)
        .with_context(|| format!("Failed to load campaign from {}", args.config.display()))?;
    let title = blueprint.template.title.clone();

    let campaign = Campaign::new(CampaignConfig::new(blueprint));
    let mut dispatcher = campaign.plan().context("Failed to prepare campaign")?;

    let connections = dispatcher
        .connections()
        .iter()
        .map(|c| ConnectionInfo {
            target: c.target_name().to_string(),
            channel: c.channel_type().to_string(),
            addressee: c.addressee().to_string(),
            cost: c.cost(),
        })
        .collect();
    let info = PlanInfo {
        title,
        reporting: format!("{:?}", dispatcher.error_reporting()),
        connections,
        errors: dispatcher.errors(),
        cost: dispatcher.cost().context("Failed to compute cost")?,
    };

    if args.json {
        let json = serde_json::to_string_pretty(&info).context("Failed to serialize plan")?;
        println!("{}", json);
    } else {
        print_plan(&info);
    }

    Ok(())
}

fn print_plan(info: &PlanInfo) {
    println!("\n=== Campaign Plan: {} ===\n", info.title);
    println!("Reporting: {}", info.reporting);

    println!("\nConnections ({}):", info.connections.len());
    for c in &info.connections {
        println!(
            "  - {} -> {} '{}' (cost {:.2})",
            c.target, c.channel, c.addressee, c.cost
        );
    }

    if !info.errors.is_empty() {
        println!("\nUnroutable ({}):", info.errors.len());
        for error in &info.errors {
            println!("  - {}", error);
        }
    }

    println!("\nEstimated cost: {:.2}", info.cost);
    println!();
}
