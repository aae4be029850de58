//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::{CampaignBlueprint, CarrierKind, Strategy, Target};
use dispatcher::{Channel, ChannelFactory, DispatcherError};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    reporting: String,
    delivery: String,
    recipient_count: usize,
    channel_count: usize,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    // Check file exists
    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    // Try to load and validate
    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(blueprint) => {
            let warnings = collect_warnings(&blueprint);
            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(ConfigSummary {
                    version: format!("{:?}", blueprint.version),
                    reporting: format!("{:?}", blueprint.reporting),
                    delivery: format!("{:?}", blueprint.delivery),
                    recipient_count: blueprint.recipients.len(),
                    channel_count: blueprint.channels.len(),
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Channel prototypes matching the campaign's acceptance rules
///
/// Every channel is built on an in-memory carrier, so checking reachability
/// neither creates spool directories nor needs SMTP settings.
fn acceptance_prototypes(blueprint: &CampaignBlueprint) -> Result<Vec<Channel>, DispatcherError> {
    let factory = ChannelFactory::new();
    blueprint
        .channels
        .iter()
        .map(|config| {
            let mut config = config.clone();
            config.carrier = CarrierKind::Mailbox;
            factory.create(&config)
        })
        .collect()
}

/// Whether any channel accepts the recipient
fn reaches(channels: &[Channel], target: &dyn Target) -> bool {
    channels
        .iter()
        .any(|channel| channel.clone().set_target(target))
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(blueprint: &CampaignBlueprint) -> Vec<String> {
    let mut warnings = Vec::new();

    if blueprint.recipients.is_empty() {
        warnings.push("No recipients configured - nothing will be sent".to_string());
    }

    // A later channel of the same kind accepts exactly the same recipients
    for (idx, channel) in blueprint.channels.iter().enumerate() {
        if let Some(first) = blueprint.channels[..idx]
            .iter()
            .position(|c| c.kind == channel.kind)
        {
            warnings.push(format!(
                "channels[{}] ({}) is shadowed by channels[{}]",
                idx,
                channel.kind.as_str(),
                first
            ));
        }
    }

    let channels = match acceptance_prototypes(blueprint) {
        Ok(channels) => channels,
        Err(e) => {
            warnings.push(format!("Recipient reachability not checked: {e}"));
            return warnings;
        }
    };
    for recipient in &blueprint.recipients {
        if !reaches(&channels, recipient) {
            warnings.push(format!(
                "Recipient '{}' cannot be reached by any configured channel",
                recipient.name
            ));
        }
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Reporting: {}", summary.reporting);
            println!("  Delivery: {}", summary.delivery);
            println!("  Recipients: {}", summary.recipient_count);
            println!("  Channels: {}", summary.channel_count);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    fn args(file: &tempfile::NamedTempFile) -> ValidateArgs {
        ValidateArgs {
            config: file.path().to_path_buf(),
            json: true,
        }
    }

    #[test]
    fn test_valid_config_with_warnings() {
        let file = write_config(
            r#"
[template]
title = "Reminder"
body = "Hello {{ target.name }}"

[[recipients]]
name = "D"

[[channels]]
kind = "sms"

[[channels]]
kind = "sms"
carrier = "mailbox"
"#,
        );
        let result = validate_config(&args(&file));

        assert!(result.valid);
        let warnings = result.warnings.unwrap();
        assert_eq!(warnings.len(), 2);
        assert!(warnings[0].contains("shadowed"));
        assert!(warnings[1].contains("'D'"));
    }

    #[test]
    fn test_reachability_follows_channel_rules() {
        let file = write_config(
            r#"
[template]
title = "Reminder"
body = "Hello {{ target.name }}"

[[recipients]]
name = "A"
mail = "a@x.com"

[[recipients]]
name = "C"
address = "Main St 1"

[[recipients]]
name = "D"
mobile = "070"

[[channels]]
kind = "mail"
carrier = "smtp"
from = "noreply@x.com"

[[channels]]
kind = "pdf"
carrier = "spool"
spool_dir = "letters"
"#,
        );
        let result = validate_config(&args(&file));

        assert!(result.valid);
        assert_eq!(
            result.warnings.unwrap(),
            ["Recipient 'D' cannot be reached by any configured channel"]
        );
        let spool = file.path().parent().unwrap().join("letters");
        assert!(!spool.exists());
    }

    #[test]
    fn test_invalid_config() {
        let file = write_config("[template]\ntitle = \"t\"\nbody = \"b\"\n");
        let result = validate_config(&args(&file));
        assert!(!result.valid);
        assert!(result.error.is_some());
    }

    #[test]
    fn test_missing_file() {
        let result = validate_config(&ValidateArgs {
            config: "/nonexistent/campaign.toml".into(),
            json: false,
        });
        assert!(!result.valid);
        assert!(result.error.unwrap().contains("File not found"));
    }
}
