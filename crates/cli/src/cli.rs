//! CLI argument definitions using clap.

use clap::{Args, Parser, Subcommand, ValueEnum};
use contracts::{DeliveryMode, ErrorReporting};
use std::path::PathBuf;

/// Courier - multi-channel message dispatcher
#[derive(Parser, Debug)]
#[command(
    name = "courier",
    author,
    version,
    about = "Multi-channel message dispatcher",
    long_about = "Renders one message template per recipient, routes every recipient to the \n\
                  first channel (mail, sms, pdf) able to reach it, delivers the batch and \n\
                  reports cost, failures and successes."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "COURIER_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "COURIER_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Render, route and deliver a campaign
    Send(SendArgs),

    /// Show how recipients would be routed, without sending
    Plan(PlanArgs),

    /// Validate configuration file without sending
    Validate(ValidateArgs),
}

/// Arguments for the `send` command
#[derive(Args, Debug, Clone)]
pub struct SendArgs {
    /// Path to campaign file (TOML or JSON)
    #[arg(
        short,
        long,
        default_value = "campaign.toml",
        env = "COURIER_CONFIG"
    )]
    pub config: PathBuf,

    /// Never fail on delivery errors, only report them
    #[arg(long, conflicts_with = "loud")]
    pub silent: bool,

    /// Fail if any recipient could not be reached
    #[arg(long)]
    pub loud: bool,

    /// Deliver all connections in parallel
    #[arg(long, env = "COURIER_CONCURRENT")]
    pub concurrent: bool,

    /// Output the report as JSON
    #[arg(long)]
    pub json: bool,

    /// Write Prometheus metrics to this file after the batch
    #[arg(long, env = "COURIER_METRICS_FILE")]
    pub metrics_file: Option<PathBuf>,
}

impl SendArgs {
    /// Reporting mode forced from the command line, if any
    pub fn reporting_override(&self) -> Option<ErrorReporting> {
        match (self.silent, self.loud) {
            (true, _) => Some(ErrorReporting::Silent),
            (_, true) => Some(ErrorReporting::Loud),
            _ => None,
        }
    }

    /// Delivery mode forced from the command line, if any
    pub fn delivery_override(&self) -> Option<DeliveryMode> {
        self.concurrent.then_some(DeliveryMode::Concurrent)
    }
}

/// Arguments for the `plan` command
#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Path to campaign file
    #[arg(
        short,
        long,
        default_value = "campaign.toml",
        env = "COURIER_CONFIG"
    )]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `validate` command
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Path to campaign file to validate
    #[arg(short, long, default_value = "campaign.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_send_overrides() {
        let cli = Cli::parse_from(["courier", "send", "--config", "c.toml", "--silent", "--concurrent"]);
        let Commands::Send(args) = cli.command else {
            panic!("expected send command");
        };
        assert_eq!(args.reporting_override(), Some(ErrorReporting::Silent));
        assert_eq!(args.delivery_override(), Some(DeliveryMode::Concurrent));
    }

    #[test]
    fn test_silent_conflicts_with_loud() {
        let result = Cli::try_parse_from(["courier", "send", "--silent", "--loud"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_send_defaults_keep_config() {
        let cli = Cli::parse_from(["courier", "send"]);
        let Commands::Send(args) = cli.command else {
            panic!("expected send command");
        };
        assert_eq!(args.reporting_override(), None);
        assert_eq!(args.delivery_override(), None);
        assert!(args.metrics_file.is_none());
    }
}
