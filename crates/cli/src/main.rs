//! # Courier CLI
//!
//! 命令行接口入口点。
//!
//! 提供：
//! - 配置加载与验证
//! - 路由预览 (plan)
//! - 批量投递与报告输出

mod campaign;
mod cli;
mod commands;
mod error;

use anyhow::Result;
use clap::Parser;
use observability::LogConfig;
use tracing::info;

use cli::{Cli, Commands};
use commands::{run_plan, run_send, run_validate};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Initialize logging based on CLI options
    init_logging(&cli)?;

    info!(version = env!("CARGO_PKG_VERSION"), "Courier CLI starting");

    // Execute command
    let result = match &cli.command {
        Commands::Send(args) => run_send(args).await,
        Commands::Plan(args) => run_plan(args),
        Commands::Validate(args) => run_validate(args),
    };

    if let Err(ref e) = result {
        tracing::error!(error = %e, "Command failed");
    }

    result
}

/// Initialize logging based on CLI options
fn init_logging(cli: &Cli) -> Result<()> {
    let level = if cli.quiet {
        "warn"
    } else {
        match cli.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    observability::init_logging(LogConfig::new(cli.log_format.into(), level))
}
