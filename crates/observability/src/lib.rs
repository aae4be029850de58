//! # Observability
//!
//! 可观测性模块：Tracing 日志 + 批次结束时导出的 Prometheus 指标。
//!
//! ## 功能
//!
//! - Tracing 初始化 (JSON/Pretty/Compact)，日志统一写到 stderr，
//!   stdout 留给报告输出
//! - JSON 日志携带当前 span 字段 (campaign_run 的收件人数、channel 数等)
//! - 批处理进程生命周期短，不开 HTTP 监听：运行结束后把指标写成
//!   Prometheus 文本文件 (node_exporter textfile collector 格式)
//! - Report 指标收集与统计
//!
//! ## 使用示例
//!
//! ```ignore
//! use observability::{LogConfig, LogFormat, MetricsExport};
//!
//! observability::init_logging(LogConfig::new(LogFormat::Compact, "info"))?;
//! let export = MetricsExport::install()?;
//!
//! dispatcher.send()?;
//! observability::record_report(&dispatcher.report()?);
//! export.write_textfile(Path::new("/var/lib/node_exporter/courier.prom"))?;
//! ```

pub mod metrics;

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

pub use crate::metrics::{
    record_batch_duration_ms, record_connection, record_report, MetricsSummary,
    ReportAggregator, RunningStats, StatsSummary,
};

/// 默认过滤规则附加项：SMTP 客户端的连接细节只在 warn 以上输出
const QUIET_DEPENDENCIES: &str = "lettre=warn";

/// 日志配置
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// 日志格式
    pub format: LogFormat,
    /// 未设置 RUST_LOG 时的默认级别
    pub level: String,
}

impl LogConfig {
    pub fn new(format: LogFormat, level: impl Into<String>) -> Self {
        Self {
            format,
            level: level.into(),
        }
    }

    /// 未设置 RUST_LOG 时使用的过滤规则
    pub fn default_directives(&self) -> String {
        format!("{},{}", self.level, QUIET_DEPENDENCIES)
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::new(LogFormat::default(), "info")
    }
}

/// 日志格式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// JSON 结构化日志
    #[default]
    Json,
    /// 人类可读格式
    Pretty,
    /// 紧凑单行格式
    Compact,
}

/// 初始化 Tracing
///
/// RUST_LOG 优先；否则使用 [`LogConfig::default_directives`]。
pub fn init_logging(config: LogConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.default_directives()));

    let fmt_layer = match config.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(false)
            .with_target(true)
            .with_writer(std::io::stderr)
            .boxed(),
        LogFormat::Pretty => fmt::layer().pretty().with_writer(std::io::stderr).boxed(),
        LogFormat::Compact => fmt::layer().compact().with_writer(std::io::stderr).boxed(),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .context("Failed to initialize tracing subscriber")?;

    tracing::debug!(format = ?config.format, level = %config.level, "Logging initialized");
    Ok(())
}

/// 批次指标导出
///
/// 持有全局 Prometheus recorder 的 handle，运行结束后渲染一次。
pub struct MetricsExport {
    handle: PrometheusHandle,
}

impl MetricsExport {
    /// 安装全局 recorder，之后 `record_*` 写入的指标都会被收集
    ///
    /// # Errors
    /// 进程内已安装过 recorder
    pub fn install() -> Result<Self> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("Failed to install Prometheus recorder")?;
        Ok(Self { handle })
    }

    /// 包装已有的 handle (例如局部 recorder)
    pub fn from_handle(handle: PrometheusHandle) -> Self {
        Self { handle }
    }

    /// Prometheus 文本格式
    pub fn render(&self) -> String {
        self.handle.render()
    }

    /// 写入文本文件
    ///
    /// 先写同目录临时文件再 rename，collector 不会读到半个文件。
    pub fn write_textfile(&self, path: &Path) -> Result<()> {
        let tmp = path.with_extension("prom.tmp");
        fs::write(&tmp, self.render())
            .with_context(|| format!("Failed to write metrics to {}", tmp.display()))?;
        fs::rename(&tmp, path)
            .with_context(|| format!("Failed to move metrics into {}", path.display()))?;

        tracing::info!(path = %path.display(), "Metrics written");
        Ok(())
    }
}
