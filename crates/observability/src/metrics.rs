//! Dispatch 指标收集模块
//!
//! 基于 Report 收集和统计每个批次的投递结果。

use contracts::Report;
use metrics::{counter, gauge, histogram};

/// 从 Report 记录指标
///
/// 每次 send 结束后调用此函数来记录指标。
///
/// # Example
///
/// ```ignore
/// use observability::metrics::record_report;
///
/// dispatcher.send()?;
/// record_report(&dispatcher.report()?);
/// ```
pub fn record_report(report: &Report) {
    // 批次计数器
    counter!("courier_batches_total").increment(1);

    // 成功投递
    counter!("courier_messages_sent_total").increment(report.success.len() as u64);
    gauge!("courier_messages_sent_current").set(report.success.len() as f64);

    // 错误 (匹配失败 + 渲染失败 + 投递失败)
    if !report.errors.is_empty() {
        counter!("courier_errors_total").increment(report.errors.len() as u64);
        counter!("courier_batches_with_errors_total").increment(1);
    }
    gauge!("courier_errors_current").set(report.errors.len() as f64);

    // 成本
    gauge!("courier_batch_cost").set(report.cost);
    histogram!("courier_batch_cost_hist").record(report.cost);
}

/// 记录一个已建立的 connection
pub fn record_connection(channel_type: &str) {
    counter!(
        "courier_connections_total",
        "channel" => channel_type.to_string()
    )
    .increment(1);
}

/// 记录批次耗时
pub fn record_batch_duration_ms(duration_ms: f64) {
    histogram!("courier_batch_duration_ms").record(duration_ms);
}

/// 批次指标聚合器
///
/// 在内存中聚合指标，便于统计和输出摘要。
#[derive(Debug, Clone, Default)]
pub struct ReportAggregator {
    /// 总批次数
    pub total_batches: u64,

    /// 成功投递总数
    pub total_sent: u64,

    /// 错误总数
    pub total_errors: u64,

    /// 有错误的批次数
    pub batches_with_errors: u64,

    /// 批次成本统计
    pub cost_stats: RunningStats,
}

impl ReportAggregator {
    /// 创建新的聚合器
    pub fn new() -> Self {
        Self::default()
    }

    /// 更新聚合统计
    pub fn update(&mut self, report: &Report) {
        self.total_batches += 1;
        self.total_sent += report.success.len() as u64;
        self.total_errors += report.errors.len() as u64;
        if !report.errors.is_empty() {
            self.batches_with_errors += 1;
        }
        self.cost_stats.push(report.cost);
    }

    /// 生成摘要报告
    pub fn summary(&self) -> MetricsSummary {
        let attempted = self.total_sent + self.total_errors;
        MetricsSummary {
            total_batches: self.total_batches,
            total_sent: self.total_sent,
            total_errors: self.total_errors,
            batches_with_errors: self.batches_with_errors,
            error_rate: if attempted > 0 {
                self.total_errors as f64 / attempted as f64 * 100.0
            } else {
                0.0
            },
            total_cost: self.cost_stats.sum(),
            batch_cost: StatsSummary::from(&self.cost_stats),
        }
    }

    /// 重置统计
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// 指标摘要
#[derive(Debug, Clone, Default)]
pub struct MetricsSummary {
    pub total_batches: u64,
    pub total_sent: u64,
    pub total_errors: u64,
    pub batches_with_errors: u64,
    pub error_rate: f64,
    pub total_cost: f64,
    pub batch_cost: StatsSummary,
}

impl std::fmt::Display for MetricsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Dispatch Metrics Summary ===")?;
        writeln!(f, "Total batches: {}", self.total_batches)?;
        writeln!(f, "Messages sent: {}", self.total_sent)?;
        writeln!(
            f,
            "Errors: {} ({:.2}%)",
            self.total_errors, self.error_rate
        )?;
        writeln!(f, "Batches with errors: {}", self.batches_with_errors)?;
        writeln!(f, "Total cost: {:.2}", self.total_cost)?;
        writeln!(f, "Batch cost: {}", self.batch_cost)?;
        Ok(())
    }
}

/// 统计摘要
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// 在线统计计算器 (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// 添加新值
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    /// 样本数量
    pub fn count(&self) -> u64 {
        self.count
    }

    /// 均值
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// 总和
    pub fn sum(&self) -> f64 {
        self.mean() * self.count as f64
    }

    /// 方差
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    /// 标准差
    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(cost: f64, sent: usize, errors: usize) -> Report {
        Report {
            cost,
            errors: (0..errors).map(|i| format!("error {i}")).collect(),
            success: (0..sent).map(|i| format!("sent {i}")).collect(),
        }
    }

    #[test]
    fn test_running_stats() {
        let mut stats = RunningStats::default();

        for v in [1.0, 2.0, 3.0, 4.0, 5.0] {
            stats.push(v);
        }

        assert_eq!(stats.count(), 5);
        assert!((stats.mean() - 3.0).abs() < 1e-10);
        assert!((stats.sum() - 15.0).abs() < 1e-10);
        assert!((stats.min() - 1.0).abs() < 1e-10);
        assert!((stats.max() - 5.0).abs() < 1e-10);
        assert!((stats.variance() - 2.5).abs() < 1e-10);
    }

    #[test]
    fn test_aggregator_update() {
        let mut aggregator = ReportAggregator::new();

        aggregator.update(&report(0.35, 2, 0));
        aggregator.update(&report(0.70, 1, 1));

        assert_eq!(aggregator.total_batches, 2);
        assert_eq!(aggregator.total_sent, 3);
        assert_eq!(aggregator.total_errors, 1);
        assert_eq!(aggregator.batches_with_errors, 1);

        let summary = aggregator.summary();
        assert!((summary.total_cost - 1.05).abs() < 1e-9);
        assert!((summary.error_rate - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_record_without_recorder_is_noop() {
        record_report(&report(1.0, 1, 1));
        record_connection("sms");
    }

    #[test]
    fn test_summary_display() {
        let summary = MetricsSummary {
            total_batches: 4,
            total_sent: 10,
            total_errors: 2,
            batches_with_errors: 1,
            error_rate: 16.666,
            total_cost: 3.5,
            batch_cost: StatsSummary {
                count: 4,
                min: 0.35,
                max: 1.4,
                mean: 0.875,
                std_dev: 0.4,
            },
        };

        let output = format!("{}", summary);
        assert!(output.contains("Total batches: 4"));
        assert!(output.contains("16.67%"));
        assert!(output.contains("Total cost: 3.50"));
    }
}
