//! Batch statistics and metrics.

use std::time::Duration;

use contracts::Report;
use observability::ReportAggregator;

/// Statistics from a campaign run
#[derive(Debug, Clone, Default)]
pub struct BatchStats {
    /// Recipients in the campaign
    pub recipients: usize,

    /// Configured channel prototypes
    pub channels: usize,

    /// Recipients routed to a channel
    pub connections: usize,

    /// Time spent delivering
    pub duration: Duration,

    /// Report metrics aggregator
    pub report_metrics: ReportAggregator,
}

impl BatchStats {
    /// Messages delivered per second
    pub fn throughput(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.report_metrics.total_sent as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Share of recipients that no channel could reach, in percent
    pub fn unrouted_rate(&self) -> f64 {
        if self.recipients > 0 {
            (self.recipients - self.connections.min(self.recipients)) as f64
                / self.recipients as f64
                * 100.0
        } else {
            0.0
        }
    }

    /// Fold a finished batch into the statistics
    pub fn record(&mut self, report: &Report, duration: Duration) {
        self.duration += duration;
        self.report_metrics.update(report);
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n=== Batch Statistics ===\n");
        println!("Overview");
        println!("  Duration: {:.3}s", self.duration.as_secs_f64());
        println!("  Recipients: {}", self.recipients);
        println!("  Channels: {}", self.channels);
        println!(
            "  Routed: {} ({:.2}% unrouted)",
            self.connections,
            self.unrouted_rate()
        );
        println!("  Throughput: {:.2} msg/s", self.throughput());

        println!("\n{}", self.report_metrics.summary());
    }
}
