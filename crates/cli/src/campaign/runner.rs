//! Campaign runner - loads a campaign, builds the dispatcher and delivers.

use std::path::{Path, PathBuf};
use std::time::Instant;

use config_loader::ConfigLoader;
use contracts::{CampaignBlueprint, DeliveryMode, ErrorReporting, Report};
use dispatcher::{create_dispatcher, ChannelFactory, Dispatcher, DispatcherError};
use observability::{
    record_batch_duration_ms, record_connection, record_report, MetricsExport,
};
use tracing::{info, instrument, warn};

use super::BatchStats;
use crate::error::{CliError, Result};

/// Load and validate a campaign file
pub fn load_blueprint(path: &Path) -> Result<CampaignBlueprint> {
    if !path.exists() {
        return Err(CliError::config_not_found(path.display().to_string()));
    }
    ConfigLoader::load_from_path(path).map_err(|e| CliError::config_load(e.to_string()))
}

/// Campaign configuration
#[derive(Debug, Clone)]
pub struct CampaignConfig {
    /// The campaign blueprint
    pub blueprint: CampaignBlueprint,

    /// Reporting mode overriding the blueprint
    pub reporting: Option<ErrorReporting>,

    /// Delivery mode overriding the blueprint
    pub delivery: Option<DeliveryMode>,

    /// Prometheus text file written after the batch (None = disabled)
    pub metrics_file: Option<PathBuf>,
}

impl CampaignConfig {
    pub fn new(blueprint: CampaignBlueprint) -> Self {
        Self {
            blueprint,
            reporting: None,
            delivery: None,
            metrics_file: None,
        }
    }

    fn effective_reporting(&self) -> ErrorReporting {
        self.reporting.unwrap_or(self.blueprint.reporting)
    }

    fn effective_delivery(&self) -> DeliveryMode {
        self.delivery.unwrap_or(self.blueprint.delivery)
    }
}

/// Result of a campaign run
#[derive(Debug)]
pub struct CampaignOutcome {
    /// Final report, produced even if the batch failed
    pub report: Report,

    /// Batch statistics
    pub stats: BatchStats,

    /// Aggregate failure raised in loud mode
    pub failure: Option<DispatcherError>,
}

impl CampaignOutcome {
    /// Convert a loud failure into an error
    pub fn into_result(self) -> Result<Report> {
        match self.failure {
            Some(e) => Err(CliError::BatchFailed {
                count: e.errors().len(),
            }),
            None => Ok(self.report),
        }
    }
}

/// Campaign orchestrator
pub struct Campaign {
    config: CampaignConfig,
    factory: ChannelFactory,
}

impl Campaign {
    pub fn new(config: CampaignConfig) -> Self {
        Self {
            config,
            factory: ChannelFactory::new(),
        }
    }

    /// Channel factory whose mailboxes back `mailbox` carriers
    pub fn factory(&self) -> &ChannelFactory {
        &self.factory
    }

    /// Build a prepared dispatcher without sending
    #[instrument(name = "campaign_plan", skip(self))]
    pub fn plan(&self) -> Result<Dispatcher> {
        let mut dispatcher = create_dispatcher(&self.config.blueprint, &self.factory)
            .map_err(|e| CliError::dispatch(e.to_string()))?;
        dispatcher.set_error_reporting(self.config.effective_reporting());
        dispatcher
            .prepare()
            .map_err(|e| CliError::dispatch(e.to_string()))?;
        Ok(dispatcher)
    }

    /// Deliver the campaign
    #[instrument(
        name = "campaign_run",
        skip(self),
        fields(
            recipients = self.config.blueprint.recipients.len(),
            channels = self.config.blueprint.channels.len(),
            reporting = ?self.config.effective_reporting(),
        )
    )]
    pub async fn run(&self) -> Result<CampaignOutcome> {
        let export = match &self.config.metrics_file {
            Some(_) => Some(MetricsExport::install()?),
            None => None,
        };

        let blueprint = &self.config.blueprint;
        let mut dispatcher = self.plan()?;
        for connection in dispatcher.connections() {
            record_connection(connection.channel_type());
        }

        let mut stats = BatchStats {
            recipients: blueprint.recipients.len(),
            channels: blueprint.channels.len(),
            connections: dispatcher.connections().len(),
            ..Default::default()
        };

        let delivery = self.config.effective_delivery();
        info!(
            recipients = stats.recipients,
            connections = stats.connections,
            reporting = ?dispatcher.error_reporting(),
            delivery = ?delivery,
            "Sending campaign"
        );

        let start = Instant::now();
        let result = match delivery {
            DeliveryMode::Sequential => dispatcher.send(),
            DeliveryMode::Concurrent => dispatcher.send_concurrent().await,
        };
        let duration = start.elapsed();

        let failure = match result {
            Ok(()) => None,
            Err(e @ DispatcherError::Batch { .. }) => {
                warn!(errors = e.errors().len(), "Batch reported errors");
                Some(e)
            }
            Err(e) => return Err(CliError::dispatch(e.to_string())),
        };

        let report = dispatcher
            .report()
            .map_err(|e| CliError::dispatch(e.to_string()))?;
        record_report(&report);
        record_batch_duration_ms(duration.as_secs_f64() * 1000.0);
        stats.record(&report, duration);
        if let (Some(export), Some(path)) = (&export, &self.config.metrics_file) {
            export.write_textfile(path)?;
        }

        info!(
            sent = report.success.len(),
            errors = report.errors.len(),
            cost = report.cost,
            duration_ms = duration.as_millis() as u64,
            "Campaign finished"
        );

        Ok(CampaignOutcome {
            report,
            stats,
            failure,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{CarrierKind, ChannelConfig, ChannelKind, Recipient, TemplateConfig};

    fn blueprint(reporting: ErrorReporting) -> CampaignBlueprint {
        CampaignBlueprint {
            version: Default::default(),
            reporting,
            delivery: DeliveryMode::Sequential,
            template: TemplateConfig {
                title: "Reminder".into(),
                body: "Hello {{ target.name }}".into(),
                html_escape: false,
                body_file: None,
            },
            globals: Default::default(),
            recipients: vec![
                Recipient::named("B").with_mobile("070"),
                Recipient::named("D"),
            ],
            channels: vec![ChannelConfig::new(ChannelKind::Sms, CarrierKind::Mailbox)],
        }
    }

    #[tokio::test]
    async fn test_silent_run_reports_unrouted() {
        let campaign = Campaign::new(CampaignConfig::new(blueprint(ErrorReporting::Silent)));
        let outcome = campaign.run().await.unwrap();

        assert!(outcome.failure.is_none());
        assert_eq!(outcome.report.success, ["Message sent to 'B <070>' using 'sms'"]);
        assert_eq!(
            outcome.report.errors,
            ["Unable to find communication strategy for target 'D'"]
        );
        assert_eq!(outcome.stats.connections, 1);
        assert_eq!(campaign.factory().mailboxes().sms.len(), 1);
    }

    #[tokio::test]
    async fn test_loud_override_fails_batch() {
        let mut config = CampaignConfig::new(blueprint(ErrorReporting::Silent));
        config.reporting = Some(ErrorReporting::Loud);
        config.delivery = Some(DeliveryMode::Concurrent);

        let outcome = Campaign::new(config).run().await.unwrap();
        assert!(outcome.failure.is_some());
        assert_eq!(outcome.report.success.len(), 1);
        assert!(matches!(
            outcome.into_result(),
            Err(CliError::BatchFailed { count: 1 })
        ));
    }

    #[test]
    fn test_plan_does_not_send() {
        let campaign = Campaign::new(CampaignConfig::new(blueprint(ErrorReporting::Loud)));
        let dispatcher = campaign.plan().unwrap();

        assert!(dispatcher.is_prepared());
        assert_eq!(dispatcher.connections().len(), 1);
        assert!(campaign.factory().mailboxes().sms.is_empty());
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_blueprint(Path::new("/nonexistent/campaign.toml")).unwrap_err();
        assert!(matches!(err, CliError::ConfigNotFound { .. }));
    }
}
