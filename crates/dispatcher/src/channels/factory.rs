//! ChannelFactory - builds strategy prototypes from configuration

use contracts::{
    Carrier, CarrierKind, ChannelConfig, ChannelKind, MailAddress, MailMessage, PrintDocument,
};
use serde::Serialize;
use std::borrow::Borrow;
use std::sync::Arc;
use tracing::instrument;

use super::{Channel, MailStrategy, PdfStrategy, SmsStrategy};
use crate::carriers::{LogCarrier, Mailbox, SmtpCarrier, SmtpSettings, SpoolCarrier};
use crate::error::DispatcherError;

/// Shared in-memory carriers used by `CarrierKind::Mailbox` channels
#[derive(Clone)]
pub struct Mailboxes {
    pub mail: Arc<Mailbox<MailMessage>>,
    pub sms: Arc<Mailbox<String>>,
    pub print: Arc<Mailbox<PrintDocument>>,
}

impl Default for Mailboxes {
    fn default() -> Self {
        Self {
            mail: Arc::new(Mailbox::new("mail-mailbox")),
            sms: Arc::new(Mailbox::new("sms-mailbox")),
            print: Arc::new(Mailbox::new("pdf-mailbox")),
        }
    }
}

/// Builds `Channel` prototypes from `ChannelConfig`
#[derive(Clone, Default)]
pub struct ChannelFactory {
    mailboxes: Mailboxes,
}

impl ChannelFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mailboxes shared by every mailbox-backed channel of this factory
    pub fn mailboxes(&self) -> &Mailboxes {
        &self.mailboxes
    }

    /// Create a channel prototype
    #[instrument(
        name = "channel_factory_create",
        skip(self, config),
        fields(kind = ?config.kind, carrier = ?config.carrier)
    )]
    pub fn create(&self, config: &ChannelConfig) -> Result<Channel, DispatcherError> {
        let name = channel_name(config);
        match config.kind {
            ChannelKind::Mail => {
                let from = config.from.as_ref().ok_or_else(|| {
                    DispatcherError::channel_creation(&name, "mail channel requires 'from'")
                })?;
                let carrier: Arc<dyn Carrier<MailMessage>> = match config.carrier {
                    CarrierKind::Smtp => {
                        let settings = SmtpSettings::from_env(config.smtp.as_ref())
                            .map_err(|e| DispatcherError::channel_creation(&name, e.to_string()))?;
                        let smtp = SmtpCarrier::new(&name, &settings)
                            .map_err(|e| DispatcherError::channel_creation(&name, e.to_string()))?;
                        Arc::new(smtp)
                    }
                    _ => build_carrier::<MailMessage, _>(config, &name, &self.mailboxes.mail)?,
                };
                let mut strategy = MailStrategy::new(
                    carrier,
                    MailAddress::new(from, config.from_name.clone().unwrap_or_default()),
                );
                if let Some(reply_to) = &config.reply_to {
                    strategy.set_reply_to(reply_to, "");
                }
                if let Some(return_path) = &config.return_path {
                    strategy.set_return_path(return_path, "");
                }
                Ok(strategy.into())
            }
            ChannelKind::Sms => {
                let carrier = build_carrier::<str, _>(config, &name, &self.mailboxes.sms)?;
                let mut strategy = SmsStrategy::new(carrier);
                if let Some(cost) = config.unit_cost {
                    strategy.set_unit_cost(cost);
                }
                Ok(strategy.into())
            }
            ChannelKind::Pdf => {
                let carrier =
                    build_carrier::<PrintDocument, _>(config, &name, &self.mailboxes.print)?;
                Ok(PdfStrategy::new(carrier).into())
            }
        }
    }

    /// Create prototypes for every config, preserving order
    pub fn create_all(&self, configs: &[ChannelConfig]) -> Result<Vec<Channel>, DispatcherError> {
        configs.iter().map(|c| self.create(c)).collect()
    }
}

fn channel_name(config: &ChannelConfig) -> String {
    format!("{}-{}", config.kind.as_str(), config.carrier.as_str())
}

fn build_carrier<P, T>(
    config: &ChannelConfig,
    name: &str,
    mailbox: &Arc<Mailbox<T>>,
) -> Result<Arc<dyn Carrier<P>>, DispatcherError>
where
    P: Serialize + ToOwned<Owned = T> + ?Sized + 'static,
    T: Borrow<P> + Send + 'static,
{
    let carrier: Arc<dyn Carrier<P>> = match config.carrier {
        CarrierKind::Log => Arc::new(LogCarrier::new(name)),
        CarrierKind::Spool => {
            let dir = config.spool_dir.as_ref().ok_or_else(|| {
                DispatcherError::channel_creation(name, "spool carrier requires 'spool_dir'")
            })?;
            let spool = SpoolCarrier::new(name, dir)
                .map_err(|e| DispatcherError::channel_creation(name, e.to_string()))?;
            Arc::new(spool)
        }
        CarrierKind::Mailbox => mailbox.clone(),
        CarrierKind::Smtp => {
            return Err(DispatcherError::channel_creation(
                name,
                "smtp carrier only delivers mail",
            ))
        }
    };
    Ok(carrier)
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{Recipient, SmtpConfig, SmtpTls, Strategy};
    use tempfile::tempdir;

    #[test]
    fn test_create_mail_requires_from() {
        let factory = ChannelFactory::new();
        let config = ChannelConfig::new(ChannelKind::Mail, CarrierKind::Log);
        let err = factory.create(&config).err().unwrap();
        assert!(err.to_string().contains("from"));
    }

    #[test]
    fn test_create_sms_with_unit_cost() {
        let factory = ChannelFactory::new();
        let mut config = ChannelConfig::new(ChannelKind::Sms, CarrierKind::Mailbox);
        config.unit_cost = Some(1.0);

        let Channel::Sms(sms) = factory.create(&config).unwrap() else {
            panic!("expected sms channel");
        };
        assert_eq!(sms.unit_cost(), 1.0);
    }

    #[test]
    fn test_mailbox_channels_share_factory_mailbox() {
        let factory = ChannelFactory::new();
        let config = ChannelConfig::new(ChannelKind::Pdf, CarrierKind::Mailbox);
        let mut channel = factory.create(&config).unwrap();

        channel.set_target(&Recipient::named("C").with_address("Main St 1"));
        channel.set_message("Hello C");
        channel.send().unwrap();

        assert_eq!(factory.mailboxes().print.len(), 1);
    }

    #[test]
    fn test_smtp_carrier_for_mail_only() {
        let factory = ChannelFactory::new();
        let mut mail = ChannelConfig::new(ChannelKind::Mail, CarrierKind::Smtp);
        mail.from = Some("noreply@x.com".into());
        mail.smtp = Some(SmtpConfig {
            host: Some("localhost".into()),
            tls: Some(SmtpTls::Plain),
            ..Default::default()
        });
        assert!(matches!(factory.create(&mail), Ok(Channel::Mail(_))));

        let mut sms = ChannelConfig::new(ChannelKind::Sms, CarrierKind::Smtp);
        sms.smtp = mail.smtp.clone();
        let err = factory.create(&sms).err().unwrap();
        assert!(err.to_string().contains("only delivers mail"));
    }

    #[test]
    fn test_spool_requires_dir() {
        let factory = ChannelFactory::new();
        let mut config = ChannelConfig::new(ChannelKind::Sms, CarrierKind::Spool);
        assert!(factory.create(&config).is_err());

        let dir = tempdir().unwrap();
        config.spool_dir = Some(dir.path().join("sms"));
        assert!(factory.create(&config).is_ok());
        assert!(dir.path().join("sms").is_dir());
    }
}
