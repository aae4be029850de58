//! SmtpCarrier - delivers composed mail to an SMTP server

use contracts::{Carrier, ContractError, MailAddress, MailMessage, SmtpConfig, SmtpTls};
use lettre::address::Envelope;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Address, Message, SmtpTransport, Transport};
use tracing::{debug, error, instrument};

pub const SMTP_HOST_ENV: &str = "COURIER_SMTP_HOST";
pub const SMTP_PORT_ENV: &str = "COURIER_SMTP_PORT";
pub const SMTP_TLS_ENV: &str = "COURIER_SMTP_TLS";
pub const SMTP_USER_ENV: &str = "COURIER_SMTP_USER";
pub const SMTP_PASSWORD_ENV: &str = "COURIER_SMTP_PASSWORD";

/// Connection settings after merging the campaign with the environment
#[derive(Clone, PartialEq, Eq)]
pub struct SmtpSettings {
    pub host: String,
    pub port: Option<u16>,
    pub tls: SmtpTls,
    pub user: Option<String>,
    pub password: Option<String>,
}

impl std::fmt::Debug for SmtpSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("tls", &self.tls)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .finish()
    }
}

impl SmtpSettings {
    /// Campaign values win; missing ones come from `COURIER_SMTP_*`
    pub fn from_env(config: Option<&SmtpConfig>) -> Result<Self, ContractError> {
        Self::resolve(config, |key| std::env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env) with a custom variable lookup
    pub fn resolve<F>(config: Option<&SmtpConfig>, lookup: F) -> Result<Self, ContractError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = config.cloned().unwrap_or_default();

        let host = config
            .host
            .or_else(|| lookup(SMTP_HOST_ENV))
            .filter(|h| !h.is_empty())
            .ok_or_else(|| {
                ContractError::config_validation(
                    "smtp.host",
                    format!("smtp carrier requires a host (smtp.host or {SMTP_HOST_ENV})"),
                )
            })?;

        let port = match config.port {
            Some(port) => Some(port),
            None => lookup(SMTP_PORT_ENV)
                .map(|p| {
                    p.parse::<u16>().map_err(|e| {
                        ContractError::config_validation(SMTP_PORT_ENV, e.to_string())
                    })
                })
                .transpose()?,
        };

        let tls = match config.tls {
            Some(tls) => tls,
            None => lookup(SMTP_TLS_ENV)
                .map(|t| {
                    t.parse::<SmtpTls>()
                        .map_err(|e| ContractError::config_validation(SMTP_TLS_ENV, e))
                })
                .transpose()?
                .unwrap_or_default(),
        };

        Ok(Self {
            host,
            port,
            tls,
            user: config.user.or_else(|| lookup(SMTP_USER_ENV)),
            password: config.password.or_else(|| lookup(SMTP_PASSWORD_ENV)),
        })
    }
}

/// Carrier sending `MailMessage`s through a pooled SMTP transport
///
/// The transport connects lazily, on the first delivery.
pub struct SmtpCarrier {
    name: String,
    host: String,
    transport: SmtpTransport,
}

impl SmtpCarrier {
    pub fn new(name: impl Into<String>, settings: &SmtpSettings) -> Result<Self, ContractError> {
        let name = name.into();
        let relay_error = |e: lettre::transport::smtp::Error| {
            ContractError::config_validation("smtp.host", e.to_string())
        };

        let mut builder = match settings.tls {
            SmtpTls::Starttls => {
                SmtpTransport::starttls_relay(&settings.host).map_err(relay_error)?
            }
            SmtpTls::Tls => SmtpTransport::relay(&settings.host).map_err(relay_error)?,
            SmtpTls::Plain => SmtpTransport::builder_dangerous(&settings.host),
        };
        if let Some(port) = settings.port {
            builder = builder.port(port);
        }
        if let Some(user) = &settings.user {
            builder = builder.credentials(Credentials::new(
                user.clone(),
                settings.password.clone().unwrap_or_default(),
            ));
        }

        debug!(carrier = %name, host = %settings.host, tls = ?settings.tls, "SMTP carrier ready");
        Ok(Self {
            name,
            host: settings.host.clone(),
            transport: builder.build(),
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// Build the MIME message
    ///
    /// Text and HTML go out as alternatives; attachments wrap them in a
    /// mixed part. The return path becomes the envelope sender.
    pub fn compose(&self, mail: &MailMessage) -> Result<Message, ContractError> {
        let to = self.mailbox(&mail.to)?;
        let mut builder = Message::builder()
            .from(self.mailbox(&mail.from)?)
            .to(to.clone())
            .subject(mail.subject.clone());

        if let Some(reply_to) = &mail.reply_to {
            builder = builder.reply_to(self.mailbox(reply_to)?);
        }
        if let Some(return_path) = &mail.return_path {
            let sender = self.mailbox(return_path)?.email;
            let envelope = Envelope::new(Some(sender), vec![to.email])
                .map_err(|e| ContractError::delivery(&self.name, e.to_string()))?;
            builder = builder.envelope(envelope);
        }

        let alternative =
            MultiPart::alternative_plain_html(mail.text_body.clone(), mail.html_body.clone());
        let body = if mail.attachments.is_empty() {
            alternative
        } else {
            let mut mixed = MultiPart::mixed().multipart(alternative);
            for attachment in &mail.attachments {
                let content_type = ContentType::parse(&attachment.content_type).map_err(|e| {
                    ContractError::delivery(
                        &self.name,
                        format!("invalid content type for '{}': {e}", attachment.filename),
                    )
                })?;
                mixed = mixed.singlepart(
                    Attachment::new(attachment.filename.clone())
                        .body(attachment.data.clone(), content_type),
                );
            }
            mixed
        };

        builder
            .multipart(body)
            .map_err(|e| ContractError::delivery(&self.name, e.to_string()))
    }

    fn mailbox(&self, address: &MailAddress) -> Result<Mailbox, ContractError> {
        let email: Address = address.address.parse().map_err(|e| {
            ContractError::delivery(
                &self.name,
                format!("invalid address '{}': {e}", address.address),
            )
        })?;
        let name = (!address.name.is_empty()).then(|| address.name.clone());
        Ok(Mailbox::new(name, email))
    }
}

impl Carrier<MailMessage> for SmtpCarrier {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(name = "smtp_carrier_send", skip(self, payload), fields(carrier = %self.name))]
    fn send(&self, payload: &MailMessage, _address: Option<&str>) -> Result<(), ContractError> {
        let message = self.compose(payload)?;
        match self.transport.send(&message) {
            Ok(response) => {
                debug!(carrier = %self.name, code = %response.code(), "Mail accepted");
                Ok(())
            }
            Err(e) => {
                error!(carrier = %self.name, host = %self.host, error = %e, "SMTP delivery failed");
                Err(ContractError::delivery(&self.name, e.to_string()))
            }
        }
    }
}
