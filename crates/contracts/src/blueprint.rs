//! CampaignBlueprint - Config Loader output
//!
//! Describes one dispatch batch: template, global values, recipients,
//! ordered channels and the error reporting policy.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::PathBuf;
use validator::Validate;

use crate::{ErrorReporting, Recipient};

/// Config version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete campaign configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CampaignBlueprint {
    /// Config version
    #[serde(default)]
    pub version: ConfigVersion,

    /// Loud or silent batch failures
    #[serde(default)]
    pub reporting: ErrorReporting,

    /// How connections are delivered
    #[serde(default)]
    pub delivery: DeliveryMode,

    /// Message template
    #[validate(nested)]
    pub template: TemplateConfig,

    /// Values merged into every render context
    #[serde(default)]
    pub globals: Map<String, Value>,

    /// Message receivers
    #[serde(default)]
    #[validate(nested)]
    pub recipients: Vec<Recipient>,

    /// Channels in priority order
    #[validate(length(min = 1, message = "at least one channel is required"), nested)]
    pub channels: Vec<ChannelConfig>,
}

/// Delivery scheduling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryMode {
    /// One connection at a time, in insertion order
    #[default]
    Sequential,
    /// All connections in parallel on the blocking pool
    Concurrent,
}

/// Template source
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TemplateConfig {
    /// Subject/headline
    #[validate(length(min = 1, message = "template title cannot be empty"))]
    pub title: String,

    /// Jinja-style template body
    #[serde(default)]
    #[validate(length(min = 1, message = "template body cannot be empty"))]
    pub body: String,

    /// File holding the body, relative to the campaign file
    ///
    /// Read into `body` while loading, so it never reaches the dispatcher.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_file: Option<PathBuf>,

    /// Escape HTML in interpolated values
    #[serde(default)]
    pub html_escape: bool,
}

/// Channel (strategy prototype) configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ChannelConfig {
    /// Channel kind
    pub kind: ChannelKind,

    /// Transport behind the channel
    #[serde(default)]
    pub carrier: CarrierKind,

    /// Sender address (mail)
    #[serde(default)]
    #[validate(email)]
    pub from: Option<String>,

    /// Sender display name (mail)
    #[serde(default)]
    pub from_name: Option<String>,

    /// Reply-to address (mail)
    #[serde(default)]
    #[validate(email)]
    pub reply_to: Option<String>,

    /// Bounce address (mail)
    #[serde(default)]
    #[validate(email)]
    pub return_path: Option<String>,

    /// Cost per 160-character unit (sms)
    #[serde(default)]
    #[validate(range(min = 0.0, message = "unit_cost must be >= 0"))]
    pub unit_cost: Option<f64>,

    /// Output directory (spool carrier)
    #[serde(default)]
    pub spool_dir: Option<PathBuf>,

    /// Server settings (smtp carrier)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(nested)]
    pub smtp: Option<SmtpConfig>,
}

impl ChannelConfig {
    /// Create a config with only kind and carrier set
    pub fn new(kind: ChannelKind, carrier: CarrierKind) -> Self {
        Self {
            kind,
            carrier,
            from: None,
            from_name: None,
            reply_to: None,
            return_path: None,
            unit_cost: None,
            spool_dir: None,
            smtp: None,
        }
    }
}

/// Channel kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelKind {
    Mail,
    Sms,
    Pdf,
}

impl ChannelKind {
    /// Lowercase label, identical to the serde name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mail => "mail",
            Self::Sms => "sms",
            Self::Pdf => "pdf",
        }
    }
}

/// Bundled carrier kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CarrierKind {
    /// Emit a tracing event per delivery
    #[default]
    Log,
    /// Write every payload as a JSON file
    Spool,
    /// Keep payloads in memory
    Mailbox,
    /// Deliver mail to an SMTP server
    Smtp,
}

impl CarrierKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Log => "log",
            Self::Spool => "spool",
            Self::Mailbox => "mailbox",
            Self::Smtp => "smtp",
        }
    }
}

/// SMTP server settings
///
/// Every field may be left out and taken from `COURIER_SMTP_*` instead.
/// The password is never written back when a campaign is serialized.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct SmtpConfig {
    #[serde(default)]
    #[validate(length(min = 1, message = "smtp host cannot be empty"))]
    pub host: Option<String>,

    #[serde(default)]
    pub port: Option<u16>,

    #[serde(default)]
    pub tls: Option<SmtpTls>,

    #[serde(default)]
    pub user: Option<String>,

    #[serde(default, skip_serializing)]
    pub password: Option<String>,
}

/// Transport security for the smtp carrier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SmtpTls {
    /// Upgrade a plain connection, port 587
    #[default]
    Starttls,
    /// Implicit TLS, port 465
    Tls,
    /// Unencrypted, local relays only
    #[serde(rename = "none")]
    Plain,
}

impl std::str::FromStr for SmtpTls {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "starttls" => Ok(Self::Starttls),
            "tls" => Ok(Self::Tls),
            "none" => Ok(Self::Plain),
            other => Err(format!("unknown smtp tls mode '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blueprint_json() -> &'static str {
        r#"{
            "reporting": "silent",
            "template": { "title": "Reminder", "body": "Hello {{ target.name }}" },
            "recipients": [{ "name": "A", "mail": "a@x.com" }],
            "channels": [{ "kind": "mail", "from": "noreply@x.com" }]
        }"#
    }

    #[test]
    fn test_blueprint_defaults() {
        let bp: CampaignBlueprint = serde_json::from_str(blueprint_json()).unwrap();
        assert_eq!(bp.version, ConfigVersion::V1);
        assert_eq!(bp.reporting, ErrorReporting::Silent);
        assert_eq!(bp.delivery, DeliveryMode::Sequential);
        assert_eq!(bp.channels[0].carrier, CarrierKind::Log);
        assert!(bp.globals.is_empty());
        assert!(!bp.template.html_escape);
    }

    #[test]
    fn test_blueprint_validates() {
        let bp: CampaignBlueprint = serde_json::from_str(blueprint_json()).unwrap();
        assert!(bp.validate().is_ok());
    }

    #[test]
    fn test_blueprint_rejects_bad_sender() {
        let mut bp: CampaignBlueprint = serde_json::from_str(blueprint_json()).unwrap();
        bp.channels[0].from = Some("nope".into());
        assert!(bp.validate().is_err());
    }

    #[test]
    fn test_channel_kind_label() {
        assert_eq!(ChannelKind::Pdf.as_str(), "pdf");
    }

    #[test]
    fn test_smtp_settings_parse_without_password_echo() {
        let bp: CampaignBlueprint = serde_json::from_str(
            r#"{
                "template": { "title": "t", "body": "b" },
                "channels": [{
                    "kind": "mail",
                    "carrier": "smtp",
                    "from": "noreply@x.com",
                    "smtp": { "host": "mail.x.com", "tls": "none", "password": "secret" }
                }]
            }"#,
        )
        .unwrap();

        let smtp = bp.channels[0].smtp.as_ref().unwrap();
        assert_eq!(bp.channels[0].carrier, CarrierKind::Smtp);
        assert_eq!(smtp.tls, Some(SmtpTls::Plain));
        assert_eq!(smtp.password.as_deref(), Some("secret"));

        let json = serde_json::to_string(&bp).unwrap();
        assert!(!json.contains("secret"));
    }

    #[test]
    fn test_smtp_tls_from_str() {
        assert_eq!("STARTTLS".parse::<SmtpTls>(), Ok(SmtpTls::Starttls));
        assert_eq!("none".parse::<SmtpTls>(), Ok(SmtpTls::Plain));
        assert!("ssl".parse::<SmtpTls>().is_err());
    }
}
