//! Carrier payloads produced by the bundled strategies

use serde::{Deserialize, Serialize};

/// Mail address with optional display name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailAddress {
    pub address: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
}

impl MailAddress {
    pub fn new(address: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            name: name.into(),
        }
    }
}

/// File attached to every mail of a strategy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub data: Vec<u8>,
    pub filename: String,
    pub content_type: String,
}

/// Composed mail, ready for a mail transport
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailMessage {
    pub subject: String,
    pub from: MailAddress,
    pub to: MailAddress,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<MailAddress>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_path: Option<MailAddress>,
    /// Plain text part (tags stripped)
    pub text_body: String,
    /// HTML part (message as rendered)
    pub html_body: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
}

/// Printable document for postal delivery
///
/// Addressing is part of the rendered body; `addressee` is informational.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrintDocument {
    pub addressee: String,
    /// Page header, `[page]` and `[topage]` are placeholders
    pub header: String,
    pub body: String,
}
