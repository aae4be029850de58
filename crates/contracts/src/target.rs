//! Target - message receiver contract
//!
//! An empty field means the corresponding channel is not applicable.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use validator::{Validate, ValidateEmail};

/// Message receiver
///
/// Reads must be side-effect free; strategies inspect these fields to decide
/// whether they can reach the target.
pub trait Target: Send + Sync {
    /// Postal address (for print/pdf)
    fn address(&self) -> &str;

    /// Mobile number (for sms)
    fn mobile(&self) -> &str;

    /// Mail address
    fn mail(&self) -> &str;

    /// Display name
    fn name(&self) -> &str;
}

/// Plain recipient record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct Recipient {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    #[validate(custom(function = "validate_optional_mail"))]
    pub mail: String,

    #[serde(default)]
    pub mobile: String,

    #[serde(default)]
    pub address: String,
}

impl Recipient {
    /// Create a recipient with only a name set
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_mail(mut self, mail: impl Into<String>) -> Self {
        self.mail = mail.into();
        self
    }

    pub fn with_mobile(mut self, mobile: impl Into<String>) -> Self {
        self.mobile = mobile.into();
        self
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = address.into();
        self
    }
}

impl Target for Recipient {
    fn address(&self) -> &str {
        &self.address
    }

    fn mobile(&self) -> &str {
        &self.mobile
    }

    fn mail(&self) -> &str {
        &self.mail
    }

    fn name(&self) -> &str {
        &self.name
    }
}

fn validate_optional_mail(mail: &str) -> Result<(), validator::ValidationError> {
    if mail.is_empty() || mail.validate_email() {
        Ok(())
    } else {
        Err(validator::ValidationError::new("email"))
    }
}

/// Render view of a target, placed under the reserved `target` key
pub fn target_context(target: &dyn Target) -> Value {
    json!({
        "name": target.name(),
        "mail": target.mail(),
        "mobile": target.mobile(),
        "address": target.address(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recipient_builder() {
        let r = Recipient::named("A").with_mail("a@x.com");
        assert_eq!(r.name(), "A");
        assert_eq!(r.mail(), "a@x.com");
        assert!(r.mobile().is_empty());
        assert!(r.address().is_empty());
    }

    #[test]
    fn test_target_context_fields() {
        let r = Recipient::named("B").with_mobile("070");
        let ctx = target_context(&r);
        assert_eq!(ctx["name"], "B");
        assert_eq!(ctx["mobile"], "070");
        assert_eq!(ctx["mail"], "");
    }

    #[test]
    fn test_recipient_mail_validation() {
        assert!(Recipient::named("A").validate().is_ok());
        assert!(Recipient::named("A").with_mail("a@x.com").validate().is_ok());
        assert!(Recipient::named("A").with_mail("not-a-mail").validate().is_err());
    }

    #[test]
    fn test_recipient_deserialize_defaults() {
        let r: Recipient = serde_json::from_str(r#"{"name":"C"}"#).unwrap();
        assert_eq!(r, Recipient::named("C"));
    }
}
