//! MailStrategy - composes and sends mail

use contracts::{
    Attachment, Carrier, ContractError, MailAddress, MailMessage, Strategy, Target,
};
use std::sync::Arc;
use tracing::instrument;

use crate::text::strip_tags;

/// Mail transport
pub type MailCarrier = Arc<dyn Carrier<MailMessage>>;

/// Mail channel
///
/// Accepts a target iff its mail address is non-empty. The rendered message
/// is sent as HTML part plus a tag-stripped text part.
#[derive(Clone)]
pub struct MailStrategy {
    carrier: MailCarrier,
    from: MailAddress,
    reply_to: Option<MailAddress>,
    return_path: Option<MailAddress>,
    attachments: Vec<Attachment>,
    to: Option<MailAddress>,
    subject: Option<String>,
    message: Option<String>,
}

impl MailStrategy {
    /// Create a mail strategy sending as `from`
    pub fn new(carrier: MailCarrier, from: MailAddress) -> Self {
        Self {
            carrier,
            from,
            reply_to: None,
            return_path: None,
            attachments: Vec::new(),
            to: None,
            subject: None,
            message: None,
        }
    }

    pub fn set_carrier(&mut self, carrier: MailCarrier) {
        self.carrier = carrier;
    }

    pub fn carrier(&self) -> &MailCarrier {
        &self.carrier
    }

    /// Set sender (only one address is supported)
    pub fn set_from(&mut self, mail: impl Into<String>, name: impl Into<String>) {
        self.from = MailAddress::new(mail, name);
    }

    pub fn set_reply_to(&mut self, mail: impl Into<String>, name: impl Into<String>) {
        self.reply_to = Some(MailAddress::new(mail, name));
    }

    /// Set where bounces should go
    pub fn set_return_path(&mut self, mail: impl Into<String>, name: impl Into<String>) {
        self.return_path = Some(MailAddress::new(mail, name));
    }

    /// Attach a file to every mail sent through this strategy
    pub fn attach(
        &mut self,
        data: impl Into<Vec<u8>>,
        filename: impl Into<String>,
        content_type: impl Into<String>,
    ) {
        self.attachments.push(Attachment {
            data: data.into(),
            filename: filename.into(),
            content_type: content_type.into(),
        });
    }

    fn compose(&self) -> Result<MailMessage, ContractError> {
        let to = self.to.clone().ok_or(ContractError::unbound("target"))?;
        let subject = self.subject.clone().ok_or(ContractError::unbound("title"))?;
        let html = self.message.as_deref().ok_or(ContractError::unbound("message"))?;

        Ok(MailMessage {
            subject,
            from: self.from.clone(),
            to,
            reply_to: self.reply_to.clone(),
            return_path: self.return_path.clone(),
            text_body: strip_tags(html),
            html_body: html.to_string(),
            attachments: self.attachments.clone(),
        })
    }
}

impl Strategy for MailStrategy {
    fn channel_type(&self) -> &str {
        "mail"
    }

    fn set_target(&mut self, target: &dyn Target) -> bool {
        let mail = target.mail();
        if mail.is_empty() {
            return false;
        }
        self.to = Some(MailAddress::new(mail, target.name()));
        true
    }

    fn set_title(&mut self, title: &str) {
        self.subject = Some(title.to_string());
    }

    fn set_message(&mut self, message: &str) {
        self.message = Some(message.to_string());
    }

    fn addressee(&self) -> Result<String, ContractError> {
        let to = self.to.as_ref().ok_or(ContractError::unbound("target"))?;
        Ok(format!("{} <{}>", to.name, to.address))
    }

    fn cost(&self) -> f64 {
        0.0
    }

    fn clear(&mut self) {
        self.to = None;
        self.subject = None;
        self.message = None;
    }

    #[instrument(name = "mail_strategy_send", skip(self), fields(carrier = %self.carrier.name()))]
    fn send(&mut self) -> Result<(), ContractError> {
        let mail = self.compose()?;
        self.carrier.send(&mail, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::carriers::Mailbox;
    use contracts::Recipient;

    fn strategy() -> (MailStrategy, Arc<Mailbox<MailMessage>>) {
        let mailbox: Arc<Mailbox<MailMessage>> = Arc::new(Mailbox::new("mail"));
        let carrier: MailCarrier = mailbox.clone();
        let strategy = MailStrategy::new(carrier, MailAddress::new("noreply@x.com", "Courier"));
        (strategy, mailbox)
    }

    #[test]
    fn test_rejects_target_without_mail() {
        let (mut s, _) = strategy();
        assert!(!s.set_target(&Recipient::named("B").with_mobile("070")));
        assert!(matches!(s.addressee(), Err(ContractError::Unbound { .. })));
    }

    #[test]
    fn test_addressee_format() {
        let (mut s, _) = strategy();
        assert!(s.set_target(&Recipient::named("A").with_mail("a@x.com")));
        assert_eq!(s.addressee().unwrap(), "A <a@x.com>");
        assert_eq!(s.cost(), 0.0);
    }

    #[test]
    fn test_send_composes_mail() {
        let (mut s, mailbox) = strategy();
        s.set_reply_to("reply@x.com", "");
        s.attach(b"data".to_vec(), "a.txt", "text/plain");
        s.set_target(&Recipient::named("A").with_mail("a@x.com"));
        s.set_message("<p>Hello A</p>");
        s.set_title("Reminder");
        s.send().unwrap();

        let mail = mailbox.fetch().unwrap();
        assert_eq!(mail.subject, "Reminder");
        assert_eq!(mail.to, MailAddress::new("a@x.com", "A"));
        assert_eq!(mail.from.name, "Courier");
        assert_eq!(mail.text_body, "Hello A");
        assert_eq!(mail.html_body, "<p>Hello A</p>");
        assert_eq!(mail.reply_to.unwrap().address, "reply@x.com");
        assert_eq!(mail.attachments.len(), 1);
    }

    #[test]
    fn test_send_unbound_fails() {
        let (mut s, mailbox) = strategy();
        s.set_target(&Recipient::named("A").with_mail("a@x.com"));
        assert!(matches!(s.send(), Err(ContractError::Unbound { .. })));
        assert!(mailbox.is_empty());
    }

    #[test]
    fn test_clear_unbinds() {
        let (mut s, _) = strategy();
        s.set_target(&Recipient::named("A").with_mail("a@x.com"));
        s.clear();
        assert!(s.addressee().is_err());
    }
}
