//! Strategy implementations
//!
//! Contains MailStrategy, SmsStrategy, PdfStrategy and the `Channel` enum
//! tying them together.

mod factory;
mod mail;
mod pdf;
mod sms;

use contracts::{ContractError, Strategy, Target};

pub use self::factory::{ChannelFactory, Mailboxes};
pub use self::mail::{MailCarrier, MailStrategy};
pub use self::pdf::{PdfStrategy, PrintCarrier, PAGE_HEADER};
pub use self::sms::{SmsCarrier, SmsStrategy, DEFAULT_UNIT_COST, SMS_UNIT_LEN};

/// Closed set of bundled channels
#[derive(Clone)]
pub enum Channel {
    Mail(MailStrategy),
    Sms(SmsStrategy),
    Pdf(PdfStrategy),
}

macro_rules! delegate {
    ($self:ident, $s:ident => $body:expr) => {
        match $self {
            Channel::Mail($s) => $body,
            Channel::Sms($s) => $body,
            Channel::Pdf($s) => $body,
        }
    };
}

impl Strategy for Channel {
    fn channel_type(&self) -> &str {
        delegate!(self, s => s.channel_type())
    }

    fn set_target(&mut self, target: &dyn Target) -> bool {
        delegate!(self, s => s.set_target(target))
    }

    fn set_title(&mut self, title: &str) {
        delegate!(self, s => s.set_title(title))
    }

    fn set_message(&mut self, message: &str) {
        delegate!(self, s => s.set_message(message))
    }

    fn addressee(&self) -> Result<String, ContractError> {
        delegate!(self, s => s.addressee())
    }

    fn cost(&self) -> f64 {
        delegate!(self, s => s.cost())
    }

    fn clear(&mut self) {
        delegate!(self, s => s.clear())
    }

    fn send(&mut self) -> Result<(), ContractError> {
        delegate!(self, s => s.send())
    }
}

impl From<MailStrategy> for Channel {
    fn from(s: MailStrategy) -> Self {
        Self::Mail(s)
    }
}

impl From<SmsStrategy> for Channel {
    fn from(s: SmsStrategy) -> Self {
        Self::Sms(s)
    }
}

impl From<PdfStrategy> for Channel {
    fn from(s: PdfStrategy) -> Self {
        Self::Pdf(s)
    }
}
