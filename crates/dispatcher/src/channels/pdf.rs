//! PdfStrategy - printable documents for postal delivery

use contracts::{Carrier, ContractError, PrintDocument, Strategy, Target};
use std::sync::Arc;
use tracing::instrument;

/// Page header placed on every document
pub const PAGE_HEADER: &str = "[page]([topage])";

/// Print transport, usually a [`Mailbox`](crate::carriers::Mailbox)
pub type PrintCarrier = Arc<dyn Carrier<PrintDocument>>;

/// Print channel
///
/// Accepts a target iff its postal address is non-empty. Neither title nor
/// address is rendered; printing the address is up to the template.
#[derive(Clone)]
pub struct PdfStrategy {
    carrier: PrintCarrier,
    addressee: Option<String>,
    message: Option<String>,
}

impl PdfStrategy {
    pub fn new(carrier: PrintCarrier) -> Self {
        Self {
            carrier,
            addressee: None,
            message: None,
        }
    }

    pub fn set_carrier(&mut self, carrier: PrintCarrier) {
        self.carrier = carrier;
    }

    pub fn carrier(&self) -> &PrintCarrier {
        &self.carrier
    }
}

impl Strategy for PdfStrategy {
    fn channel_type(&self) -> &str {
        "pdf"
    }

    fn set_target(&mut self, target: &dyn Target) -> bool {
        if target.address().is_empty() {
            return false;
        }
        self.addressee = Some(target.name().to_string());
        true
    }

    fn set_title(&mut self, _title: &str) {}

    fn set_message(&mut self, message: &str) {
        self.message = Some(message.to_string());
    }

    fn addressee(&self) -> Result<String, ContractError> {
        self.addressee.clone().ok_or(ContractError::unbound("target"))
    }

    fn cost(&self) -> f64 {
        0.0
    }

    fn clear(&mut self) {
        self.addressee = None;
        self.message = None;
    }

    #[instrument(name = "pdf_strategy_send", skip(self), fields(carrier = %self.carrier.name()))]
    fn send(&mut self) -> Result<(), ContractError> {
        let body = self.message.clone().ok_or(ContractError::unbound("message"))?;
        let doc = PrintDocument {
            addressee: self.addressee()?,
            header: PAGE_HEADER.to_string(),
            body,
        };
        self.carrier.send(&doc, None)
    }
}
