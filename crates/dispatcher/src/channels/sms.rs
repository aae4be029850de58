//! SmsStrategy - single-line text messages

use contracts::{Carrier, ContractError, Strategy, Target};
use std::sync::Arc;
use tracing::instrument;

use crate::text::sms_text;

/// Default cost per SMS unit
pub const DEFAULT_UNIT_COST: f64 = 0.35;

/// Characters per SMS unit
pub const SMS_UNIT_LEN: usize = 160;

/// SMS transport: receives the text and the mobile number
pub type SmsCarrier = Arc<dyn Carrier<str>>;

/// SMS channel
///
/// Accepts a target iff its mobile number is non-empty. Titles are not
/// rendered.
#[derive(Clone)]
pub struct SmsStrategy {
    carrier: SmsCarrier,
    unit_cost: f64,
    number: Option<String>,
    name: String,
    message: Option<String>,
}

impl SmsStrategy {
    pub fn new(carrier: SmsCarrier) -> Self {
        Self {
            carrier,
            unit_cost: DEFAULT_UNIT_COST,
            number: None,
            name: String::new(),
            message: None,
        }
    }

    pub fn set_carrier(&mut self, carrier: SmsCarrier) {
        self.carrier = carrier;
    }

    pub fn carrier(&self) -> &SmsCarrier {
        &self.carrier
    }

    /// Set cost per SMS unit
    pub fn set_unit_cost(&mut self, cost: f64) {
        self.unit_cost = cost;
    }

    pub fn unit_cost(&self) -> f64 {
        self.unit_cost
    }
}

impl Strategy for SmsStrategy {
    fn channel_type(&self) -> &str {
        "sms"
    }

    fn set_target(&mut self, target: &dyn Target) -> bool {
        let mobile = target.mobile();
        if mobile.is_empty() {
            return false;
        }
        self.number = Some(mobile.to_string());
        self.name = target.name().to_string();
        true
    }

    fn set_title(&mut self, _title: &str) {}

    fn set_message(&mut self, message: &str) {
        self.message = Some(message.to_string());
    }

    fn addressee(&self) -> Result<String, ContractError> {
        let number = self.number.as_ref().ok_or(ContractError::unbound("target"))?;
        Ok(format!("{} <{}>", self.name, number))
    }

    /// Unit cost per started block of 160 bytes of the rendered message
    fn cost(&self) -> f64 {
        let len = self.message.as_ref().map_or(0, String::len);
        len.div_ceil(SMS_UNIT_LEN) as f64 * self.unit_cost
    }

    fn clear(&mut self) {
        self.number = None;
        self.name.clear();
        self.message = None;
    }

    #[instrument(name = "sms_strategy_send", skip(self), fields(carrier = %self.carrier.name()))]
    fn send(&mut self) -> Result<(), ContractError> {
        let message = self.message.as_deref().ok_or(ContractError::unbound("message"))?;
        let number = self.number.as_deref().ok_or(ContractError::unbound("target"))?;
        self.carrier.send(&sms_text(message), Some(number))
    }
}
