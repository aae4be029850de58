//! LogCarrier - logs delivery summaries via tracing

use contracts::{Carrier, ContractError};
use serde::Serialize;
use tracing::{debug, info, instrument};

/// Carrier that only logs what it is asked to deliver
pub struct LogCarrier {
    name: String,
}

impl LogCarrier {
    /// Create a new LogCarrier with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl<P> Carrier<P> for LogCarrier
where
    P: Serialize + ?Sized,
{
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(name = "log_carrier_send", skip(self, payload), fields(carrier = %self.name))]
    fn send(&self, payload: &P, address: Option<&str>) -> Result<(), ContractError> {
        let body = serde_json::to_string(payload)
            .map_err(|e| ContractError::delivery(&self.name, e.to_string()))?;

        info!(
            carrier = %self.name,
            address = address.unwrap_or("-"),
            bytes = body.len(),
            "Message delivered"
        );
        debug!(carrier = %self.name, payload = %body, "Payload");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::PrintDocument;

    #[test]
    fn test_log_carrier_accepts_text() {
        let carrier = LogCarrier::new("sms-log");
        let result = Carrier::<str>::send(&carrier, "Hello A", Some("070"));
        assert!(result.is_ok());
        assert_eq!(Carrier::<str>::name(&carrier), "sms-log");
    }

    #[test]
    fn test_log_carrier_accepts_documents() {
        let carrier = LogCarrier::new("print-log");
        let doc = PrintDocument {
            addressee: "A".into(),
            header: "[page]([topage])".into(),
            body: "Hello A".into(),
        };
        assert!(carrier.send(&doc, None).is_ok());
    }
}
