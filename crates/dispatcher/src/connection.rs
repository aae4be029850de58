//! Connection - a strategy bound to exactly one target

use std::fmt::Display;

use contracts::{ContractError, Strategy, Target};
use tracing::{debug, instrument, warn};

/// Outcome of one delivery attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// Log line for a delivered message
    Sent(String),
    /// Error line for a failed delivery
    Failed(String),
}

impl Delivery {
    /// Error line for `addressee` on `channel`
    pub fn failed(error: impl Display, addressee: &str, channel: &str) -> Self {
        Self::Failed(format!("'{error}' for '{addressee}' using '{channel}'"))
    }
}

/// Strategy copy bound to one target, message and title
///
/// Only produced by [`Connection::bind`], so every connection went through
/// the full binding sequence and owns its channel state.
#[derive(Clone)]
pub struct Connection<S> {
    strategy: S,
    target_name: String,
    addressee: String,
    channel_type: String,
}

impl<S: Strategy> Connection<S> {
    /// Offer `target` to a fresh copy of `prototype`
    ///
    /// Returns `Ok(None)` if the strategy does not accept the target; the
    /// prototype itself is never touched.
    ///
    /// # Errors
    /// The strategy accepted the target but cannot describe the addressee
    #[instrument(
        name = "connection_bind",
        skip(prototype, target, message, title),
        fields(channel = %prototype.channel_type(), target = %target.name())
    )]
    pub fn bind(
        prototype: &S,
        target: &dyn Target,
        message: &str,
        title: &str,
    ) -> Result<Option<Self>, ContractError> {
        let mut strategy = prototype.clone();
        strategy.clear();
        if !strategy.set_target(target) {
            return Ok(None);
        }
        strategy.set_message(message);
        strategy.set_title(title);

        let addressee = strategy.addressee()?;
        let channel_type = strategy.channel_type().to_string();
        debug!(addressee = %addressee, "Connection bound");

        Ok(Some(Self {
            strategy,
            target_name: target.name().to_string(),
            addressee,
            channel_type,
        }))
    }

    /// Attempt delivery once
    ///
    /// Carrier and transport failures become an error line and never
    /// propagate.
    ///
    /// # Errors
    /// The strategy reported missing bound state, which binding rules out
    pub fn deliver(&mut self) -> Result<Delivery, ContractError> {
        match self.strategy.send() {
            Ok(()) => {
                debug!(addressee = %self.addressee, channel = %self.channel_type, "Message sent");
                Ok(Delivery::Sent(format!(
                    "Message sent to '{}' using '{}'",
                    self.addressee, self.channel_type
                )))
            }
            Err(e) if e.is_delivery() => {
                warn!(
                    addressee = %self.addressee,
                    channel = %self.channel_type,
                    error = %e,
                    "Delivery failed"
                );
                Ok(Delivery::failed(&e, &self.addressee, &self.channel_type))
            }
            Err(e) => Err(e),
        }
    }

    pub fn cost(&self) -> f64 {
        self.strategy.cost()
    }

    pub fn addressee(&self) -> &str {
        &self.addressee
    }

    pub fn channel_type(&self) -> &str {
        &self.channel_type
    }

    /// Name of the target this connection was bound to
    pub fn target_name(&self) -> &str {
        &self.target_name
    }

    pub fn strategy(&self) -> &S {
        &self.strategy
    }
}
