//! Strategy trait - channel handler contract
//!
//! A configured strategy is a prototype. The dispatcher never mutates it;
//! for every target it clones the prototype, offers the target to the clone
//! and keeps the clone as a connection when the target is accepted.

use crate::{ContractError, Target};

/// Delivery channel handler (mail, sms, print, ...)
///
/// # Binding sequence
///
/// 1. `set_target` returns `true` and captures addressing state
/// 2. `set_message`
/// 3. `set_title`
///
/// Only a strategy that went through this sequence may be sent. Clones must
/// not share mutable channel state, so that two connections built from one
/// prototype can be delivered independently.
pub trait Strategy: Clone + Send + 'static {
    /// Channel type label (used in logging and reports)
    fn channel_type(&self) -> &str;

    /// Inspect the target and capture addressing state if applicable
    ///
    /// Returns `false` without retaining any state when the channel cannot
    /// reach the target.
    fn set_target(&mut self, target: &dyn Target) -> bool;

    /// Bind rendered title; channels without a title ignore it
    fn set_title(&mut self, title: &str);

    /// Bind rendered message
    fn set_message(&mut self, message: &str);

    /// Human-readable recipient descriptor
    ///
    /// # Errors
    /// `ContractError::Unbound` if no target was accepted
    fn addressee(&self) -> Result<String, ContractError>;

    /// Cost estimate for sending the bound message
    ///
    /// Must be side-effect free and stable between prepare and send.
    fn cost(&self) -> f64;

    /// Reset to an unbound state for reuse
    fn clear(&mut self);

    /// Deliver through the bound carrier
    ///
    /// # Errors
    /// `ContractError::Delivery` when the carrier rejects the payload,
    /// `ContractError::Unbound` when the binding sequence was skipped
    fn send(&mut self) -> Result<(), ContractError>;
}
