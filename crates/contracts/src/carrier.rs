//! Carrier trait - low-level transport behind a strategy

use crate::ContractError;

/// Transport a strategy delegates raw delivery to
///
/// `P` is the payload type the transport understands: a composed
/// `MailMessage`, SMS text (`str`), a `PrintDocument`, ...
pub trait Carrier<P: ?Sized>: Send + Sync {
    /// Carrier name (used for logging)
    fn name(&self) -> &str;

    /// Attempt delivery
    ///
    /// `address` is `None` when addressing is embedded in the payload.
    ///
    /// # Errors
    /// Returns `ContractError::Delivery` when the payload is rejected or the
    /// transport fails
    fn send(&self, payload: &P, address: Option<&str>) -> Result<(), ContractError>;
}
