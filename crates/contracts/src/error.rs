//! Layered error definitions
//!
//! Categorized by source: config / render / delivery / binding

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Render Errors =====
    /// Template engine rejected the source or the values
    #[error("render error: {message}")]
    Render { message: String },

    // ===== Delivery Errors =====
    /// Carrier rejected the payload or the transport failed
    #[error("{message}")]
    Delivery { carrier: String, message: String },

    // ===== Binding Errors =====
    /// Strategy used before the named state was bound
    #[error("strategy not bound: {field} missing")]
    Unbound { field: &'static str },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create render error
    pub fn render(message: impl Into<String>) -> Self {
        Self::Render {
            message: message.into(),
        }
    }

    /// Create delivery error
    pub fn delivery(carrier: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Delivery {
            carrier: carrier.into(),
            message: message.into(),
        }
    }

    /// Create unbound-state error
    pub fn unbound(field: &'static str) -> Self {
        Self::Unbound { field }
    }

    /// True for errors raised by a carrier or transport
    pub fn is_delivery(&self) -> bool {
        matches!(self, Self::Delivery { .. } | Self::Io(_))
    }
}
