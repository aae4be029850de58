//! Dispatcher error types

use contracts::ContractError;
use thiserror::Error;

/// Dispatcher-specific errors
///
/// `Batch` is the only error produced by delivery itself; every other variant
/// is a setup or precondition failure and never enters the report.
#[derive(Debug, Error)]
pub enum DispatcherError {
    /// Dispatch attempted before a template was set
    #[error("no template set, call set_template() before dispatching")]
    MissingTemplate,

    /// A strategy accepted a target but could not describe the addressee
    #[error("strategy '{channel}' accepted target '{target}' without binding it: {source}")]
    Precondition {
        channel: String,
        target: String,
        #[source]
        source: ContractError,
    },

    /// Aggregate failure of a loud batch
    #[error("Some or all connections were not sent")]
    Batch { errors: Vec<String> },

    /// Channel creation error
    #[error("failed to create channel '{name}': {message}")]
    ChannelCreation { name: String, message: String },

    /// Contract error (template, config)
    #[error(transparent)]
    Contract(#[from] ContractError),
}

impl DispatcherError {
    /// Create a channel creation error
    pub fn channel_creation(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ChannelCreation {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Error strings carried by a batch failure, empty for other variants
    pub fn errors(&self) -> &[String] {
        match self {
            Self::Batch { errors } => errors,
            _ => &[],
        }
    }
}
