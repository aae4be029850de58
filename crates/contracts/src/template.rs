//! Template - message renderer contract

use serde_json::{Map, Value};

use crate::ContractError;

/// Render context: key/value pairs handed to the template engine
pub type TemplateValues = Map<String, Value>;

/// Reserved render key, always overwritten with the current target
pub const TARGET_KEY: &str = "target";

/// Message template
///
/// The dispatcher compiles one message per target. `title` must be available
/// whenever `compile` is.
pub trait Template: Send + Sync {
    /// Render the template using `values`
    ///
    /// # Errors
    /// Returns `ContractError::Render` when the engine rejects the input
    fn compile(&self, values: &TemplateValues) -> Result<String, ContractError>;

    /// Subject/headline of the rendered message
    fn title(&self) -> &str;
}
