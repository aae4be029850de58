//! # Templating
//!
//! MiniJinja-backed message templates.
//!
//! The body is compiled once on construction, so syntax errors surface before
//! any target is processed. Rendering is sandboxed by the engine itself: only
//! the values handed in the render context are reachable from the template.
//!
//! # Example
//!
//! ```
//! use contracts::{Template, TemplateValues};
//! use templating::JinjaTemplate;
//!
//! let tmpl = JinjaTemplate::new("Reminder", "Hello {{ target.name }}").unwrap();
//! let mut values = TemplateValues::new();
//! values.insert("target".into(), serde_json::json!({ "name": "A" }));
//! assert_eq!(tmpl.compile(&values).unwrap(), "Hello A");
//! assert_eq!(tmpl.title(), "Reminder");
//! ```

use contracts::{ContractError, Template, TemplateValues};
use minijinja::{AutoEscape, Environment, UndefinedBehavior};
use tracing::{debug, instrument};

const BODY: &str = "body";

/// Message template with a title and a Jinja-style body
pub struct JinjaTemplate {
    title: String,
    env: Environment<'static>,
}

impl JinjaTemplate {
    /// Compile `source` as a plain-text template
    ///
    /// # Errors
    /// `ContractError::Render` if the source does not parse
    pub fn new(title: impl Into<String>, source: impl Into<String>) -> Result<Self, ContractError> {
        Self::build(title.into(), source.into(), false)
    }

    /// Compile `source` with HTML auto-escaping of interpolated values
    pub fn html(title: impl Into<String>, source: impl Into<String>) -> Result<Self, ContractError> {
        Self::build(title.into(), source.into(), true)
    }

    /// Fail rendering on undefined variables instead of printing nothing
    pub fn strict(mut self) -> Self {
        self.env.set_undefined_behavior(UndefinedBehavior::Strict);
        self
    }

    /// Check template syntax without keeping the compiled result
    pub fn is_valid(source: &str) -> bool {
        Environment::new().template_from_str(source).is_ok()
    }

    fn build(title: String, source: String, html_escape: bool) -> Result<Self, ContractError> {
        let mut env = Environment::new();
        env.set_auto_escape_callback(move |_: &str| {
            if html_escape {
                AutoEscape::Html
            } else {
                AutoEscape::None
            }
        });
        env.add_template_owned(BODY, source)
            .map_err(|e| ContractError::render(e.to_string()))?;

        debug!(title = %title, html_escape, "Template compiled");
        Ok(Self { title, env })
    }
}

impl Template for JinjaTemplate {
    #[instrument(name = "template_compile", skip(self, values), fields(title = %self.title))]
    fn compile(&self, values: &TemplateValues) -> Result<String, ContractError> {
        let tmpl = self
            .env
            .get_template(BODY)
            .map_err(|e| ContractError::render(e.to_string()))?;
        tmpl.render(values)
            .map_err(|e| ContractError::render(e.to_string()))
    }

    fn title(&self) -> &str {
        &self.title
    }
}
