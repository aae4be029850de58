//! # Config Loader
//!
//! Configuration loading and parsing module.
//!
//! Responsibilities:
//! - Parse TOML/JSON campaign files
//! - Resolve `template.body_file` and relative `spool_dir` against the
//!   campaign file's directory
//! - Validate the campaign
//! - Generate `CampaignBlueprint`
//!
//! # Example
//!
//! ```no_run
//! use config_loader::ConfigLoader;
//! use std::path::Path;
//!
//! let blueprint = ConfigLoader::load_from_path(Path::new("campaign.toml")).unwrap();
//! println!("Recipients: {}", blueprint.recipients.len());
//! ```

mod parser;
mod validator;

pub use contracts::CampaignBlueprint;
pub use parser::ConfigFormat;

use contracts::ContractError;
use std::path::Path;
use tracing::{debug, instrument};

/// Configuration loader
///
/// Provides static methods to load configuration from files or strings.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load a campaign file
    ///
    /// Detects the format from the extension (.toml / .json). Relative paths
    /// inside the campaign are resolved against the file's directory.
    ///
    /// # Errors
    /// - File read failure
    /// - Unsupported format
    /// - Parse failure
    /// - Template body file unreadable
    /// - Validation failure
    pub fn load_from_path(path: &Path) -> Result<CampaignBlueprint, ContractError> {
        let format = Self::detect_format(path)?;
        let content = Self::read_file(path)?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        Self::parse_and_validate(&content, format, base_dir)
    }

    /// Load a campaign from a string
    ///
    /// Relative paths are resolved against the working directory.
    ///
    /// # Errors
    /// - Parse failure
    /// - Template body file unreadable
    /// - Validation failure
    pub fn load_from_str(
        content: &str,
        format: ConfigFormat,
    ) -> Result<CampaignBlueprint, ContractError> {
        Self::parse_and_validate(content, format, Path::new("."))
    }

    /// Serialize CampaignBlueprint to TOML string
    pub fn to_toml(blueprint: &CampaignBlueprint) -> Result<String, ContractError> {
        toml::to_string_pretty(blueprint)
            .map_err(|e| ContractError::config_parse(format!("TOML serialize error: {e}")))
    }

    /// Serialize CampaignBlueprint to JSON string
    pub fn to_json(blueprint: &CampaignBlueprint) -> Result<String, ContractError> {
        serde_json::to_string_pretty(blueprint)
            .map_err(|e| ContractError::config_parse(format!("JSON serialize error: {e}")))
    }
}

impl ConfigLoader {
    /// Infer configuration format from file extension
    fn detect_format(path: &Path) -> Result<ConfigFormat, ContractError> {
        let ext = path.extension().and_then(|e| e.to_str()).ok_or_else(|| {
            ContractError::config_parse("cannot determine file format from extension")
        })?;

        ConfigFormat::from_extension(ext).ok_or_else(|| {
            ContractError::config_parse(format!("unsupported config format: .{ext}"))
        })
    }

    /// Read configuration file content
    fn read_file(path: &Path) -> Result<String, ContractError> {
        Ok(std::fs::read_to_string(path)?)
    }

    /// Parse and validate configuration content
    #[instrument(name = "config_parse_and_validate", skip(content))]
    fn parse_and_validate(
        content: &str,
        format: ConfigFormat,
        base_dir: &Path,
    ) -> Result<CampaignBlueprint, ContractError> {
        let mut blueprint = parser::parse(content, format)?;
        parser::resolve_paths(&mut blueprint, base_dir)?;
        validator::validate(&blueprint)?;
        debug!(
            recipients = blueprint.recipients.len(),
            channels = blueprint.channels.len(),
            "Campaign config loaded"
        );
        Ok(blueprint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const MINIMAL_TOML: &str = r#"
[template]
title = "Reminder"
body = "Hello {{ target.name }}"

[[recipients]]
name = "A"
mail = "a@x.com"

[[recipients]]
name = "B"
mobile = "070"

[[channels]]
kind = "mail"
from = "noreply@x.com"

[[channels]]
kind = "sms"
"#;

    #[test]
    fn test_load_from_str_toml() {
        let result = ConfigLoader::load_from_str(MINIMAL_TOML, ConfigFormat::Toml);
        assert!(result.is_ok(), "Failed: {:?}", result.err());
        let bp = result.unwrap();
        assert_eq!(bp.template.title, "Reminder");
        assert_eq!(bp.channels.len(), 2);
    }

    #[test]
    fn test_round_trip_toml() {
        let bp = ConfigLoader::load_from_str(MINIMAL_TOML, ConfigFormat::Toml).unwrap();
        let serialized = ConfigLoader::to_toml(&bp).unwrap();
        let bp2 = ConfigLoader::load_from_str(&serialized, ConfigFormat::Toml).unwrap();
        assert_eq!(bp.template.body, bp2.template.body);
        assert_eq!(bp.recipients, bp2.recipients);
        assert_eq!(bp.channels[0].from, bp2.channels[0].from);
    }

    #[test]
    fn test_round_trip_json() {
        let bp = ConfigLoader::load_from_str(MINIMAL_TOML, ConfigFormat::Toml).unwrap();
        let json = ConfigLoader::to_json(&bp).unwrap();
        let bp2 = ConfigLoader::load_from_str(&json, ConfigFormat::Json).unwrap();
        assert_eq!(bp.recipients, bp2.recipients);
    }

    #[test]
    fn test_validation_runs_after_parse() {
        let content = r#"
[template]
title = "Reminder"
body = "Hello"

[[channels]]
kind = "mail"
"#;
        let result = ConfigLoader::load_from_str(content, ConfigFormat::Toml);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("channels[0].from"));
    }

    #[test]
    fn test_load_from_path() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(MINIMAL_TOML.as_bytes()).unwrap();

        let bp = ConfigLoader::load_from_path(file.path()).unwrap();
        assert_eq!(bp.recipients.len(), 2);
    }

    #[test]
    fn test_load_from_path_anchors_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("body.j2"), "Hi {{ target.name }}").unwrap();
        let campaign = dir.path().join("campaign.toml");
        std::fs::write(
            &campaign,
            r#"
[template]
title = "Reminder"
body_file = "body.j2"

[[channels]]
kind = "pdf"
carrier = "spool"
spool_dir = "letters"
"#,
        )
        .unwrap();

        let bp = ConfigLoader::load_from_path(&campaign).unwrap();
        assert_eq!(bp.template.body, "Hi {{ target.name }}");
        assert_eq!(bp.channels[0].spool_dir, Some(dir.path().join("letters")));

        // Resolved campaigns serialize without the include
        let toml = ConfigLoader::to_toml(&bp).unwrap();
        assert!(!toml.contains("body_file"));
    }

    #[test]
    fn test_load_from_path_unsupported_extension() {
        let file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        let err = ConfigLoader::load_from_path(file.path()).unwrap_err();
        assert!(err.to_string().contains("unsupported config format"));
    }
}
