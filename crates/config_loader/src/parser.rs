//! 配置解析模块
//!
//! 支持 TOML (主要) 和 JSON (可选) 格式。

use std::path::Path;

use contracts::{CampaignBlueprint, ContractError};
use tracing::debug;

/// 配置文件格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML 格式 (推荐)
    Toml,
    /// JSON 格式
    Json,
}

impl ConfigFormat {
    /// 从文件扩展名推断格式
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// 解析 TOML 格式配置
pub fn parse_toml(content: &str) -> Result<CampaignBlueprint, ContractError> {
    toml::from_str(content).map_err(|e| ContractError::ConfigParse {
        message: format!("TOML parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// 解析 JSON 格式配置
pub fn parse_json(content: &str) -> Result<CampaignBlueprint, ContractError> {
    serde_json::from_str(content).map_err(|e| ContractError::ConfigParse {
        message: format!("JSON parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// 根据格式解析配置
pub fn parse(content: &str, format: ConfigFormat) -> Result<CampaignBlueprint, ContractError> {
    match format {
        ConfigFormat::Toml => parse_toml(content),
        ConfigFormat::Json => parse_json(content),
    }
}

/// 以配置文件所在目录为基准解析相对路径
///
/// - `template.body_file` 读入 `template.body`，与 `body` 互斥
/// - 相对的 `spool_dir` 改为基于 `base_dir`
pub fn resolve_paths(
    blueprint: &mut CampaignBlueprint,
    base_dir: &Path,
) -> Result<(), ContractError> {
    if let Some(file) = blueprint.template.body_file.take() {
        if !blueprint.template.body.is_empty() {
            return Err(ContractError::config_validation(
                "template.body_file",
                "set either template.body or template.body_file",
            ));
        }
        let path = base_dir.join(&file);
        blueprint.template.body = std::fs::read_to_string(&path).map_err(|e| {
            ContractError::config_validation(
                "template.body_file",
                format!("cannot read {}: {e}", path.display()),
            )
        })?;
        debug!(path = %path.display(), "Template body loaded from file");
    }

    for channel in &mut blueprint.channels {
        if let Some(dir) = channel.spool_dir.as_mut().filter(|d| d.is_relative()) {
            *dir = base_dir.join(&*dir);
        }
    }
    Ok(())
}
