//! 配置校验模块
//!
//! 校验规则：
//! - 字段级规则 (validator derive)：title/body 非空、邮箱格式、至少一个 channel、unit_cost >= 0
//! - mail channel 必须配置 from
//! - spool carrier 必须配置 spool_dir
//! - smtp carrier 只能用于 mail channel
//! - 模板 body 可编译

use contracts::{CampaignBlueprint, CarrierKind, ChannelKind, ContractError};
use templating::JinjaTemplate;
use validator::{Validate, ValidationErrors, ValidationErrorsKind};

/// 校验 CampaignBlueprint 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(blueprint: &CampaignBlueprint) -> Result<(), ContractError> {
    validate_fields(blueprint)?;
    validate_template(blueprint)?;
    validate_channels(blueprint)?;
    Ok(())
}

/// 字段级校验
fn validate_fields(blueprint: &CampaignBlueprint) -> Result<(), ContractError> {
    blueprint.validate().map_err(|errors| {
        let (field, message) = first_violation(&errors, "")
            .unwrap_or_else(|| (String::from("<root>"), errors.to_string()));
        ContractError::config_validation(field, message)
    })
}

/// 取第一个字段错误 (按字段名排序，保证输出稳定)
fn first_violation(errors: &ValidationErrors, prefix: &str) -> Option<(String, String)> {
    let mut fields: Vec<_> = errors.errors().iter().collect();
    fields.sort_by(|a, b| a.0.cmp(b.0));

    fields.into_iter().find_map(|(field, kind)| {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{prefix}.{field}")
        };
        match kind {
            ValidationErrorsKind::Field(errs) => errs.first().map(|e| {
                let message = e
                    .message
                    .as_ref()
                    .map_or_else(|| format!("invalid {}", e.code), |m| m.to_string());
                (path, message)
            }),
            ValidationErrorsKind::Struct(inner) => first_violation(inner, &path),
            ValidationErrorsKind::List(items) => items
                .iter()
                .find_map(|(idx, inner)| first_violation(inner, &format!("{path}[{idx}]"))),
        }
    })
}

/// 校验模板可编译
fn validate_template(blueprint: &CampaignBlueprint) -> Result<(), ContractError> {
    let template = &blueprint.template;
    if !JinjaTemplate::is_valid(&template.body) {
        return Err(ContractError::config_validation(
            "template.body",
            "template body does not compile",
        ));
    }
    Ok(())
}

/// 校验 channel 必填字段
fn validate_channels(blueprint: &CampaignBlueprint) -> Result<(), ContractError> {
    for (idx, channel) in blueprint.channels.iter().enumerate() {
        if channel.kind == ChannelKind::Mail && channel.from.is_none() {
            return Err(ContractError::config_validation(
                format!("channels[{idx}].from"),
                "mail channel requires a sender address",
            ));
        }
        if channel.carrier == CarrierKind::Smtp && channel.kind != ChannelKind::Mail {
            return Err(ContractError::config_validation(
                format!("channels[{idx}].carrier"),
                "smtp carrier only delivers mail",
            ));
        }
        if channel.carrier == CarrierKind::Spool && channel.spool_dir.is_none() {
            return Err(ContractError::config_validation(
                format!("channels[{idx}].spool_dir"),
                "spool carrier requires spool_dir",
            ));
        }
    }
    Ok(())
}
