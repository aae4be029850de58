//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 合约快照测试
//! - 配置 -> 模板 -> 分发的 e2e 测试
//! - Loud / Silent 两种错误上报模式

#[cfg(test)]
mod contract_tests {
    use contracts::{ErrorReporting, Report};

    #[test]
    fn test_contracts_compile() {
        // 验证 contracts crate 可编译
        let _ = contracts::ConfigVersion::V1;
        assert_eq!(contracts::TARGET_KEY, "target");
    }

    #[test]
    fn test_report_snapshot() {
        let report = Report {
            cost: 0.35,
            errors: vec!["Unable to find communication strategy for target 'D'".into()],
            success: vec!["Message sent to 'B <070>' using 'sms'".into()],
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "cost": 0.35,
                "errors": ["Unable to find communication strategy for target 'D'"],
                "success": ["Message sent to 'B <070>' using 'sms'"],
            })
        );
    }

    #[test]
    fn test_reporting_serde_names() {
        let loud: ErrorReporting = serde_json::from_str("\"loud\"").unwrap();
        let silent: ErrorReporting = serde_json::from_str("\"silent\"").unwrap();
        assert_eq!(loud, ErrorReporting::Loud);
        assert_eq!(silent, ErrorReporting::Silent);
    }
}

#[cfg(test)]
mod e2e_tests {
    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{CampaignBlueprint, ErrorReporting, PrintDocument};
    use dispatcher::{create_dispatcher, ChannelFactory, DispatcherError, PAGE_BREAK};
    use observability::ReportAggregator;

    const SCENARIO: &str = r#"
[template]
title = "Reminder"
body = "Hello {{ target.name }}"

[[recipients]]
name = "A"
mail = "a@x.com"

[[recipients]]
name = "B"
mobile = "070"
mail = ""

[[channels]]
kind = "mail"
carrier = "mailbox"
from = "noreply@x.com"

[[channels]]
kind = "sms"
carrier = "mailbox"
"#;

    fn load(content: &str) -> CampaignBlueprint {
        ConfigLoader::load_from_str(content, ConfigFormat::Toml).unwrap()
    }

    /// End-to-end test: campaign file -> JinjaTemplate -> Dispatcher -> mailboxes
    ///
    /// 验证完整的数据流：
    /// 1. A 只有邮箱，匹配 mail
    /// 2. B 邮箱为空，mail 拒绝后匹配 sms
    /// 3. 两个 connection 均投递成功
    #[test]
    fn test_e2e_mail_then_sms() {
        let factory = ChannelFactory::new();
        let mut dispatcher = create_dispatcher(&load(SCENARIO), &factory).unwrap();

        dispatcher.prepare().unwrap();
        assert_eq!(dispatcher.connections().len(), 2);
        assert!(dispatcher.errors().is_empty());

        dispatcher.send().unwrap();

        let mail = factory.mailboxes().mail.fetch().unwrap();
        assert_eq!(mail.subject, "Reminder");
        assert_eq!(mail.to.address, "a@x.com");
        assert_eq!(mail.html_body, "Hello A");

        assert_eq!(factory.mailboxes().sms.fetch().unwrap(), "Hello B");

        let report = dispatcher.report().unwrap();
        assert_eq!(
            report.success,
            [
                "Message sent to 'A <a@x.com>' using 'mail'",
                "Message sent to 'B <070>' using 'sms'",
            ]
        );
        assert!((report.cost - 0.35).abs() < 1e-9);
    }

    #[test]
    fn test_e2e_no_channels_loud_and_silent() {
        let mut blueprint = load(SCENARIO);
        let factory = ChannelFactory::new();

        let mut loud = create_dispatcher(&blueprint, &factory).unwrap();
        loud.clear_strategies();
        match loud.send() {
            Err(DispatcherError::Batch { errors }) => assert_eq!(errors.len(), 2),
            other => panic!("expected batch failure, got {:?}", other.err()),
        }

        blueprint.reporting = ErrorReporting::Silent;
        let mut silent = create_dispatcher(&blueprint, &factory).unwrap();
        silent.clear_strategies();
        silent.send().unwrap();

        let report = silent.report().unwrap();
        assert_eq!(report.errors.len(), 2);
        assert!(report.success.is_empty());
    }

    #[test]
    fn test_e2e_globals_and_html_escape() {
        let content = r#"
reporting = "silent"

[template]
title = "Invoice"
body = "<p>{{ org }} greets {{ target.name }}</p>"
html_escape = true

[globals]
org = "ACME"
target = "shadowed"

[[recipients]]
name = "<C>"
address = "Main St 1"

[[channels]]
kind = "pdf"
carrier = "mailbox"
"#;
        let factory = ChannelFactory::new();
        let mut dispatcher = create_dispatcher(&load(content), &factory).unwrap();
        dispatcher.send().unwrap();

        let doc: PrintDocument = factory.mailboxes().print.snapshot().remove(0);
        assert_eq!(doc.addressee, "<C>");
        assert_eq!(doc.body, "<p>ACME greets &lt;C&gt;</p>");
    }

    #[test]
    fn test_e2e_pdf_merge() {
        let content = r#"
[template]
title = "Letter"
body = "Dear {{ target.name }}"

[[recipients]]
name = "C"
address = "Main St 1"

[[recipients]]
name = "E"
address = "Side St 2"

[[channels]]
kind = "pdf"
carrier = "mailbox"
"#;
        let factory = ChannelFactory::new();
        let mut dispatcher = create_dispatcher(&load(content), &factory).unwrap();
        dispatcher.send().unwrap();

        let merged = factory.mailboxes().print.fetch_all().unwrap();
        assert_eq!(merged, format!("Dear C{}Dear E", PAGE_BREAK));
        assert!(!factory.mailboxes().print.has_mail());
    }

    #[test]
    fn test_e2e_spool_carrier() {
        let dir = tempfile::tempdir().unwrap();
        let spool = dir.path().join("sms");
        let content = format!(
            r#"
[template]
title = "Reminder"
body = "Hello {{{{ target.name }}}}"

[[recipients]]
name = "B"
mobile = "070"

[[channels]]
kind = "sms"
carrier = "spool"
spool_dir = "{}"
"#,
            spool.display().to_string().replace('\\', "/")
        );

        let factory = ChannelFactory::new();
        let mut dispatcher = create_dispatcher(&load(&content), &factory).unwrap();
        dispatcher.send().unwrap();

        let written = std::fs::read_to_string(spool.join("000001.json")).unwrap();
        let entry: serde_json::Value = serde_json::from_str(&written).unwrap();
        assert_eq!(entry["address"], "070");
        assert_eq!(entry["payload"], "Hello B");
    }

    #[tokio::test]
    async fn test_e2e_concurrent_matches_sequential() {
        let blueprint = load(SCENARIO);

        let mut sequential = create_dispatcher(&blueprint, &ChannelFactory::new()).unwrap();
        sequential.send().unwrap();

        let mut concurrent = create_dispatcher(&blueprint, &ChannelFactory::new()).unwrap();
        concurrent.send_concurrent().await.unwrap();

        assert_eq!(
            sequential.report().unwrap(),
            concurrent.report().unwrap()
        );
    }

    #[test]
    fn test_e2e_repeated_batches_aggregate() {
        let factory = ChannelFactory::new();
        let mut dispatcher = create_dispatcher(&load(SCENARIO), &factory).unwrap();
        let mut aggregator = ReportAggregator::new();

        for _ in 0..3 {
            dispatcher.send().unwrap();
            aggregator.update(&dispatcher.report().unwrap());
        }

        assert_eq!(factory.mailboxes().mail.len(), 3);
        assert_eq!(dispatcher.log().len(), 6);
        assert_eq!(dispatcher.metrics().snapshot().connection_count, 2);
        assert_eq!(aggregator.total_batches, 3);
    }
}
