//! # Dispatcher
//!
//! 消息分发模块。
//!
//! 负责：
//! - 按模板为每个 target 渲染消息
//! - 按顺序匹配第一个接受 target 的 channel
//! - 逐个（或并发）投递 connection，汇总 cost / errors / success

pub mod carriers;
pub mod channels;
pub mod connection;
pub mod dispatcher;
pub mod error;
pub mod metrics;
mod text;

pub use carriers::{LogCarrier, Mailbox, SmtpCarrier, SmtpSettings, SpoolCarrier, PAGE_BREAK};
pub use channels::{
    Channel, ChannelFactory, MailCarrier, MailStrategy, Mailboxes, PdfStrategy, PrintCarrier,
    SmsCarrier, SmsStrategy,
};
pub use connection::{Connection, Delivery};
pub use contracts::{ErrorReporting, Report, Strategy, Target, Template};
pub use dispatcher::{create_channel, create_dispatcher, Dispatcher};
pub use error::DispatcherError;
pub use metrics::{DispatchMetrics, MetricsSnapshot};
