//! Carrier implementations
//!
//! Contains LogCarrier, SpoolCarrier, Mailbox and SmtpCarrier.

mod log;
mod mailbox;
mod smtp;
mod spool;

pub use self::log::LogCarrier;
pub use self::mailbox::{Mailbox, PAGE_BREAK};
pub use self::smtp::{
    SmtpCarrier, SmtpSettings, SMTP_HOST_ENV, SMTP_PASSWORD_ENV, SMTP_PORT_ENV, SMTP_TLS_ENV,
    SMTP_USER_ENV,
};
pub use self::spool::SpoolCarrier;
