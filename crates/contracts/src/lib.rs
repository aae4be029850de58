//! # Contracts
//!
//! Frozen interface contracts shared by every courier crate: targets,
//! templates, strategies, carriers, payloads and the batch report.
//! All business crates can only depend on this crate, reverse dependencies are prohibited.
//!
//! ## Render context
//! - Global values are merged into every per-target context
//! - The key `target` is reserved: it is always overwritten with the current
//!   target, so a global value stored under `target` is silently shadowed

mod blueprint;
mod carrier;
mod error;
mod payload;
mod report;
mod strategy;
mod target;
mod template;

pub use blueprint::*;
pub use carrier::Carrier;
pub use error::*;
pub use payload::*;
pub use report::*;
pub use strategy::Strategy;
pub use target::{target_context, Recipient, Target};
pub use template::{Template, TemplateValues, TARGET_KEY};
