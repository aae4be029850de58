//! Campaign orchestration module.

mod runner;
mod stats;

pub use runner::{load_blueprint, Campaign, CampaignConfig, CampaignOutcome};
pub use stats::BatchStats;
