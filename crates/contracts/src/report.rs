//! Report - dispatch batch output

use serde::{Deserialize, Serialize};

/// Whether a failed batch is raised or only recorded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorReporting {
    /// `send` returns an aggregate error when any error was recorded
    #[default]
    Loud,
    /// `send` never fails on soft errors; inspect the report instead
    Silent,
}

/// Aggregate result of a dispatch batch
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Report {
    /// Sum of every connection's cost
    pub cost: f64,
    /// Match, render and delivery failures
    pub errors: Vec<String>,
    /// One entry per delivered connection
    pub success: Vec<String>,
}

impl Report {
    /// True if nothing was recorded as failed
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}
