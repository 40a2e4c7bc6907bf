//! Engine configuration: starting values, era lengths and crisis tuning.
use serde::{Deserialize, Serialize};

use crate::constants::{DAYS_PER_MONTH, DEFAULT_EXPIRY_PENALTY, START_MONTH, START_YEAR};
use crate::indicators::{BlocRelationships, Indicators};
use crate::phase::PhaseSchedule;

/// Values a fresh or reset game starts from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StartingValues {
    pub month: u8,
    pub year: i32,
    #[serde(default)]
    pub indicators: Indicators,
    #[serde(default)]
    pub relationships: BlocRelationships,
}

impl Default for StartingValues {
    fn default() -> Self {
        Self {
            month: START_MONTH,
            year: START_YEAR,
            indicators: Indicators::default(),
            relationships: BlocRelationships::default(),
        }
    }
}

/// Top-level engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub start: StartingValues,
    #[serde(default)]
    pub phases: PhaseSchedule,
    #[serde(default = "default_days_per_month")]
    pub days_per_month: u32,
    /// Applied to public confidence when an expiring crisis has no failure table
    /// and no "no response" option.
    #[serde(default = "default_expiry_penalty")]
    pub default_expiry_penalty: f32,
}

const fn default_days_per_month() -> u32 {
    DAYS_PER_MONTH
}

const fn default_expiry_penalty() -> f32 {
    DEFAULT_EXPIRY_PENALTY
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            start: StartingValues::default(),
            phases: PhaseSchedule::default(),
            days_per_month: DAYS_PER_MONTH,
            default_expiry_penalty: DEFAULT_EXPIRY_PENALTY,
        }
    }
}

impl EngineConfig {
    /// Parse configuration from JSON; absent sections fall back to defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
