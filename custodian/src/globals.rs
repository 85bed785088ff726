//! Per-tenant singleton: configuration, period timestamps, flags and vote totals.

use crate::budget::BudgetSettings;
use crate::config::ElectionConfig;
use dac_types::Timestamp;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DacGlobals {
    pub config: ElectionConfig,
    #[serde(default)]
    pub budget: BudgetSettings,
    #[serde(default)]
    pub lastperiodtime: Timestamp,
    /// Set while a selected custodian set waits to be seated.
    #[serde(default)]
    pub pending_period_time: Option<Timestamp>,
    #[serde(default)]
    pub lastclaimbudgettime: Timestamp,
    #[serde(default)]
    pub maintenance_mode: bool,
    #[serde(default)]
    pub requires_whitelist: bool,
    #[serde(default)]
    pub met_initial_votes_threshold: bool,
    #[serde(default)]
    pub number_active_candidates: u32,
    /// Sum of `weight_quorum` over voters with a vote.
    #[serde(default)]
    pub total_weight_of_votes: i64,
    /// Number of (voter, candidate) links.
    #[serde(default)]
    pub total_votes_on_candidates: i64,
}

impl DacGlobals {
    pub fn new(config: ElectionConfig) -> Self {
        Self {
            config,
            budget: BudgetSettings::default(),
            lastperiodtime: Timestamp::EPOCH,
            pending_period_time: None,
            lastclaimbudgettime: Timestamp::EPOCH,
            maintenance_mode: false,
            requires_whitelist: false,
            met_initial_votes_threshold: false,
            number_active_candidates: 0,
            total_weight_of_votes: 0,
            total_votes_on_candidates: 0,
        }
    }

    pub fn period_is_pending(&self) -> bool {
        self.pending_period_time.is_some()
    }
}
