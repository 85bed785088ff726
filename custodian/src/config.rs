//! Election parameters and their validation rules.
//!
//! [`ElectionConfig::validate`] checks the full structural invariants used by
//! `updateconfige`. The individual setters apply their own, tighter bounds.

use crate::error::CustodianError;
use dac_types::time::SECONDS_PER_DAY;
use dac_types::{ExtendedAsset, Tenant};
use serde::{Deserialize, Serialize};

pub const MAX_NUMELECTED: u8 = 21;
pub const MAX_NUMELECTED_GOV: u8 = 12;
pub const MAX_PERIOD_LENGTH: u32 = 3 * 365 * SECONDS_PER_DAY as u32;
pub const MIN_SETTER_PERIOD_LENGTH: u32 = SECONDS_PER_DAY as u32;
pub const MAX_SETTER_PERIOD_LENGTH: u32 = 30 * SECONDS_PER_DAY as u32;
pub const MIN_LOCK_DELAY: u32 = 86_400;
pub const MAX_LOCK_DELAY: u32 = 31_536_000;
pub const MIN_TOKEN_SUPPLY_THRESHOLD: u64 = 10_000_000;

fn default_maxvotes() -> u8 {
    5
}

fn default_numelected() -> u8 {
    5
}

fn default_periodlength() -> u32 {
    7 * SECONDS_PER_DAY as u32
}

fn default_pending_period_delay() -> u32 {
    300
}

fn default_initial_vote_quorum_percent() -> u32 {
    15
}

fn default_vote_quorum_percent() -> u32 {
    4
}

fn default_auth_threshold_high() -> u8 {
    4
}

fn default_auth_threshold_mid() -> u8 {
    3
}

fn default_auth_threshold_low() -> u8 {
    2
}

fn default_lockup_release_time_delay() -> u32 {
    MIN_LOCK_DELAY
}

fn default_token_supply_threshold() -> u64 {
    100_000_000
}

/// Per-tenant election parameters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectionConfig {
    /// Stake a candidate must lock. A zero amount disables the stake check.
    pub lockupasset: ExtendedAsset,
    #[serde(default = "default_maxvotes")]
    pub maxvotes: u8,
    #[serde(default = "default_numelected")]
    pub numelected: u8,
    /// Seconds between elections.
    #[serde(default = "default_periodlength")]
    pub periodlength: u32,
    /// Seconds between selecting and seating a new custodian set.
    #[serde(default = "default_pending_period_delay")]
    pub pending_period_delay: u32,
    #[serde(default)]
    pub should_pay_via_service_provider: bool,
    #[serde(default = "default_initial_vote_quorum_percent")]
    pub initial_vote_quorum_percent: u32,
    #[serde(default = "default_vote_quorum_percent")]
    pub vote_quorum_percent: u32,
    #[serde(default = "default_auth_threshold_high")]
    pub auth_threshold_high: u8,
    #[serde(default = "default_auth_threshold_mid")]
    pub auth_threshold_mid: u8,
    #[serde(default = "default_auth_threshold_low")]
    pub auth_threshold_low: u8,
    #[serde(default = "default_lockup_release_time_delay")]
    pub lockup_release_time_delay: u32,
    /// Cap on requested pay; also fixes the pay currency.
    pub requested_pay_max: ExtendedAsset,
    /// Raw supply units the token must exceed before elections run.
    #[serde(default = "default_token_supply_threshold")]
    pub token_supply_threshold: u64,
}

impl ElectionConfig {
    /// Default parameters around the two tenant-specific assets.
    pub fn new(lockupasset: ExtendedAsset, requested_pay_max: ExtendedAsset) -> Self {
        Self {
            lockupasset,
            maxvotes: default_maxvotes(),
            numelected: default_numelected(),
            periodlength: default_periodlength(),
            pending_period_delay: default_pending_period_delay(),
            should_pay_via_service_provider: false,
            initial_vote_quorum_percent: default_initial_vote_quorum_percent(),
            vote_quorum_percent: default_vote_quorum_percent(),
            auth_threshold_high: default_auth_threshold_high(),
            auth_threshold_mid: default_auth_threshold_mid(),
            auth_threshold_low: default_auth_threshold_low(),
            lockup_release_time_delay: default_lockup_release_time_delay(),
            requested_pay_max,
            token_supply_threshold: default_token_supply_threshold(),
        }
    }

    /// Structural invariants for a full replacement.
    pub fn validate(&self, tenant: &Tenant) -> Result<(), CustodianError> {
        let invalid = |msg: String| Err(CustodianError::InvalidConfig(msg));
        if self.numelected > MAX_NUMELECTED {
            return invalid(format!("numelected {} > {MAX_NUMELECTED}", self.numelected));
        }
        if self.maxvotes == 0 || self.maxvotes > self.numelected {
            return invalid(format!(
                "maxvotes {} must be in 1..={}",
                self.maxvotes, self.numelected
            ));
        }
        if self.periodlength > MAX_PERIOD_LENGTH {
            return invalid(format!("periodlength {} exceeds 3 years", self.periodlength));
        }
        if self.pending_period_delay > self.periodlength {
            return invalid(format!(
                "pending_period_delay {} > periodlength {}",
                self.pending_period_delay, self.periodlength
            ));
        }
        check_percent("initial_vote_quorum_percent", self.initial_vote_quorum_percent)?;
        check_percent("vote_quorum_percent", self.vote_quorum_percent)?;
        check_supply_threshold(self.token_supply_threshold)?;
        if self.auth_threshold_high >= self.numelected {
            return invalid(format!(
                "auth_threshold_high {} must be below numelected {}",
                self.auth_threshold_high, self.numelected
            ));
        }
        if self.auth_threshold_mid > self.auth_threshold_high {
            return invalid("auth_threshold_mid > auth_threshold_high".into());
        }
        if self.auth_threshold_low > self.auth_threshold_mid {
            return invalid("auth_threshold_low > auth_threshold_mid".into());
        }
        if self.auth_threshold_low == 0 {
            return invalid("auth_threshold_low must be at least 1".into());
        }
        if self.lockupasset.extended_symbol() != tenant.symbol {
            return invalid(format!(
                "lockup asset {} is not the tenant token {}",
                self.lockupasset, tenant.symbol
            ));
        }
        if self.requested_pay_max.quantity.amount < 0 {
            return invalid("requested_pay_max must not be negative".into());
        }
        if self.should_pay_via_service_provider
            && tenant.account_for_type(dac_types::AccountType::Service).is_none()
        {
            return invalid("paying via service provider needs a SERVICE account".into());
        }
        Ok(())
    }

    /// `setdaogov`: one threshold for all three tiers.
    pub fn set_dao_gov(&mut self, maxvotes: u8, numelected: u8, threshold: u8) -> Result<(), CustodianError> {
        if numelected > MAX_NUMELECTED_GOV {
            return Err(CustodianError::InvalidConfig(format!(
                "numelected {numelected} > {MAX_NUMELECTED_GOV}"
            )));
        }
        if maxvotes == 0 || maxvotes >= numelected / 2 {
            return Err(CustodianError::InvalidConfig(format!(
                "maxvotes {maxvotes} must be positive and below half of numelected {numelected}"
            )));
        }
        if threshold == 0 || threshold >= numelected {
            return Err(CustodianError::InvalidConfig(format!(
                "threshold {threshold} must be in 1..{numelected}"
            )));
        }
        self.maxvotes = maxvotes;
        self.numelected = numelected;
        self.auth_threshold_high = threshold;
        self.auth_threshold_mid = threshold;
        self.auth_threshold_low = threshold;
        Ok(())
    }

    pub fn set_period_length(&mut self, periodlength: u32) -> Result<(), CustodianError> {
        if !(MIN_SETTER_PERIOD_LENGTH..=MAX_SETTER_PERIOD_LENGTH).contains(&periodlength) {
            return Err(CustodianError::InvalidConfig(format!(
                "periodlength {periodlength} must be between 1 and 30 days"
            )));
        }
        if periodlength < self.pending_period_delay {
            return Err(CustodianError::InvalidConfig(format!(
                "periodlength {periodlength} < pending_period_delay {}",
                self.pending_period_delay
            )));
        }
        self.periodlength = periodlength;
        Ok(())
    }

    pub fn set_pending_delay(&mut self, delay: u32) -> Result<(), CustodianError> {
        if delay > self.periodlength {
            return Err(CustodianError::InvalidConfig(format!(
                "pending_period_delay {delay} > periodlength {}",
                self.periodlength
            )));
        }
        self.pending_period_delay = delay;
        Ok(())
    }

    pub fn set_initial_vote_quorum(&mut self, percent: u32) -> Result<(), CustodianError> {
        check_percent("initial_vote_quorum_percent", percent)?;
        self.initial_vote_quorum_percent = percent;
        Ok(())
    }

    pub fn set_vote_quorum(&mut self, percent: u32) -> Result<(), CustodianError> {
        check_percent("vote_quorum_percent", percent)?;
        self.vote_quorum_percent = percent;
        Ok(())
    }

    pub fn set_lock_delay(&mut self, delay: u32) -> Result<(), CustodianError> {
        if !(MIN_LOCK_DELAY..=MAX_LOCK_DELAY).contains(&delay) {
            return Err(CustodianError::InvalidConfig(format!(
                "lockup_release_time_delay {delay} outside {MIN_LOCK_DELAY}..={MAX_LOCK_DELAY}"
            )));
        }
        self.lockup_release_time_delay = delay;
        Ok(())
    }

    pub fn set_token_supply_threshold(&mut self, threshold: u64) -> Result<(), CustodianError> {
        check_supply_threshold(threshold)?;
        self.token_supply_threshold = threshold;
        Ok(())
    }

    pub fn set_lock_asset(&mut self, asset: ExtendedAsset, tenant: &Tenant) -> Result<(), CustodianError> {
        if asset.extended_symbol() != tenant.symbol {
            return Err(CustodianError::InvalidConfig(format!(
                "lockup asset {asset} is not the tenant token {}",
                tenant.symbol
            )));
        }
        if asset.quantity.amount < 0 {
            return Err(CustodianError::InvalidConfig("lockup must not be negative".into()));
        }
        self.lockupasset = asset;
        Ok(())
    }

    pub fn set_pay_via(&mut self, via_service: bool, tenant: &Tenant) -> Result<(), CustodianError> {
        if via_service && tenant.account_for_type(dac_types::AccountType::Service).is_none() {
            return Err(CustodianError::InvalidConfig(
                "paying via service provider needs a SERVICE account".into(),
            ));
        }
        self.should_pay_via_service_provider = via_service;
        Ok(())
    }

    pub fn set_pay_max(&mut self, max: ExtendedAsset) -> Result<(), CustodianError> {
        if max.quantity.amount < 0 {
            return Err(CustodianError::InvalidConfig("pay cap must not be negative".into()));
        }
        self.requested_pay_max = max;
        Ok(())
    }
}

fn check_percent(field: &str, percent: u32) -> Result<(), CustodianError> {
    if percent >= 100 {
        return Err(CustodianError::InvalidConfig(format!("{field} {percent} must be below 100")));
    }
    Ok(())
}

fn check_supply_threshold(threshold: u64) -> Result<(), CustodianError> {
    if threshold <= MIN_TOKEN_SUPPLY_THRESHOLD {
        return Err(CustodianError::InvalidConfig(format!(
            "token_supply_threshold {threshold} must exceed {MIN_TOKEN_SUPPLY_THRESHOLD}"
        )));
    }
    Ok(())
}
