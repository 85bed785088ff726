//! Proposal workflow parameters.

use crate::error::ProposalError;
use dac_types::time::SECONDS_PER_DAY;
use dac_types::ExtendedAsset;
use serde::{Deserialize, Serialize};

fn default_proposal_threshold() -> u8 {
    4
}

fn default_finalize_threshold() -> u8 {
    1
}

fn default_approval_duration() -> u32 {
    30 * SECONDS_PER_DAY as u32
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalConfig {
    /// Charged from the proposer's deposit on `createprop`.
    #[serde(default)]
    pub proposal_fee: Option<ExtendedAsset>,
    /// Custodian approvals needed to start work.
    #[serde(default = "default_proposal_threshold")]
    pub proposal_threshold: u8,
    /// Custodian approvals needed to release payment.
    #[serde(default = "default_finalize_threshold")]
    pub finalize_threshold: u8,
    /// Seconds a new proposal stays open for approval votes.
    #[serde(default = "default_approval_duration")]
    pub approval_duration: u32,
    /// Seconds between creation and the earliest finalize.
    #[serde(default)]
    pub min_proposal_duration: u32,
}

impl Default for ProposalConfig {
    fn default() -> Self {
        Self {
            proposal_fee: None,
            proposal_threshold: default_proposal_threshold(),
            finalize_threshold: default_finalize_threshold(),
            approval_duration: default_approval_duration(),
            min_proposal_duration: 0,
        }
    }
}

impl ProposalConfig {
    pub fn validate(&self) -> Result<(), ProposalError> {
        if self.proposal_threshold == 0 {
            return Err(ProposalError::InvalidConfig("proposal_threshold must be at least 1".into()));
        }
        if self.finalize_threshold == 0 {
            return Err(ProposalError::InvalidConfig("finalize_threshold must be at least 1".into()));
        }
        if self.approval_duration == 0 {
            return Err(ProposalError::InvalidConfig("approval_duration must be positive".into()));
        }
        if let Some(fee) = &self.proposal_fee {
            if fee.quantity.amount < 0 {
                return Err(ProposalError::InvalidConfig(format!("negative proposal fee {fee}")));
            }
        }
        Ok(())
    }

    /// The fee, if one is configured and non-zero.
    pub fn fee(&self) -> Option<ExtendedAsset> {
        self.proposal_fee.filter(|fee| fee.quantity.is_positive())
    }
}
