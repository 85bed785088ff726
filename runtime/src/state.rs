//! The complete persisted state of one tenant.

use crate::RuntimeError;
use dac_custodian::{CustodianState, ElectionConfig};
use dac_escrow::EscrowState;
use dac_proposals::{ProposalConfig, ProposalState};
use serde::{Deserialize, Serialize};

/// Every table of one tenant, stored as a single blob.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TenantState {
    pub custodian: CustodianState,
    pub escrow: EscrowState,
    pub proposals: ProposalState,
}

impl TenantState {
    pub fn new(election: ElectionConfig, proposals: ProposalConfig) -> Self {
        Self {
            custodian: CustodianState::new(election),
            escrow: EscrowState::new(),
            proposals: ProposalState::new(proposals),
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>, RuntimeError> {
        Ok(bincode::serialize(self)?)
    }

    /// Decode a stored blob; table indexes are rebuilt from the rows.
    pub fn decode(bytes: &[u8]) -> Result<Self, RuntimeError> {
        Ok(bincode::deserialize(bytes)?)
    }
}
