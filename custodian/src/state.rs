//! All custodian-election tables of one tenant.

use crate::candidate::{Candidate, CandidatePermission, CandidateProfile, Custodian, WhitelistEntry};
use crate::config::ElectionConfig;
use crate::globals::DacGlobals;
use crate::ledger::VoteWeightLedger;
use crate::pay::PendingPay;
use crate::vote::{Proxy, Vote, VoteWeight};
use dac_store::Table;
use dac_types::AccountName;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CustodianState {
    pub globals: DacGlobals,
    #[serde(default)]
    pub candidates: Table<Candidate>,
    #[serde(default)]
    pub custodians: Table<Custodian>,
    #[serde(default)]
    pub pending_custodians: Table<Custodian>,
    #[serde(default)]
    pub votes: Table<Vote>,
    #[serde(default)]
    pub proxies: Table<Proxy>,
    #[serde(default)]
    pub weights: Table<VoteWeight>,
    #[serde(default)]
    pub pending_pay: Table<PendingPay>,
    #[serde(default)]
    pub candidate_permissions: Table<CandidatePermission>,
    #[serde(default)]
    pub whitelist: Table<WhitelistEntry>,
    #[serde(default)]
    pub profiles: Table<CandidateProfile>,
    /// Next `pending_pay` key; never reused.
    #[serde(default)]
    pub next_pay_key: u64,
}

impl CustodianState {
    pub fn new(config: ElectionConfig) -> Self {
        Self {
            globals: DacGlobals::new(config),
            candidates: Table::new(),
            custodians: Table::new(),
            pending_custodians: Table::new(),
            votes: Table::new(),
            proxies: Table::new(),
            weights: Table::new(),
            pending_pay: Table::new(),
            candidate_permissions: Table::new(),
            whitelist: Table::new(),
            profiles: Table::new(),
            next_pay_key: 0,
        }
    }

    pub fn config(&self) -> &ElectionConfig {
        &self.globals.config
    }

    /// Borrow the tables the weight ledger works on.
    pub fn ledger(&mut self) -> VoteWeightLedger<'_> {
        VoteWeightLedger {
            candidates: &mut self.candidates,
            proxies: &mut self.proxies,
            votes: &self.votes,
            weights: &mut self.weights,
            globals: &mut self.globals,
        }
    }

    pub fn active_candidate_count(&self) -> usize {
        self.candidates.iter().filter(|c| c.is_active).count()
    }
}

/// Read access to the serving custodian set.
pub trait CustodianRoster {
    fn is_custodian(&self, account: &AccountName) -> bool;

    /// Serving custodians in name order.
    fn custodian_names(&self) -> Vec<AccountName>;
}

impl CustodianRoster for CustodianState {
    fn is_custodian(&self, account: &AccountName) -> bool {
        self.custodians.contains(account)
    }

    fn custodian_names(&self) -> Vec<AccountName> {
        self.custodians.keys().copied().collect()
    }
}
