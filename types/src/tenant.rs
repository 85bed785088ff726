//! Tenant (DAC) directory entries.

use crate::asset::ExtendedSymbol;
use crate::name::{AccountName, DacId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Named account roles a tenant can register in the directory.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountType {
    Treasury,
    Custodian,
    Msig,
    Service,
    Proposals,
    Escrow,
    VoteWeight,
    Activation,
    Referendum,
    Spendings,
    External,
    Other,
    Auth,
    PropFunds,
    MsigOwned,
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Everything the engine needs to know about one tenant.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tenant {
    pub dac_id: DacId,
    pub owner: AccountName,
    #[serde(default)]
    pub title: String,
    /// The governance token (membership, weight, lockup).
    pub symbol: ExtendedSymbol,
    #[serde(default)]
    pub accounts: BTreeMap<AccountType, AccountName>,
}

impl Tenant {
    pub fn account_for_type(&self, account_type: AccountType) -> Option<AccountName> {
        self.accounts.get(&account_type).copied()
    }

    pub fn with_account(mut self, account_type: AccountType, account: AccountName) -> Self {
        self.accounts.insert(account_type, account);
        self
    }
}
