//! Token ledger lookups.

use crate::LookupError;
use dac_types::{AccountName, Asset, DacId, Symbol};

/// Read access to the fungible token ledger.
///
/// Transfers are not part of this trait: they are emitted as outbound
/// messages and settled by the ledger after the action commits.
pub trait TokenLedger {
    /// Liquid balance of `account` in `symbol` issued by `contract`.
    fn balance_of(
        &self,
        account: &AccountName,
        contract: &AccountName,
        symbol: &Symbol,
    ) -> Result<Asset, LookupError>;

    /// Amount of `symbol` that `account` has staked.
    fn staked_amount(
        &self,
        account: &AccountName,
        contract: &AccountName,
        symbol: &Symbol,
    ) -> Result<Asset, LookupError>;

    /// Stake lock duration in seconds chosen by `account` for a tenant.
    fn stake_lock_duration(&self, account: &AccountName, dac_id: &DacId) -> Result<u64, LookupError>;

    /// Current supply of `symbol` issued by `contract`.
    fn total_supply(&self, contract: &AccountName, symbol: &Symbol) -> Result<Asset, LookupError>;

    /// Whether `account` is a registered member who agreed to the latest terms.
    fn is_member(&self, account: &AccountName, contract: &AccountName) -> bool;
}
