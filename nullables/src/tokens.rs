//! Nullable token ledger.
//!
//! Balances, stakes and supplies are plain maps the test fills in. Registered
//! as a [`MessageHandler`] for [`MessageKind::Transfer`](dac_messages::MessageKind)
//! it also settles committed transfers, so a test can check where funds went.

use dac_messages::{DispatchError, MessageHandler, OutboundAction};
use dac_store::{LookupError, TokenLedger};
use dac_types::{AccountName, Asset, DacId, ExtendedAsset, Symbol};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

type Holding = (AccountName, AccountName, Symbol);

#[derive(Debug, Default)]
pub struct NullTokenLedger {
    balances: Mutex<BTreeMap<Holding, i64>>,
    stakes: Mutex<BTreeMap<Holding, i64>>,
    lock_durations: Mutex<BTreeMap<(AccountName, DacId), u64>>,
    supplies: Mutex<BTreeMap<(AccountName, Symbol), i64>>,
    members: Mutex<BTreeSet<(AccountName, AccountName)>>,
}

impl NullTokenLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_balance(&self, account: AccountName, quantity: ExtendedAsset) {
        self.balances.lock().unwrap().insert(
            (account, quantity.contract, quantity.quantity.symbol),
            quantity.quantity.amount,
        );
    }

    pub fn set_stake(&self, account: AccountName, quantity: ExtendedAsset) {
        self.stakes.lock().unwrap().insert(
            (account, quantity.contract, quantity.quantity.symbol),
            quantity.quantity.amount,
        );
    }

    pub fn set_lock_duration(&self, account: AccountName, dac_id: DacId, secs: u64) {
        self.lock_durations.lock().unwrap().insert((account, dac_id), secs);
    }

    pub fn set_supply(&self, supply: ExtendedAsset) {
        self.supplies
            .lock()
            .unwrap()
            .insert((supply.contract, supply.quantity.symbol), supply.quantity.amount);
    }

    /// Register `account` as a member of the community of `contract`.
    pub fn add_member(&self, account: AccountName, contract: AccountName) {
        self.members.lock().unwrap().insert((account, contract));
    }

    /// Current balance, zero when never set.
    pub fn balance(&self, account: AccountName, contract: AccountName, symbol: Symbol) -> Asset {
        let amount = self
            .balances
            .lock()
            .unwrap()
            .get(&(account, contract, symbol))
            .copied()
            .unwrap_or_default();
        Asset::new(amount, symbol)
    }
}

impl TokenLedger for NullTokenLedger {
    fn balance_of(
        &self,
        account: &AccountName,
        contract: &AccountName,
        symbol: &Symbol,
    ) -> Result<Asset, LookupError> {
        Ok(self.balance(*account, *contract, *symbol))
    }

    fn staked_amount(
        &self,
        account: &AccountName,
        contract: &AccountName,
        symbol: &Symbol,
    ) -> Result<Asset, LookupError> {
        let amount = self
            .stakes
            .lock()
            .unwrap()
            .get(&(*account, *contract, *symbol))
            .copied()
            .unwrap_or_default();
        Ok(Asset::new(amount, *symbol))
    }

    fn stake_lock_duration(&self, account: &AccountName, dac_id: &DacId) -> Result<u64, LookupError> {
        Ok(self
            .lock_durations
            .lock()
            .unwrap()
            .get(&(*account, *dac_id))
            .copied()
            .unwrap_or_default())
    }

    fn total_supply(&self, contract: &AccountName, symbol: &Symbol) -> Result<Asset, LookupError> {
        self.supplies
            .lock()
            .unwrap()
            .get(&(*contract, *symbol))
            .map(|amount| Asset::new(*amount, *symbol))
            .ok_or_else(|| LookupError::StatsNotFound(format!("{symbol}@{contract}")))
    }

    fn is_member(&self, account: &AccountName, contract: &AccountName) -> bool {
        self.members.lock().unwrap().contains(&(*account, *contract))
    }
}

impl MessageHandler for NullTokenLedger {
    fn handle(&self, _dac_id: &DacId, action: &OutboundAction) -> Result<(), DispatchError> {
        let OutboundAction::Transfer { from, to, quantity, .. } = action else {
            return Ok(());
        };
        let symbol = quantity.quantity.symbol;
        let amount = quantity.quantity.amount;
        let mut balances = self.balances.lock().unwrap();
        let source = balances.entry((*from, quantity.contract, symbol)).or_default();
        if *source < amount {
            return Err(DispatchError::Rejected {
                kind: "transfer".into(),
                reason: format!("{from} cannot cover {quantity}"),
            });
        }
        *source -= amount;
        *balances.entry((*to, quantity.contract, symbol)).or_default() += amount;
        Ok(())
    }
}
