//! Mean custodian pay and the pending-pay ledger.

use crate::auth::{require_auth, require_contract};
use crate::election::ElectionEngine;
use crate::error::CustodianError;
use crate::state::CustodianState;
use dac_messages::ActionContext;
use dac_store::{combine_ids, IndexDef, Record};
use dac_types::{AccountName, AccountType, Asset, ExtendedAsset};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Pay owed to a custodian, accumulated across periods per token.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingPay {
    pub key: u64,
    pub receiver: AccountName,
    pub quantity: ExtendedAsset,
}

impl Record for PendingPay {
    type Key = u64;

    fn primary_key(&self) -> u64 {
        self.key
    }

    fn indexes() -> &'static [IndexDef<Self>] {
        PENDING_PAY_INDEXES
    }
}

const PENDING_PAY_INDEXES: &[IndexDef<PendingPay>] = &[
    IndexDef {
        name: "byreceiver",
        key: |p| p.receiver.raw() as u128,
    },
    IndexDef {
        name: "receiversym",
        key: |p| combine_ids(p.receiver.raw(), p.quantity.quantity.symbol.raw()),
    },
];

impl CustodianState {
    /// Add `quantity` to the receiver's pending pay in that token.
    pub fn credit_pay(&mut self, receiver: AccountName, quantity: ExtendedAsset) -> Result<(), CustodianError> {
        let key = combine_ids(receiver.raw(), quantity.quantity.symbol.raw());
        let existing = self
            .pending_pay
            .index_range("receiversym", key..=key)?
            .find(|p| p.quantity.contract == quantity.contract)
            .map(|p| p.key);
        match existing {
            Some(pay_key) => {
                let current = self
                    .pending_pay
                    .get(&pay_key)
                    .map(|p| p.quantity.quantity)
                    .ok_or(CustodianError::PayNotFound(pay_key))?;
                let total = current.checked_add(quantity.quantity)?;
                self.pending_pay.modify(&pay_key, |p| p.quantity.quantity = total)?;
                Ok(())
            }
            None => {
                let key = self.next_pay_key;
                self.pending_pay.insert(PendingPay {
                    key,
                    receiver,
                    quantity,
                })?;
                self.next_pay_key += 1;
                Ok(())
            }
        }
    }
}

impl ElectionEngine {
    /// Pay the outgoing custodians the mean of their requested pay.
    ///
    /// Only requests in the cap currency and within the cap are counted and
    /// paid; the rest still serve but neither move the mean nor get paid.
    pub fn distribute_mean_pay(
        &self,
        state: &mut CustodianState,
        ctx: &ActionContext<'_>,
    ) -> Result<Option<Asset>, CustodianError> {
        let cap = state.config().requested_pay_max;
        let eligible: Vec<(AccountName, i64)> = state
            .custodians
            .iter()
            .filter(|c| {
                c.requestedpay.symbol == cap.quantity.symbol
                    && c.requestedpay.amount <= cap.quantity.amount
            })
            .map(|c| (c.cust_name, c.requestedpay.amount))
            .collect();
        if eligible.is_empty() {
            return Ok(None);
        }
        let total: i128 = eligible.iter().map(|(_, amount)| *amount as i128).sum();
        let mean = Asset::new((total / eligible.len() as i128) as i64, cap.quantity.symbol);
        if mean.is_positive() {
            let quantity = ExtendedAsset::new(mean, cap.contract);
            for (receiver, _) in &eligible {
                state.credit_pay(*receiver, quantity)?;
            }
        }
        info!(dac = %ctx.dac_id(), mean = %mean, paid = eligible.len(), "custodian pay distributed");
        Ok(Some(mean))
    }

    /// `claimpay`: move pending pay out of the treasury.
    pub fn claim_pay(
        &self,
        state: &mut CustodianState,
        ctx: &mut ActionContext<'_>,
        payid: u64,
    ) -> Result<(), CustodianError> {
        let pay = state
            .pending_pay
            .get(&payid)
            .cloned()
            .ok_or(CustodianError::PayNotFound(payid))?;
        require_auth(ctx, &pay.receiver)?;
        let treasury = ctx
            .account_for_type(AccountType::Treasury)
            .ok_or(CustodianError::MissingAccount(AccountType::Treasury))?;
        if state.config().should_pay_via_service_provider {
            let service = ctx
                .account_for_type(AccountType::Service)
                .ok_or(CustodianError::MissingAccount(AccountType::Service))?;
            ctx.transfer(
                treasury,
                service,
                pay.quantity,
                format!("{}:Period custodian pay", pay.receiver),
            );
        } else {
            ctx.transfer(treasury, pay.receiver, pay.quantity, "Period custodian pay");
        }
        state.pending_pay.remove(&payid);
        info!(dac = %ctx.dac_id(), receiver = %pay.receiver, quantity = %pay.quantity, "custodian pay claimed");
        Ok(())
    }

    /// `rejectcuspay`: the receiver forfeits the pay.
    pub fn reject_pay(
        &self,
        state: &mut CustodianState,
        ctx: &ActionContext<'_>,
        payid: u64,
    ) -> Result<(), CustodianError> {
        let receiver = state
            .pending_pay
            .get(&payid)
            .map(|p| p.receiver)
            .ok_or(CustodianError::PayNotFound(payid))?;
        require_auth(ctx, &receiver)?;
        state.pending_pay.remove(&payid);
        Ok(())
    }

    /// `removecuspay`
    pub fn remove_pay(
        &self,
        state: &mut CustodianState,
        ctx: &ActionContext<'_>,
        payid: u64,
    ) -> Result<(), CustodianError> {
        require_contract(ctx)?;
        state
            .pending_pay
            .remove(&payid)
            .ok_or(CustodianError::PayNotFound(payid))?;
        Ok(())
    }
}
