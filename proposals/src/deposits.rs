//! Proposer deposits held by the proposals account.

use crate::auth::{require_auth, tenant_account};
use crate::engine::ProposalEngine;
use crate::error::ProposalError;
use crate::proposal::Deposit;
use crate::state::ProposalState;
use dac_messages::ActionContext;
use dac_types::{AccountName, AccountType, ExtendedAsset};
use tracing::info;

impl ProposalState {
    /// Take `fee` out of `account`'s deposit. An emptied deposit is removed.
    pub fn charge_deposit(&mut self, account: AccountName, fee: ExtendedAsset) -> Result<(), ProposalError> {
        let deposit = self
            .deposits
            .get(&account)
            .map(|d| d.deposit)
            .ok_or(ProposalError::DepositNotFound(account))?;
        let insufficient = || ProposalError::InsufficientDeposit {
            account,
            have: deposit.to_string(),
            need: fee.to_string(),
        };
        if deposit.extended_symbol() != fee.extended_symbol() {
            return Err(insufficient());
        }
        let remaining = deposit.quantity.checked_sub(fee.quantity)?;
        if remaining.amount < 0 {
            return Err(insufficient());
        }
        if remaining.is_zero() {
            self.deposits.remove(&account);
        } else {
            self.deposits.modify(&account, |d| d.deposit.quantity = remaining)?;
        }
        Ok(())
    }
}

impl ProposalEngine {
    /// A transfer into the proposals account credits the sender's deposit.
    pub fn receive_deposit(
        &self,
        state: &mut ProposalState,
        ctx: &ActionContext<'_>,
        from: AccountName,
        quantity: ExtendedAsset,
    ) -> Result<(), ProposalError> {
        require_auth(ctx, &from)?;
        if !quantity.quantity.is_positive() {
            return Err(ProposalError::InvalidPay(format!("deposit {quantity} must be positive")));
        }
        match state.deposits.get(&from).map(|d| d.deposit) {
            Some(existing) => {
                if existing.extended_symbol() != quantity.extended_symbol() {
                    return Err(ProposalError::InvalidPay(format!(
                        "deposit {quantity} does not match the held {existing}"
                    )));
                }
                let total = existing.quantity.checked_add(quantity.quantity)?;
                state.deposits.modify(&from, |d| d.deposit.quantity = total)?;
            }
            None => state.deposits.insert(Deposit {
                account: from,
                deposit: quantity,
            })?,
        }
        info!(dac = %ctx.dac_id(), account = %from, %quantity, "deposit received");
        Ok(())
    }

    /// `refund`: return an account's whole deposit.
    pub fn refund_deposit(
        &self,
        state: &mut ProposalState,
        ctx: &mut ActionContext<'_>,
        account: AccountName,
    ) -> Result<(), ProposalError> {
        require_auth(ctx, &account)?;
        let holder = tenant_account(ctx, AccountType::Proposals)?;
        let deposit = state
            .deposits
            .remove(&account)
            .ok_or(ProposalError::DepositNotFound(account))?;
        ctx.transfer(holder, account, deposit.deposit, "proposal deposit refund");
        info!(dac = %ctx.dac_id(), %account, quantity = %deposit.deposit, "deposit refunded");
        Ok(())
    }
}
