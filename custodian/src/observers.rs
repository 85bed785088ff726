//! Inbound notifications from the token ledger.

use crate::error::CustodianError;
use crate::state::CustodianState;
use dac_messages::{AccountBalanceDelta, AccountStakeDelta, AccountWeightDelta, ActionContext};
use tracing::debug;

pub struct InboundObserver;

impl InboundObserver {
    fn require_token_contract(&self, ctx: &ActionContext<'_>) -> Result<(), CustodianError> {
        let token_contract = ctx.tenant.symbol.contract;
        if !ctx.auth.has_auth_or_contract(&token_contract) {
            return Err(CustodianError::NotAuthorized(token_contract.to_string()));
        }
        Ok(())
    }

    /// `weightobsv`
    pub fn weight_observe(
        &self,
        state: &mut CustodianState,
        ctx: &ActionContext<'_>,
        deltas: &[AccountWeightDelta],
    ) -> Result<(), CustodianError> {
        self.require_token_contract(ctx)?;
        let mut ledger = state.ledger();
        for delta in deltas {
            ledger.observe_weight_delta(delta.account, delta.weight_delta, delta.weight_delta_quorum);
        }
        debug!(dac = %ctx.dac_id(), count = deltas.len(), "weight deltas applied");
        Ok(())
    }

    /// `balanceobsv`: balance changes in the tenant token move weight one to one.
    pub fn balance_observe(
        &self,
        state: &mut CustodianState,
        ctx: &ActionContext<'_>,
        deltas: &[AccountBalanceDelta],
    ) -> Result<(), CustodianError> {
        self.require_token_contract(ctx)?;
        let symbol = ctx.tenant.symbol.symbol;
        let mut ledger = state.ledger();
        for delta in deltas.iter().filter(|d| d.balance_delta.symbol == symbol) {
            let amount = delta.balance_delta.amount;
            ledger.observe_weight_delta(delta.account, amount, amount);
        }
        debug!(dac = %ctx.dac_id(), count = deltas.len(), "balance deltas applied");
        Ok(())
    }

    /// `stakeobsv`: reject an unstake that would take an active candidate
    /// below the lockup. The ledger reports the stake before the change.
    pub fn stake_observe(
        &self,
        state: &CustodianState,
        ctx: &ActionContext<'_>,
        deltas: &[AccountStakeDelta],
    ) -> Result<(), CustodianError> {
        self.require_token_contract(ctx)?;
        let lockup = state.config().lockupasset;
        if lockup.quantity.amount <= 0 {
            return Ok(());
        }
        for delta in deltas.iter().filter(|d| d.stake_delta.amount < 0) {
            let active = state
                .candidates
                .get(&delta.account)
                .is_some_and(|c| c.is_active);
            if !active {
                continue;
            }
            let staked = ctx.collaborators.tokens.staked_amount(
                &delta.account,
                &lockup.contract,
                &lockup.quantity.symbol,
            )?;
            let remaining = staked.checked_add(delta.stake_delta)?;
            if remaining.amount < lockup.quantity.amount {
                return Err(CustodianError::StakeBelowLockup {
                    account: delta.account,
                    staked: remaining.to_string(),
                    required: lockup.quantity.to_string(),
                });
            }
        }
        Ok(())
    }
}
