//! Arbiter and receiver whitelists.

use crate::auth::require_contract;
use crate::engine::ProposalEngine;
use crate::error::ProposalError;
use crate::proposal::Whitelisted;
use crate::state::ProposalState;
use dac_messages::ActionContext;
use dac_store::Table;
use dac_types::AccountName;
use tracing::info;

/// Which list an operation touches.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WhitelistKind {
    Arbiter,
    Receiver,
}

impl ProposalState {
    fn whitelist_mut(&mut self, kind: WhitelistKind) -> &mut Table<Whitelisted> {
        match kind {
            WhitelistKind::Arbiter => &mut self.arbiter_whitelist,
            WhitelistKind::Receiver => &mut self.receiver_whitelist,
        }
    }

    /// Whether `arbiter` is named on a proposal that is not finished.
    pub fn arbitrates_live_proposal(&self, arbiter: &AccountName) -> Result<bool, ProposalError> {
        let raw = arbiter.raw() as u128;
        Ok(self
            .proposals
            .index_range("arbiter", raw..=raw)?
            .any(|p| p.state.is_live()))
    }
}

impl ProposalEngine {
    /// `addarbwl` / `addrecwl`
    pub fn add_whitelist(
        &self,
        state: &mut ProposalState,
        ctx: &ActionContext<'_>,
        kind: WhitelistKind,
        account: AccountName,
        rating: u64,
    ) -> Result<(), ProposalError> {
        require_contract(ctx)?;
        let list = state.whitelist_mut(kind);
        if list.contains(&account) {
            return Err(ProposalError::WhitelistDuplicate(account));
        }
        list.insert(Whitelisted { account, rating })?;
        info!(dac = %ctx.dac_id(), ?kind, %account, rating, "whitelisted");
        Ok(())
    }

    /// `updarbwl` / `updrecwl`
    pub fn update_whitelist(
        &self,
        state: &mut ProposalState,
        ctx: &ActionContext<'_>,
        kind: WhitelistKind,
        account: AccountName,
        rating: u64,
    ) -> Result<(), ProposalError> {
        require_contract(ctx)?;
        state
            .whitelist_mut(kind)
            .modify(&account, |w| w.rating = rating)
            .map_err(|_| ProposalError::WhitelistNotFound(account))?;
        Ok(())
    }

    /// `rmvarbwl` / `rmvrecwl`
    pub fn remove_whitelist(
        &self,
        state: &mut ProposalState,
        ctx: &ActionContext<'_>,
        kind: WhitelistKind,
        account: AccountName,
    ) -> Result<(), ProposalError> {
        require_contract(ctx)?;
        state
            .whitelist_mut(kind)
            .remove(&account)
            .ok_or(ProposalError::WhitelistNotFound(account))?;
        info!(dac = %ctx.dac_id(), ?kind, %account, "removed from whitelist");
        Ok(())
    }

    /// `safermvarbwl`: drop an arbiter unless they still arbitrate a live
    /// proposal. Removing an account that is not listed is a no-op.
    pub fn safe_remove_arbiter(
        &self,
        state: &mut ProposalState,
        ctx: &ActionContext<'_>,
        arbiter: AccountName,
    ) -> Result<(), ProposalError> {
        require_contract(ctx)?;
        if state.arbitrates_live_proposal(&arbiter)? {
            return Err(ProposalError::ArbiterBusy(arbiter));
        }
        if state.arbiter_whitelist.remove(&arbiter).is_some() {
            info!(dac = %ctx.dac_id(), %arbiter, "arbiter removed from whitelist");
        }
        Ok(())
    }
}
